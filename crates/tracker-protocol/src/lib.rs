//! Tracker Command Protocol Library
//!
//! This crate turns the command-queue entries reported by the fleet API into
//! comparable command strings, and decides whether two commands are the same
//! configuration directive:
//!
//! - **Frame decoding**: hex-wrapped protocol frames (`7E ... 7E`) are unwrapped
//!   into the ASCII command they carry; plain-text entries pass through
//! - **Classification**: recognises the reporting-interval directive
//!   (`AT+TIMEGAP`) and extracts its parameters
//! - **Comparison**: a four-way [`Verdict`] between a pending command and a
//!   candidate command
//! - **Identifiers**: normalisation of device identifiers (IMEIs)
//!
//! # Architecture
//!
//! Decoding is best-effort. The [`FrameDecoder`] runs an ordered list of
//! [`DecodeStrategy`] values and takes the first non-empty result; when every
//! strategy fails the original frame is returned unchanged. Nothing in this
//! crate returns an error to the caller for malformed device data.
//!
//! # Example
//!
//! ```rust
//! use tracker_protocol::{compare, decode_frame, Verdict};
//!
//! let payload: String = "AT+TIMEGAP=0,600,1,600"
//!     .bytes()
//!     .map(|b| format!("{:02X}", b))
//!     .collect();
//! let frame = format!("7E{}{}007E", "0".repeat(36), payload);
//!
//! let decoded = decode_frame(&frame);
//! assert_eq!(decoded, "AT+TIMEGAP=0,600,1,600");
//!
//! let verdict = compare(&decoded, "AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0");
//! assert_eq!(verdict, Verdict::EquivalentInterval);
//! ```

pub mod classify;
pub mod compare;
pub mod error;
pub mod frame;
pub mod identifier;

pub use classify::{
    interval_params, intervals_equivalent, is_interval_command, INTERVAL_DIRECTIVE,
};
pub use compare::{compare, Verdict};
pub use error::{DecodeError, IdentifierError};
pub use frame::{decode_frame, DecodeStrategy, FrameDecoder, DECODE_STRATEGIES};
pub use identifier::{DeviceId, MIN_DEVICE_ID_DIGITS};
