//! Pending Command Deduplication
//!
//! This crate decides, per device, whether a corrective configuration command
//! should be sent or suppressed because an equivalent command is already
//! queued for that device.
//!
//! # Architecture
//!
//! Raw rows from the command-status API flow through three stages:
//!
//! - **Records**: each row is validated (device id, state) and its frame is
//!   decoded into a [`PendingCommandRecord`]
//! - **Per-row comparison**: every record is compared with the candidate
//!   command; exact and equivalent-interval matches suppress the device
//! - **Suppression rules**: once all rows are in, the ordered
//!   [`SUPPRESSION_RULES`] table runs against each device's aggregate
//!
//! Suppression is monotonic within a run: a device never goes back from
//! [`Decision::DoNotSend`] to [`Decision::SendCommand`].
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use tracker_dedup::{Decision, PendingCommandAnalyzer, RawCommandRow};
//! use tracker_protocol::DeviceId;
//!
//! let device = DeviceId::normalize("860000000000001").unwrap();
//! let ids = BTreeSet::from([device.clone()]);
//! let rows = vec![RawCommandRow {
//!     imei: "860000000000001".into(),
//!     msg: "AT+TIMEGAP=0,600,1,600".into(),
//!     state: 0,
//!     created_date: 1_700_000_000,
//! }];
//!
//! let analyzer = PendingCommandAnalyzer::new();
//! let result = analyzer.analyze(&ids, &rows, Some("AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0"));
//!
//! assert_eq!(result.decision(&device), Some(Decision::DoNotSend));
//! assert!(!result.is_eligible(&device));
//! ```

pub mod analysis;
pub mod analyzer;
pub mod record;
pub mod rules;

pub use analysis::{CommandAnalysis, CommandEntry, Decision};
pub use analyzer::{AnalysisResult, AnalyzerConfig, PendingCommandAnalyzer, DEFAULT_VOLUME_CAP};
pub use record::{CommandState, PendingCommandInfo, PendingCommandRecord, RawCommandRow};
pub use rules::{SuppressionRule, SUPPRESSION_RULES};
