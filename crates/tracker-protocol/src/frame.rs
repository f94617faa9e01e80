//! Command-queue frame decoding
//!
//! The fleet API reports each queued command either as the plain command text
//! or as the raw protocol frame that will be delivered to the tracker, written
//! as hex text.
//!
//! # Frame Format
//! ```text
//! 7E [header: 36 hex chars] [payload: hex-encoded ASCII] [checksum: 2 hex chars] 7E
//! ```
//!
//! - `7E`: Envelope marker at both ends
//! - `header`: Message id, properties, terminal id and serial number (skipped)
//! - `payload`: The command text, one byte per hex pair
//! - `checksum`: Single byte, dropped together with the trailing marker
//!
//! Some firmware builds put a shorter sub-header in front of the payload that
//! starts with `F0302`. When the fixed-header layout yields nothing, the
//! decoder retries from that marker. Frames too short for the fixed header
//! are never decoded.

use tracing::{debug, trace};

use crate::error::DecodeError;

/// Envelope marker, as hex text
pub const ENVELOPE_MARKER: &str = "7E";
/// Fixed-header frames must be strictly longer than this
pub const MIN_ENVELOPE_LEN: usize = 42;
/// Marker plus fixed header, in hex chars
pub const HEADER_LEN: usize = 38;
/// Checksum plus trailing marker, in hex chars
pub const TRAILER_LEN: usize = 4;
/// Start of the short sub-header
pub const SUBHEADER_MARKER: &str = "F0302";
/// Length of the short sub-header, marker included
pub const SUBHEADER_LEN: usize = 6;

/// A way of recovering the command text from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeStrategy {
    /// Fixed 38-char header, 4-char trailer; NUL bytes become spaces
    Envelope,
    /// Payload follows the `F0302` sub-header; NUL bytes are dropped
    SubHeaderMarker,
}

/// Strategies in the order the decoder tries them
pub const DECODE_STRATEGIES: [DecodeStrategy; 2] =
    [DecodeStrategy::Envelope, DecodeStrategy::SubHeaderMarker];

impl DecodeStrategy {
    /// Returns a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            DecodeStrategy::Envelope => "envelope",
            DecodeStrategy::SubHeaderMarker => "sub-header",
        }
    }

    /// Try to extract the command text from `frame`
    pub fn apply(&self, frame: &str) -> Result<String, DecodeError> {
        if !is_enveloped(frame) {
            return Err(DecodeError::NotEnveloped);
        }

        if frame.len() <= MIN_ENVELOPE_LEN {
            return Err(DecodeError::TooShort {
                len: frame.len(),
                min: MIN_ENVELOPE_LEN,
            });
        }

        match self {
            DecodeStrategy::Envelope => {
                let payload = slice(frame, HEADER_LEN, frame.len() - TRAILER_LEN)?;
                non_empty(printable_ascii(payload, true))
            }
            DecodeStrategy::SubHeaderMarker => {
                let pos = frame
                    .find(SUBHEADER_MARKER)
                    .ok_or(DecodeError::MarkerNotFound(SUBHEADER_MARKER))?;
                let end = frame.len().saturating_sub(TRAILER_LEN);
                let payload = slice(frame, pos + SUBHEADER_LEN, end)?;
                non_empty(printable_ascii(payload, false))
            }
        }
    }
}

/// Whether the frame starts and ends with the envelope marker
pub fn is_enveloped(frame: &str) -> bool {
    frame.starts_with(ENVELOPE_MARKER) && frame.ends_with(ENVELOPE_MARKER)
}

fn slice(frame: &str, start: usize, end: usize) -> Result<&str, DecodeError> {
    if start > end {
        return Err(DecodeError::InvalidRange { start, end });
    }
    frame
        .get(start..end)
        .ok_or(DecodeError::InvalidRange { start, end })
}

fn non_empty(text: String) -> Result<String, DecodeError> {
    if text.is_empty() {
        Err(DecodeError::EmptyPayload)
    } else {
        Ok(text)
    }
}

/// Decode hex pairs, keeping printable ASCII only
///
/// Pairs that are not valid hex contribute nothing, same as non-printable
/// bytes. The result is trimmed.
fn printable_ascii(hex: &str, nul_as_space: bool) -> String {
    let text: String = hex
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            let byte = u8::from_str_radix(pair, 16).ok()?;
            match byte {
                0 if nul_as_space => Some(' '),
                32..=126 => Some(byte as char),
                _ => None,
            }
        })
        .collect();

    text.trim().to_string()
}

/// Best-effort decoder for command-queue entries
///
/// Never fails: when no strategy yields text, the input comes back unchanged.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    strategies: Vec<DecodeStrategy>,
}

impl FrameDecoder {
    /// Create a decoder with the default strategy order
    pub fn new() -> Self {
        Self {
            strategies: DECODE_STRATEGIES.to_vec(),
        }
    }

    /// Create a decoder with a custom strategy order
    pub fn with_strategies(strategies: Vec<DecodeStrategy>) -> Self {
        Self { strategies }
    }

    /// Strategies in the order they are tried
    pub fn strategies(&self) -> &[DecodeStrategy] {
        &self.strategies
    }

    /// Decode a frame into its command text
    pub fn decode(&self, frame: &str) -> String {
        self.decode_with_strategy(frame).0
    }

    /// Decode a frame, also reporting which strategy succeeded
    ///
    /// Returns `None` as the strategy when the frame was passed through.
    pub fn decode_with_strategy(&self, frame: &str) -> (String, Option<DecodeStrategy>) {
        if frame.is_empty() {
            return (String::new(), None);
        }

        for strategy in &self.strategies {
            match strategy.apply(frame) {
                Ok(text) => {
                    debug!(
                        "Decoded {}-char frame via {}: {}",
                        frame.len(),
                        strategy.name(),
                        text
                    );
                    return (text, Some(*strategy));
                }
                Err(e @ (DecodeError::NotEnveloped | DecodeError::TooShort { .. })) => {
                    trace!("Passing frame through: {}", e);
                    break;
                }
                Err(e) => trace!("{} strategy gave nothing: {}", strategy.name(), e),
            }
        }

        (frame.to_string(), None)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a frame with the default strategy order
pub fn decode_frame(frame: &str) -> String {
    FrameDecoder::new().decode(frame)
}
