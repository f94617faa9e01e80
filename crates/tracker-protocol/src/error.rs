//! Error types for frame decoding and identifier normalisation

use thiserror::Error;

/// Reasons a decoding strategy produced no command
///
/// These never reach callers of [`crate::FrameDecoder::decode`]; they are
/// logged and the decoder moves on to the next strategy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame is not delimited by the envelope marker on both ends
    #[error("frame is not enveloped")]
    NotEnveloped,

    /// Frame is too short for the strategy's fixed header and trailer
    #[error("frame too short: {len} chars, need more than {min}")]
    TooShort { len: usize, min: usize },

    /// Sub-header marker not present in the frame
    #[error("marker {0} not found")]
    MarkerNotFound(&'static str),

    /// Slice boundaries fall outside the frame or inside a multi-byte character
    #[error("invalid payload range {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    /// Payload decoded to nothing printable
    #[error("payload contains no printable characters")]
    EmptyPayload,
}

/// Errors produced while normalising a device identifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Fewer digits than a device identifier requires
    #[error("identifier {raw:?} has {digits} digits, need at least {min}")]
    TooShort {
        raw: String,
        digits: usize,
        min: usize,
    },
}
