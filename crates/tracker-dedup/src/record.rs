//! Pending command records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;
use tracker_protocol::{DecodeStrategy, DeviceId, FrameDecoder};

/// Row state code for a command waiting for the device to connect
pub const STATE_PENDING: i64 = 0;
/// Row state code for a command delivered but not yet acknowledged
pub const STATE_SENT: i64 = 1;
/// Row state code for a canceled command
pub const STATE_CANCELED: i64 = 5;

/// One row as returned by the command-status API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommandRow {
    /// Device identifier, not yet normalised
    pub imei: String,
    /// Queued command: hex frame or plain text
    #[serde(default)]
    pub msg: String,
    /// State code (0 pending, 1 sent, 5 canceled, ...)
    pub state: i64,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created_date: i64,
}

/// State of an outstanding command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandState {
    /// Waiting for the device to connect
    Pending,
    /// Delivered, waiting for acknowledgement
    Sent,
}

impl CommandState {
    /// Map a row state code; anything but pending/sent is not outstanding
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            STATE_PENDING => Some(Self::Pending),
            STATE_SENT => Some(Self::Sent),
            _ => None,
        }
    }

    /// Get the row state code
    pub fn code(&self) -> i64 {
        match self {
            Self::Pending => STATE_PENDING,
            Self::Sent => STATE_SENT,
        }
    }

    /// Short label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Sent",
        }
    }

    /// Prefix used in the formatted command history
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Pending => "[PENDING]",
            Self::Sent => "[SENT]",
        }
    }

    /// Longer description for audit output
    pub fn description(&self) -> &'static str {
        match self {
            Self::Pending => "Pending - waiting for device connection",
            Self::Sent => "Sent - awaiting device acknowledgement",
        }
    }
}

/// A validated, decoded outstanding command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommandRecord {
    /// Normalised device identifier
    pub device_id: DeviceId,
    /// Frame exactly as the API returned it
    pub original_frame: String,
    /// Command text recovered from the frame
    pub decoded_command: String,
    /// Strategy that recovered the text, `None` if passed through
    pub strategy: Option<DecodeStrategy>,
    /// Outstanding state
    pub state: CommandState,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl PendingCommandRecord {
    /// Build a record from an API row
    ///
    /// Returns `None` when the device id does not normalise or the row is not
    /// outstanding (canceled, completed, ...).
    pub fn from_row(row: &RawCommandRow, decoder: &FrameDecoder) -> Option<Self> {
        let device_id = match DeviceId::normalize(&row.imei) {
            Ok(id) => id,
            Err(e) => {
                trace!("Skipping command row: {}", e);
                return None;
            }
        };

        let Some(state) = CommandState::from_code(row.state) else {
            trace!("Skipping command row for {} in state {}", device_id, row.state);
            return None;
        };

        let (decoded, strategy) = decoder.decode_with_strategy(&row.msg);
        let decoded_command = if decoded.is_empty() {
            row.msg.clone()
        } else {
            decoded
        };

        Some(Self {
            device_id,
            original_frame: row.msg.clone(),
            decoded_command,
            strategy,
            state,
            created_at: DateTime::from_timestamp(row.created_date, 0).unwrap_or_default(),
        })
    }

    /// Audit view of this record
    pub fn info(&self) -> PendingCommandInfo {
        PendingCommandInfo {
            original: self.original_frame.clone(),
            extracted: self.decoded_command.clone(),
            state: self.state,
            created_at: self.created_at,
            state_description: self.state.description().to_string(),
        }
    }
}

/// Audit entry: original frame next to the extracted command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommandInfo {
    /// Frame as returned by the API
    pub original: String,
    /// Decoded command text
    pub extracted: String,
    /// Outstanding state
    pub state: CommandState,
    /// Creation time (ISO-8601 when serialised)
    pub created_at: DateTime<Utc>,
    /// Human-readable state
    pub state_description: String,
}
