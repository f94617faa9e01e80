//! Per-device command analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{CommandState, PendingCommandRecord};

/// Reason until a duplicate or a suppression rule replaces it
pub const REASON_NO_PENDING: &str = "No pending commands found";
/// A queued command is byte-identical to the candidate
pub const REASON_EXACT_DUPLICATE: &str = "Exact duplicate command found";
/// A queued command sets the same interval parameters as the candidate
pub const REASON_EQUIVALENT_INTERVAL: &str = "Equivalent interval command found";

/// History text while a device has no outstanding commands
const NO_HISTORY: &str = "None";

/// Whether the candidate command goes out to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Decision {
    /// Send the candidate command
    #[default]
    SendCommand,
    /// Suppress the candidate command
    DoNotSend,
}

impl Decision {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendCommand => "Send",
            Self::DoNotSend => "Do not send",
        }
    }
}

/// One outstanding command, as listed in a device analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// Decoded command text
    pub command: String,
    /// Outstanding state
    pub state: CommandState,
    /// Creation time (ISO-8601 when serialised)
    pub created_at: DateTime<Utc>,
}

/// Analysis of one device's outstanding commands
///
/// Built up row by row, then finalised by the suppression rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAnalysis {
    /// At least one outstanding command was seen
    pub has_pending_commands: bool,
    /// Number of outstanding commands seen
    pub command_count: usize,
    /// Outstanding commands, most recent first
    pub commands: Vec<CommandEntry>,
    /// Send or suppress
    pub decision: Decision,
    /// Why the decision was taken
    pub reason: String,
    /// One `<marker> <command>` line per outstanding command
    pub existing_commands_formatted: String,
}

impl CommandAnalysis {
    /// Analysis for a device with nothing outstanding
    pub fn new() -> Self {
        Self {
            has_pending_commands: false,
            command_count: 0,
            commands: Vec::new(),
            decision: Decision::SendCommand,
            reason: REASON_NO_PENDING.to_string(),
            existing_commands_formatted: NO_HISTORY.to_string(),
        }
    }

    /// Add an outstanding command
    pub fn push(&mut self, record: &PendingCommandRecord) {
        let line = format!("{} {}", record.state.marker(), record.decoded_command);
        if self.has_pending_commands {
            self.existing_commands_formatted.push('\n');
            self.existing_commands_formatted.push_str(&line);
        } else {
            self.existing_commands_formatted = line;
        }

        self.commands.push(CommandEntry {
            command: record.decoded_command.clone(),
            state: record.state,
            created_at: record.created_at,
        });
        self.command_count += 1;
        self.has_pending_commands = true;
    }

    /// Suppress the candidate command for this device
    ///
    /// The reason is always replaced; the decision can only move to
    /// [`Decision::DoNotSend`].
    pub fn suppress(&mut self, reason: impl Into<String>) {
        self.decision = Decision::DoNotSend;
        self.reason = reason.into();
    }

    /// Whether the candidate command is suppressed
    pub fn is_suppressed(&self) -> bool {
        self.decision == Decision::DoNotSend
    }
}

impl Default for CommandAnalysis {
    fn default() -> Self {
        Self::new()
    }
}
