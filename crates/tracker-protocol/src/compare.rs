//! Pending-versus-candidate command comparison

use crate::classify::{intervals_equivalent, is_interval_command};

/// Outcome of comparing an existing pending command with a candidate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// Byte-identical strings
    ExactMatch,
    /// Both set the reporting interval to the same parameters
    EquivalentInterval,
    /// Both set the reporting interval, to different parameters
    DifferentInterval,
    /// Unrelated commands
    DifferentCommand,
}

impl Verdict {
    /// Returns a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Verdict::ExactMatch => "exact match",
            Verdict::EquivalentInterval => "equivalent interval",
            Verdict::DifferentInterval => "different interval",
            Verdict::DifferentCommand => "different command",
        }
    }

    /// Returns true if the candidate would duplicate the existing command
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Verdict::ExactMatch | Verdict::EquivalentInterval)
    }
}

/// Compare an existing command against a candidate
///
/// Checks run in priority order and the first hit wins.
pub fn compare(existing: &str, candidate: &str) -> Verdict {
    if existing == candidate {
        return Verdict::ExactMatch;
    }

    if is_interval_command(existing) && is_interval_command(candidate) {
        if intervals_equivalent(existing, candidate) {
            Verdict::EquivalentInterval
        } else {
            Verdict::DifferentInterval
        }
    } else {
        Verdict::DifferentCommand
    }
}
