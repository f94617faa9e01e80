//! Post-pass suppression rules
//!
//! Rules run after every row has been folded into the per-device analyses.
//! They run in [`SUPPRESSION_RULES`] order, and a later rule may overwrite
//! the reason left by an earlier one. No rule ever re-enables sending.

use serde::{Deserialize, Serialize};

use crate::analysis::{CommandAnalysis, Decision};

/// Reason recorded when any interval command is already queued
pub const REASON_INTERVAL_PRESENT: &str = "Interval command found in system";

/// A check that can move a device from send to suppress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuppressionRule {
    /// Device already has some interval command queued, whatever its parameters
    IntervalPresent,
    /// Device has too many outstanding commands; overrides earlier reasons
    VolumeCap,
}

/// Evaluation order of the suppression rules
pub const SUPPRESSION_RULES: [SuppressionRule; 2] =
    [SuppressionRule::IntervalPresent, SuppressionRule::VolumeCap];

/// What a rule sees of one device
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// The device's analysis so far
    pub analysis: &'a CommandAnalysis,
    /// Any of the device's queued commands is an interval command
    pub has_interval_command: bool,
    /// Outstanding-command count at which the volume cap fires
    pub volume_cap: usize,
}

impl SuppressionRule {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::IntervalPresent => "interval present",
            Self::VolumeCap => "volume cap",
        }
    }

    /// Returns the reason to record if this rule fires
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<String> {
        match self {
            Self::IntervalPresent => (input.has_interval_command
                && input.analysis.decision == Decision::SendCommand)
                .then(|| REASON_INTERVAL_PRESENT.to_string()),
            Self::VolumeCap => (input.analysis.command_count >= input.volume_cap).then(|| {
                format!("Too many pending commands ({})", input.analysis.command_count)
            }),
        }
    }

    /// Evaluate and, if the rule fires, suppress the analysis
    ///
    /// Returns true if the rule fired.
    pub fn apply(
        &self,
        analysis: &mut CommandAnalysis,
        has_interval_command: bool,
        volume_cap: usize,
    ) -> bool {
        let input = RuleInput {
            analysis,
            has_interval_command,
            volume_cap,
        };
        match self.evaluate(&input) {
            Some(reason) => {
                analysis.suppress(reason);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::REASON_EXACT_DUPLICATE;

    fn analysis_with_count(count: usize) -> CommandAnalysis {
        CommandAnalysis {
            has_pending_commands: count > 0,
            command_count: count,
            ..CommandAnalysis::new()
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            SUPPRESSION_RULES,
            [SuppressionRule::IntervalPresent, SuppressionRule::VolumeCap]
        );
    }

    #[test]
    fn test_interval_present_fires_only_while_sending() {
        let mut analysis = analysis_with_count(1);
        assert!(SuppressionRule::IntervalPresent.apply(&mut analysis, true, 4));
        assert_eq!(analysis.reason, REASON_INTERVAL_PRESENT);

        let mut analysis = analysis_with_count(1);
        analysis.suppress(REASON_EXACT_DUPLICATE);
        assert!(!SuppressionRule::IntervalPresent.apply(&mut analysis, true, 4));
        assert_eq!(analysis.reason, REASON_EXACT_DUPLICATE);
    }

    #[test]
    fn test_interval_present_needs_interval_command() {
        let mut analysis = analysis_with_count(2);
        assert!(!SuppressionRule::IntervalPresent.apply(&mut analysis, false, 4));
        assert_eq!(analysis.decision, Decision::SendCommand);
    }

    #[test]
    fn test_volume_cap_boundary() {
        let mut analysis = analysis_with_count(3);
        assert!(!SuppressionRule::VolumeCap.apply(&mut analysis, false, 4));
        assert_eq!(analysis.decision, Decision::SendCommand);

        let mut analysis = analysis_with_count(4);
        assert!(SuppressionRule::VolumeCap.apply(&mut analysis, false, 4));
        assert_eq!(analysis.decision, Decision::DoNotSend);
        assert_eq!(analysis.reason, "Too many pending commands (4)");
    }

    #[test]
    fn test_volume_cap_overwrites_reason() {
        let mut analysis = analysis_with_count(5);
        analysis.suppress(REASON_EXACT_DUPLICATE);
        assert!(SuppressionRule::VolumeCap.apply(&mut analysis, false, 4));
        assert_eq!(analysis.reason, "Too many pending commands (5)");
    }
}
