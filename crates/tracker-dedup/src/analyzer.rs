//! Pending command analyzer
//!
//! Folds the command-status rows of one account into per-device analyses
//! and the duplicate sets the sender uses to pick eligible devices.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracker_protocol::{compare, is_interval_command, DeviceId, FrameDecoder, Verdict};

use crate::analysis::{
    CommandAnalysis, Decision, REASON_EQUIVALENT_INTERVAL, REASON_EXACT_DUPLICATE,
};
use crate::record::{PendingCommandInfo, PendingCommandRecord, RawCommandRow};
use crate::rules::SUPPRESSION_RULES;

/// Outstanding-command count at which a device is left alone
pub const DEFAULT_VOLUME_CAP: usize = 4;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Suppress devices with at least this many outstanding commands
    pub volume_cap: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            volume_cap: DEFAULT_VOLUME_CAP,
        }
    }
}

/// Everything one analysis run produced
///
/// The duplicate sets and counts are filled independently of the per-device
/// decisions; [`AnalysisResult::is_eligible`] reads only the former.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Devices with a queued command identical to the candidate
    pub exact_duplicates: BTreeSet<DeviceId>,
    /// Devices with a queued interval command equivalent to the candidate
    pub equivalent_interval_duplicates: BTreeSet<DeviceId>,
    /// Devices with any queued interval command
    pub interval_command_devices: BTreeSet<DeviceId>,
    /// Outstanding-command count, for devices that have any
    pub pending_counts: BTreeMap<DeviceId, usize>,
    /// Audit detail per device, in row order
    pub pending_commands_info: BTreeMap<DeviceId, Vec<PendingCommandInfo>>,
    /// Final analysis per requested device
    pub analyses: BTreeMap<DeviceId, CommandAnalysis>,
    /// Volume cap the run used
    pub volume_cap: usize,
}

impl AnalysisResult {
    /// Whether the candidate command may be sent to `device`
    pub fn is_eligible(&self, device: &DeviceId) -> bool {
        !self.exact_duplicates.contains(device)
            && !self.equivalent_interval_duplicates.contains(device)
            && !self.interval_command_devices.contains(device)
            && self
                .pending_counts
                .get(device)
                .is_none_or(|&count| count < self.volume_cap)
    }

    /// Requested devices eligible for the candidate command, in id order
    pub fn eligible_devices(&self) -> Vec<DeviceId> {
        self.analyses
            .keys()
            .filter(|id| self.is_eligible(id))
            .cloned()
            .collect()
    }

    /// Final decision for a device
    pub fn decision(&self, device: &DeviceId) -> Option<Decision> {
        self.analyses.get(device).map(|a| a.decision)
    }

    /// Get a device's analysis
    pub fn analysis(&self, device: &DeviceId) -> Option<&CommandAnalysis> {
        self.analyses.get(device)
    }

    /// Number of devices whose candidate command is suppressed
    pub fn suppressed_count(&self) -> usize {
        self.analyses.values().filter(|a| a.is_suppressed()).count()
    }
}

/// Builds [`AnalysisResult`]s from command-status rows
#[derive(Debug, Clone, Default)]
pub struct PendingCommandAnalyzer {
    config: AnalyzerConfig,
    decoder: FrameDecoder,
}

impl PendingCommandAnalyzer {
    /// Create an analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create with custom configuration
    ///
    /// A volume cap of 0 is raised to 1.
    pub fn with_config(mut config: AnalyzerConfig) -> Self {
        config.volume_cap = config.volume_cap.max(1);
        Self {
            config,
            decoder: FrameDecoder::new(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the outstanding commands of `device_ids`
    ///
    /// Rows for other devices, rows whose id does not normalise, and rows
    /// that are not pending or sent are ignored. `rows` should be most recent
    /// first; that order is kept in the per-device history.
    pub fn analyze(
        &self,
        device_ids: &BTreeSet<DeviceId>,
        rows: &[RawCommandRow],
        candidate: Option<&str>,
    ) -> AnalysisResult {
        let mut result = AnalysisResult {
            analyses: device_ids
                .iter()
                .map(|id| (id.clone(), CommandAnalysis::new()))
                .collect(),
            volume_cap: self.config.volume_cap,
            ..Default::default()
        };

        let mut considered = 0usize;
        for row in rows {
            let Some(record) = PendingCommandRecord::from_row(row, &self.decoder) else {
                continue;
            };
            let Some(analysis) = result.analyses.get_mut(&record.device_id) else {
                continue;
            };
            considered += 1;

            analysis.push(&record);
            *result
                .pending_counts
                .entry(record.device_id.clone())
                .or_default() += 1;
            result
                .pending_commands_info
                .entry(record.device_id.clone())
                .or_default()
                .push(record.info());

            if is_interval_command(&record.decoded_command) {
                result
                    .interval_command_devices
                    .insert(record.device_id.clone());
            }

            let Some(candidate) = candidate else {
                continue;
            };
            match compare(&record.decoded_command, candidate) {
                Verdict::ExactMatch => {
                    debug!("{}: exact duplicate queued", record.device_id);
                    result.exact_duplicates.insert(record.device_id.clone());
                    analysis.suppress(REASON_EXACT_DUPLICATE);
                }
                Verdict::EquivalentInterval => {
                    debug!("{}: equivalent interval queued", record.device_id);
                    result
                        .equivalent_interval_duplicates
                        .insert(record.device_id.clone());
                    analysis.suppress(REASON_EQUIVALENT_INTERVAL);
                }
                Verdict::DifferentInterval | Verdict::DifferentCommand => {}
            }
        }

        for (id, analysis) in result.analyses.iter_mut() {
            let has_interval_command = result.interval_command_devices.contains(id);
            for rule in SUPPRESSION_RULES {
                if rule.apply(analysis, has_interval_command, self.config.volume_cap) {
                    debug!("{}: {} rule fired ({})", id, rule.name(), analysis.reason);
                }
            }
        }

        info!(
            "Analyzed {} outstanding command(s) for {} device(s): {} exact, {} equivalent, {} with interval, {} suppressed",
            considered,
            result.analyses.len(),
            result.exact_duplicates.len(),
            result.equivalent_interval_duplicates.len(),
            result.interval_command_devices.len(),
            result.suppressed_count(),
        );

        result
    }
}
