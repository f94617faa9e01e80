//! Pass reports
//!
//! A [`PassReport`] is written twice: pretty JSON for tooling and a plain
//! text summary followed by an audit of every outstanding frame.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracker_dedup::{AnalysisResult, CommandAnalysis, PendingCommandInfo};
use tracker_protocol::DeviceId;

use crate::error::FleetError;
use crate::sender::SendSummary;

/// Everything one account pass decided and did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Account name
    pub account: String,
    /// When the pass finished analyzing
    pub generated_at: DateTime<Utc>,
    /// Devices the API listed
    pub devices_total: usize,
    /// Devices off the expected interval
    pub drifted: usize,
    /// Command that restores the expected interval
    pub candidate_command: String,
    /// Whether sending was skipped
    pub dry_run: bool,
    /// Per-device decision, reason and command history
    pub analyses: BTreeMap<DeviceId, CommandAnalysis>,
    /// Outstanding frames as received, with their decoded form
    pub pending_commands_info: BTreeMap<DeviceId, Vec<PendingCommandInfo>>,
    /// Devices the candidate command goes to
    pub eligible: Vec<DeviceId>,
    /// Absent when nothing was sent
    pub send: Option<SendSummary>,
}

impl PassReport {
    /// Report for an account with no drifted devices
    pub fn empty(
        account: &str,
        candidate_command: &str,
        devices_total: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            account: account.to_string(),
            generated_at: Utc::now(),
            devices_total,
            drifted: 0,
            candidate_command: candidate_command.to_string(),
            dry_run,
            analyses: BTreeMap::new(),
            pending_commands_info: BTreeMap::new(),
            eligible: Vec::new(),
            send: None,
        }
    }

    /// Build the report from an analysis
    pub fn from_analysis(
        account: &str,
        candidate_command: &str,
        devices_total: usize,
        dry_run: bool,
        result: AnalysisResult,
    ) -> Self {
        let eligible = result.eligible_devices();
        Self {
            drifted: result.analyses.len(),
            analyses: result.analyses,
            pending_commands_info: result.pending_commands_info,
            eligible,
            ..Self::empty(account, candidate_command, devices_total, dry_run)
        }
    }

    /// Devices left alone
    pub fn suppressed(&self) -> usize {
        self.drifted.saturating_sub(self.eligible.len())
    }

    /// Plain-text rendering
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "# Tracker interval correction: {}", self.account);
        let _ = writeln!(out, "# Generated: {}", self.generated_at.to_rfc3339());
        let _ = writeln!(out, "# Command: {}", self.candidate_command);
        let _ = writeln!(
            out,
            "# Devices: {} listed, {} drifted, {} eligible, {} suppressed",
            self.devices_total,
            self.drifted,
            self.eligible.len(),
            self.suppressed()
        );
        match (&self.send, self.dry_run) {
            (_, true) => {
                let _ = writeln!(out, "# Send: dry run, nothing sent");
            }
            (Some(send), false) => {
                let _ = writeln!(
                    out,
                    "# Send: {} sent, {} failed, {} batch(es)",
                    send.sent, send.failed, send.batches
                );
            }
            (None, false) => {
                let _ = writeln!(out, "# Send: nothing to send");
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "## Decisions");
        for (device, analysis) in &self.analyses {
            let _ = writeln!(
                out,
                "{} {:<12} {:>3}  {}",
                device,
                analysis.decision.name(),
                analysis.command_count,
                analysis.reason
            );
        }

        if !self.pending_commands_info.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "## Outstanding commands");
            for (device, infos) in &self.pending_commands_info {
                for info in infos {
                    let _ = writeln!(
                        out,
                        "{} {} {} {}",
                        device,
                        info.created_at.format("%Y-%m-%d %H:%M:%S"),
                        info.state.marker(),
                        info.extracted
                    );
                    if info.original != info.extracted {
                        let _ = writeln!(out, "    frame: {}", info.original);
                    }
                }
            }
        }

        out
    }

    fn file_stem(&self) -> String {
        let account: String = self
            .account
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}-{}", account, self.generated_at.timestamp())
    }
}

/// Write the JSON and text renderings into `dir`, returning the JSON path
pub fn write_report(report: &PassReport, dir: &Path) -> Result<PathBuf, FleetError> {
    std::fs::create_dir_all(dir)?;

    let stem = report.file_stem();
    let json_path = dir.join(format!("{}.json", stem));
    std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
    std::fs::write(dir.join(format!("{}.txt", stem)), report.render_text())?;

    info!("Wrote report {}", json_path.display());
    Ok(json_path)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tracker_dedup::{PendingCommandAnalyzer, RawCommandRow};

    use super::*;

    const CANDIDATE: &str = "AT+TIMEGAP=0,600,1,600";

    fn id(raw: &str) -> DeviceId {
        DeviceId::normalize(raw).unwrap()
    }

    fn sample() -> PassReport {
        let ids = BTreeSet::from([id("860000000000001"), id("860000000000002")]);
        let rows = vec![RawCommandRow {
            imei: "860000000000001".into(),
            msg: CANDIDATE.into(),
            state: 0,
            created_date: 1_700_000_000,
        }];
        let result = PendingCommandAnalyzer::new().analyze(&ids, &rows, Some(CANDIDATE));
        PassReport::from_analysis("north/east", CANDIDATE, 5, false, result)
    }

    #[test]
    fn test_from_analysis() {
        let report = sample();
        assert_eq!(report.drifted, 2);
        assert_eq!(report.eligible, vec![id("860000000000002")]);
        assert_eq!(report.suppressed(), 1);
    }

    #[test]
    fn test_render_text() {
        let text = sample().render_text();
        assert!(text.contains("# Devices: 5 listed, 2 drifted, 1 eligible, 1 suppressed"));
        assert!(text.contains("# Send: nothing to send"));
        assert!(text.contains("860000000000001 Do not send"));
        assert!(text.contains("Exact duplicate command found"));
        assert!(text.contains(
            "860000000000001 2023-11-14 22:13:20 [PENDING] AT+TIMEGAP=0,600,1,600"
        ));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample();
        let path = write_report(&report, dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("north_east-"));
        assert!(path.with_extension("txt").exists());

        let back: PassReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
