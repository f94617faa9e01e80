//! Account passes
//!
//! One pass lists an account's devices, finds the ones that drifted off the
//! expected interval, analyzes what is already queued for them and sends the
//! corrective command to the rest.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracker_dedup::PendingCommandAnalyzer;

use crate::client::FleetApi;
use crate::config::{AccountProfile, FleetConfig};
use crate::drift::drifted_devices;
use crate::error::FleetError;
use crate::report::PassReport;
use crate::sender::CommandSender;

/// A single account's correction pass
pub struct AccountPass<'a> {
    profile: &'a AccountProfile,
    analyzer: PendingCommandAnalyzer,
    sender: CommandSender,
    dry_run: bool,
}

impl<'a> AccountPass<'a> {
    /// Prepare a pass with the account's analyzer and batch settings
    pub fn new(profile: &'a AccountProfile, dry_run: bool) -> Self {
        Self {
            profile,
            analyzer: PendingCommandAnalyzer::with_config(profile.analyzer_config()),
            sender: CommandSender::from_profile(profile),
            dry_run,
        }
    }

    /// Run the pass against `api`
    pub async fn run<A: FleetApi + ?Sized>(&self, api: &A) -> Result<PassReport, FleetError> {
        let profile = self.profile;
        let devices = api.list_devices().await?;
        let drifted = drifted_devices(&devices, profile.expected_interval_secs);

        if drifted.is_empty() {
            info!("{}: all {} device(s) on profile", profile.name, devices.len());
            return Ok(PassReport::empty(
                &profile.name,
                &profile.candidate_command,
                devices.len(),
                self.dry_run,
            ));
        }

        let ids: Vec<_> = drifted.iter().cloned().collect();
        let rows = api.pending_commands(&ids).await?;
        let result = self
            .analyzer
            .analyze(&drifted, &rows, Some(profile.candidate_command.as_str()));

        let mut report = PassReport::from_analysis(
            &profile.name,
            &profile.candidate_command,
            devices.len(),
            self.dry_run,
            result,
        );

        if report.eligible.is_empty() {
            info!(
                "{}: every drifted device already has a command queued",
                profile.name
            );
        } else if self.dry_run {
            info!(
                "{}: dry run, would send to {} device(s)",
                profile.name,
                report.eligible.len()
            );
        } else {
            let summary = self
                .sender
                .send(api, &report.eligible, &profile.candidate_command)
                .await;
            report.send = Some(summary);
        }

        Ok(report)
    }
}

/// Result of one account within a multi-account run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOutcome {
    /// Account name
    pub account: String,
    /// Report of a completed pass
    pub report: Option<PassReport>,
    /// Error that ended the pass early
    pub error: Option<String>,
}

impl AccountOutcome {
    /// Whether the pass ran to completion
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every configured account in order, pausing between accounts
///
/// `connect` builds the API handle for an account. A failing account is
/// logged and recorded; the remaining accounts still run.
pub async fn run_accounts<A, F>(
    config: &FleetConfig,
    dry_run: bool,
    mut connect: F,
) -> Vec<AccountOutcome>
where
    A: FleetApi,
    F: FnMut(&AccountProfile) -> Result<A, FleetError>,
{
    let pause = Duration::from_secs(config.inter_account_pause_secs);
    let mut outcomes = Vec::with_capacity(config.accounts.len());

    for (index, profile) in config.accounts.iter().enumerate() {
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        info!("Starting pass for account {}", profile.name);
        let result = match connect(profile) {
            Ok(api) => AccountPass::new(profile, dry_run).run(&api).await,
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(report) => {
                if report.send.as_ref().is_some_and(|s| !s.is_complete()) {
                    warn!("{}: some batches failed", profile.name);
                }
                AccountOutcome {
                    account: profile.name.clone(),
                    report: Some(report),
                    error: None,
                }
            }
            Err(e) => {
                error!("Pass for account {} failed: {}", profile.name, e);
                AccountOutcome {
                    account: profile.name.clone(),
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}
