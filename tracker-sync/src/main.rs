//! Tracker Interval Sync
//!
//! Periodically checks every configured fleet account for trackers whose
//! reporting interval drifted and queues the corrective command for them.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracker_fleet::{run_accounts, write_report, AccountOutcome, FleetConfig, HttpFleetClient};

/// Correct drifted tracker reporting intervals.
#[derive(Parser, Debug)]
#[command(name = "tracker-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the XDG config location).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single pass and exit.
    #[arg(long)]
    once: bool,

    /// Analyze and report without sending commands.
    #[arg(long)]
    dry_run: bool,

    /// Seconds between passes, overriding the configuration.
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tracker_sync=info,tracker_protocol=info,tracker_dedup=info,tracker_fleet=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = FleetConfig::load(args.config.as_deref()).context("loading configuration")?;
    let dry_run = args.dry_run || config.dry_run;

    info!(
        "Starting tracker-sync for {} account(s){}",
        config.accounts.len(),
        if dry_run { " (dry run)" } else { "" }
    );

    if args.once {
        run_pass(&config, dry_run).await;
        return Ok(());
    }

    let period = Duration::from_secs(args.interval.unwrap_or(config.poll_interval_secs).max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_pass(&config, dry_run).await;
                info!("Next pass in {}s", period.as_secs());
            }
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Run every account once and write the reports
async fn run_pass(config: &FleetConfig, dry_run: bool) {
    let outcomes = run_accounts(config, dry_run, HttpFleetClient::new).await;

    if let Some(dir) = &config.report_dir {
        for report in outcomes.iter().filter_map(|o| o.report.as_ref()) {
            if let Err(e) = write_report(report, dir) {
                error!("Failed to write report for {}: {}", report.account, e);
            }
        }
    }

    log_outcomes(&outcomes);
}

fn log_outcomes(outcomes: &[AccountOutcome]) {
    for outcome in outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), _) => {
                let sent = report.send.as_ref().map_or(0, |s| s.sent);
                info!(
                    "{}: {} drifted, {} eligible, {} suppressed, {} sent",
                    outcome.account,
                    report.drifted,
                    report.eligible.len(),
                    report.suppressed(),
                    sent
                );
            }
            (None, Some(e)) => warn!("{}: pass failed: {}", outcome.account, e),
            (None, None) => {}
        }
    }
}
