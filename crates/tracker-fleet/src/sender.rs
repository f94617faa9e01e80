//! Batched command sending
//!
//! Eligible devices are sent the corrective command in fixed-size batches
//! with a pause between batches, so one account never floods the fleet API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracker_protocol::DeviceId;

use crate::client::FleetApi;
use crate::config::AccountProfile;

/// Outcome of sending one command to a set of devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendSummary {
    /// Number of send requests issued
    pub batches: usize,
    /// Devices in batches the API accepted
    pub sent: usize,
    /// Devices in batches that failed
    pub failed: usize,
    /// One message per failed batch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SendSummary {
    /// Whether every batch went through
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Sends a command in batches
#[derive(Debug, Clone)]
pub struct CommandSender {
    batch_size: usize,
    batch_delay: Duration,
}

impl CommandSender {
    /// Create a sender; a zero batch size is treated as one
    pub fn new(batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Create a sender with an account's batch settings
    pub fn from_profile(profile: &AccountProfile) -> Self {
        Self::new(
            profile.batch_size,
            Duration::from_millis(profile.batch_delay_ms),
        )
    }

    /// Devices per send request
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Send `command` to `devices`
    ///
    /// A failed batch is recorded and the remaining batches are still sent.
    pub async fn send<A: FleetApi + ?Sized>(
        &self,
        api: &A,
        devices: &[DeviceId],
        command: &str,
    ) -> SendSummary {
        let mut summary = SendSummary::default();
        let total = devices.len().div_ceil(self.batch_size);

        for (index, batch) in devices.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            summary.batches += 1;

            match api.send_command(batch, command).await {
                Ok(receipt) => {
                    debug!(
                        "Batch {}/{}: {} device(s), {} accepted",
                        index + 1,
                        total,
                        batch.len(),
                        receipt.accepted
                    );
                    summary.sent += batch.len();
                }
                Err(e) => {
                    warn!(
                        "Batch {}/{} of {} device(s) failed: {}",
                        index + 1,
                        total,
                        batch.len(),
                        e
                    );
                    summary.failed += batch.len();
                    summary.errors.push(format!("batch {}: {}", index + 1, e));
                }
            }
        }

        info!(
            "Sent command to {} device(s) in {} batch(es), {} failed",
            summary.sent, summary.batches, summary.failed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_batch_size() {
        let sender = CommandSender::new(0, Duration::ZERO);
        assert_eq!(sender.batch_size(), 1);
    }

    #[test]
    fn test_summary_serialization() {
        let summary = SendSummary {
            batches: 2,
            sent: 3,
            failed: 0,
            errors: Vec::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"batches": 2, "sent": 3, "failed": 0})
        );
        assert!(summary.is_complete());
    }
}
