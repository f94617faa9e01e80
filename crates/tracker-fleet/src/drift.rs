//! Reporting-interval drift detection

use std::collections::BTreeSet;

use tracing::{debug, info};
use tracker_protocol::DeviceId;

use crate::client::DeviceRecord;

/// Whether a device no longer reports at the expected interval
///
/// An unknown interval counts as drift.
pub fn has_drifted(device: &DeviceRecord, expected_interval_secs: u32) -> bool {
    device.report_interval_secs != Some(expected_interval_secs)
}

/// Valid identifiers of the devices that drifted
///
/// Devices whose identifier does not normalise are left out.
pub fn drifted_devices(
    devices: &[DeviceRecord],
    expected_interval_secs: u32,
) -> BTreeSet<DeviceId> {
    let mut invalid = 0usize;
    let drifted: BTreeSet<DeviceId> = devices
        .iter()
        .filter(|d| has_drifted(d, expected_interval_secs))
        .filter_map(|d| match DeviceId::normalize(&d.imei) {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Ignoring device {:?}: {}", d.name, e);
                invalid += 1;
                None
            }
        })
        .collect();

    info!(
        "{} of {} device(s) drifted from {}s interval ({} without a valid identifier)",
        drifted.len(),
        devices.len(),
        expected_interval_secs,
        invalid
    );
    drifted
}
