//! Fleet Integration
//!
//! This crate connects the pending-command analysis to a fleet-management
//! API: it finds trackers whose reporting interval drifted, checks what is
//! already queued for them and sends the corrective command where needed.
//!
//! # Architecture
//!
//! - [`FleetApi`]: the three API operations a pass needs, with
//!   [`HttpFleetClient`] as the HTTPS implementation
//! - [`drifted_devices`]: devices whose interval differs from the profile
//! - [`AccountPass`]: list, detect, analyze, send, report for one account
//! - [`CommandSender`]: batched sends with a pause between batches
//! - [`PassReport`]: JSON and plain-text output of a pass
//!
//! Accounts are configured in a JSON [`FleetConfig`], by default
//! `$XDG_CONFIG_HOME/tracker-sync/config.json`.
//!
//! # Example
//!
//! ```rust
//! use tracker_fleet::FleetConfig;
//!
//! let config = FleetConfig::from_json(r#"{
//!     "accounts": [{
//!         "name": "north",
//!         "api_base_url": "https://fleet.example.com/api",
//!         "api_token": "secret",
//!         "expected_interval_secs": 600,
//!         "candidate_command": "AT+TIMEGAP=0,600,1,600"
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(config.accounts[0].batch_size, 50);
//! ```

pub mod client;
pub mod config;
pub mod drift;
pub mod error;
pub mod pass;
pub mod report;
pub mod sender;

pub use client::{drop_canceled, DeviceRecord, FleetApi, HttpFleetClient, SendReceipt};
pub use config::{AccountProfile, FleetConfig};
pub use drift::{drifted_devices, has_drifted};
pub use error::{ConfigError, FleetError};
pub use pass::{run_accounts, AccountOutcome, AccountPass};
pub use report::{write_report, PassReport};
pub use sender::{CommandSender, SendSummary};
