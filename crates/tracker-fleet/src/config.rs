//! Account profiles and service configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;
use tracker_dedup::{AnalyzerConfig, DEFAULT_VOLUME_CAP};

use crate::error::ConfigError;

/// Prefix marking an `api_token` that should be read from the environment
const ENV_TOKEN_PREFIX: &str = "env:";

/// Expected reporting profile and API access for one fleet account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountProfile {
    /// Account name (reports and logs)
    pub name: String,
    /// Fleet API base URL
    pub api_base_url: String,
    /// Bearer token, or `env:VAR` to read it from the environment
    pub api_token: String,
    /// Reporting interval every device should have
    pub expected_interval_secs: u32,
    /// Command that restores the expected interval
    pub candidate_command: String,
    /// Devices per send request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause between send requests
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Outstanding-command count at which a device is left alone
    #[serde(default = "default_volume_cap")]
    pub volume_cap: usize,
}

fn default_batch_size() -> usize {
    50
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_volume_cap() -> usize {
    DEFAULT_VOLUME_CAP
}

impl AccountProfile {
    /// Analyzer configuration for this account
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            volume_cap: self.volume_cap,
        }
    }

    /// Replace an `env:VAR` token with the variable's value
    fn resolve_token(&mut self) -> Result<(), ConfigError> {
        if let Some(var) = self.api_token.strip_prefix(ENV_TOKEN_PREFIX) {
            self.api_token =
                std::env::var(var).map_err(|_| ConfigError::MissingEnv(var.to_string()))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |what: &str| ConfigError::Invalid(format!("account {:?}: {}", self.name, what));

        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("account with empty name".into()));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("empty api_base_url"));
        }
        if self.candidate_command.trim().is_empty() {
            return Err(invalid("empty candidate_command"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1"));
        }
        if self.volume_cap == 0 {
            return Err(invalid("volume_cap must be at least 1"));
        }
        Ok(())
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetConfig {
    /// Accounts, processed in order
    pub accounts: Vec<AccountProfile>,
    /// Pause between two accounts
    #[serde(default = "default_inter_account_pause_secs")]
    pub inter_account_pause_secs: u64,
    /// Time between passes when running periodically
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Where pass reports are written; no reports when unset
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    /// Analyze and report without sending
    #[serde(default)]
    pub dry_run: bool,
}

fn default_inter_account_pause_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    3600
}

impl FleetConfig {
    /// Get the XDG config directory for tracker-sync
    /// Uses $XDG_CONFIG_HOME/tracker-sync, falls back to ~/.config/tracker-sync
    pub fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("tracker-sync"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("tracker-sync"))
    }

    /// Default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Parse, resolve tokens and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: FleetConfig = serde_json::from_str(json)?;
        for account in &mut config.accounts {
            account.resolve_token()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().ok_or(ConfigError::NoConfigPath)?,
        };

        let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json(&json)?;

        info!(
            "Loaded {} account(s) from {}",
            config.accounts.len(),
            path.display()
        );
        Ok(config)
    }

    /// Check that the configuration can drive a pass
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::Invalid("no accounts configured".into()));
        }
        self.accounts.iter().try_for_each(AccountProfile::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "accounts": [{
            "name": "north",
            "api_base_url": "https://fleet.example.com/api",
            "api_token": "secret",
            "expected_interval_secs": 600,
            "candidate_command": "AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0"
        }]
    }"#;

    #[test]
    fn test_defaults() {
        let config = FleetConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.inter_account_pause_secs, 10);
        assert_eq!(config.poll_interval_secs, 3600);
        assert_eq!(config.report_dir, None);
        assert!(!config.dry_run);

        let account = &config.accounts[0];
        assert_eq!(account.batch_size, 50);
        assert_eq!(account.batch_delay_ms, 1000);
        assert_eq!(account.request_timeout_secs, 30);
        assert_eq!(account.analyzer_config().volume_cap, DEFAULT_VOLUME_CAP);
    }

    #[test]
    fn test_no_accounts_rejected() {
        let err = FleetConfig::from_json(r#"{"accounts": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let json = MINIMAL.replace(
            "\"expected_interval_secs\"",
            "\"batch_size\": 0, \"expected_interval_secs\"",
        );
        let err = FleetConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_blank_candidate_rejected() {
        let json = MINIMAL.replace("AT+TIMEGAP=0,600,1,600 & AT+SAMPLEMODE=0,0", "  ");
        let err = FleetConfig::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("candidate_command"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            FleetConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_token() {
        std::env::set_var("TRACKER_SYNC_TEST_TOKEN", "from-env");
        let json = MINIMAL.replace("\"secret\"", "\"env:TRACKER_SYNC_TEST_TOKEN\"");
        let config = FleetConfig::from_json(&json).unwrap();
        assert_eq!(config.accounts[0].api_token, "from-env");
    }

    #[test]
    fn test_missing_env_token() {
        let json = MINIMAL.replace("\"secret\"", "\"env:TRACKER_SYNC_UNSET_TOKEN\"");
        assert!(matches!(
            FleetConfig::from_json(&json),
            Err(ConfigError::MissingEnv(var)) if var == "TRACKER_SYNC_UNSET_TOKEN"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = FleetConfig::load(Some(&path)).unwrap();
        assert_eq!(config.accounts[0].name, "north");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FleetConfig::load(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
