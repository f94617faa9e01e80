//! Fleet API access
//!
//! # Endpoints
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | device list | `GET {base}/devices` | `{"data": [DeviceRecord]}` |
//! | command status | `POST {base}/commands/status` `{"imeis": [...]}` | `{"data": [RawCommandRow]}` |
//! | send command | `POST {base}/commands/send` `{"imeis": [...], "command": "..."}` | `SendReceipt` |
//!
//! Command-status rows come back most recently updated first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracker_dedup::record::STATE_CANCELED;
use tracker_dedup::RawCommandRow;
use tracker_protocol::DeviceId;

use crate::config::AccountProfile;
use crate::error::FleetError;

/// A device as listed by the fleet API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device identifier, not yet normalised
    pub imei: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Reporting interval the device currently uses, if known
    #[serde(default, alias = "report_interval")]
    pub report_interval_secs: Option<u32>,
}

/// Acknowledgement of a send request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    /// Devices the API queued the command for
    #[serde(default)]
    pub accepted: usize,
    /// Free-form message from the API
    #[serde(default)]
    pub message: Option<String>,
}

/// Operations the corrector needs from the fleet API
#[async_trait]
pub trait FleetApi: Send + Sync {
    /// List every device of the account
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, FleetError>;

    /// Outstanding command rows for `devices`, canceled rows removed
    async fn pending_commands(&self, devices: &[DeviceId])
        -> Result<Vec<RawCommandRow>, FleetError>;

    /// Queue `command` for `devices`
    async fn send_command(
        &self,
        devices: &[DeviceId],
        command: &str,
    ) -> Result<SendReceipt, FleetError>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    imeis: &'a [DeviceId],
}

#[derive(Serialize)]
struct SendRequest<'a> {
    imeis: &'a [DeviceId],
    command: &'a str,
}

/// [`FleetApi`] over HTTPS with a bearer token
pub struct HttpFleetClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpFleetClient {
    /// Create a client for an account
    pub fn new(profile: &AccountProfile) -> Result<Self, FleetError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(profile.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: profile.api_base_url.trim_end_matches('/').to_string(),
            token: profile.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, FleetError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FleetError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl FleetApi for HttpFleetClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, FleetError> {
        let request = self.client.get(self.url("devices"));
        let envelope: DataEnvelope<Vec<DeviceRecord>> = self.call("devices", request).await?;
        debug!("Fleet API listed {} device(s)", envelope.data.len());
        Ok(envelope.data)
    }

    async fn pending_commands(
        &self,
        devices: &[DeviceId],
    ) -> Result<Vec<RawCommandRow>, FleetError> {
        if devices.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .post(self.url("commands/status"))
            .json(&StatusRequest { imeis: devices });
        let envelope: DataEnvelope<Vec<RawCommandRow>> =
            self.call("commands/status", request).await?;

        Ok(drop_canceled(envelope.data))
    }

    async fn send_command(
        &self,
        devices: &[DeviceId],
        command: &str,
    ) -> Result<SendReceipt, FleetError> {
        let request = self
            .client
            .post(self.url("commands/send"))
            .json(&SendRequest {
                imeis: devices,
                command,
            });
        self.call("commands/send", request).await
    }
}

/// Remove canceled rows, keeping order
pub fn drop_canceled(rows: Vec<RawCommandRow>) -> Vec<RawCommandRow> {
    rows.into_iter()
        .filter(|row| row.state != STATE_CANCELED)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_record_aliases() {
        let record: DeviceRecord = serde_json::from_str(
            r#"{"imei": "860000000000001", "name": "van 1", "report_interval": 300}"#,
        )
        .unwrap();
        assert_eq!(record.report_interval_secs, Some(300));

        let record: DeviceRecord = serde_json::from_str(r#"{"imei": "860000000000002"}"#).unwrap();
        assert_eq!(record.report_interval_secs, None);
        assert_eq!(record.name, "");
    }

    #[test]
    fn test_command_rows_parse() {
        let envelope: DataEnvelope<Vec<RawCommandRow>> = serde_json::from_str(
            r#"{"data": [
                {"imei": "860000000000001", "msg": "AT+RESET", "state": 0, "created_date": 1700000000},
                {"imei": "860000000000001", "msg": "AT+GPS=1", "state": 5, "created_date": 1699990000}
            ]}"#,
        )
        .unwrap();

        let rows = drop_canceled(envelope.data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].msg, "AT+RESET");
    }

    #[test]
    fn test_send_request_shape() {
        let ids = vec![DeviceId::normalize("860000000000001").unwrap()];
        let json = serde_json::to_value(SendRequest {
            imeis: &ids,
            command: "AT+TIMEGAP=0,600,1,600",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"imeis": ["860000000000001"], "command": "AT+TIMEGAP=0,600,1,600"})
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let profile = AccountProfile {
            name: "north".into(),
            api_base_url: "https://fleet.example.com/api/".into(),
            api_token: "secret".into(),
            expected_interval_secs: 600,
            candidate_command: "AT+TIMEGAP=0,600,1,600".into(),
            batch_size: 50,
            batch_delay_ms: 0,
            request_timeout_secs: 5,
            volume_cap: 4,
        };
        let client = HttpFleetClient::new(&profile).unwrap();
        assert_eq!(client.url("devices"), "https://fleet.example.com/api/devices");
    }
}
