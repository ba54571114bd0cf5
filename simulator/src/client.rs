use crate::device::{DeviceIdentity, DeviceStatus, DeviceType};
use crate::errors::{Error, Result};
use crate::telemetry::TelemetrySample;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, field, warn};
use uuid::Uuid;

const DEVICE_KEY_HEADER: &str = "x-device-key";
const ADMIN_KEY_HEADER: &str = "x-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-device calls the simulator makes against the API.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn register(&self, identity: &DeviceIdentity) -> Result<Registration>;

    async fn status(&self, device_key: &str) -> Result<StatusReport>;

    async fn send_telemetry(&self, device_key: &str, sample: &TelemetrySample) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    device_id: Uuid,
    name: &'a str,
    #[serde(rename = "type")]
    device_type: DeviceType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub device_key: String,
    pub status: DeviceStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: DeviceStatus,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevokeResponse {
    pub status: DeviceStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the device API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Moves a device to the revoked state. Operator call, authenticated with the admin key.
    pub async fn revoke(&self, device_id: &str, admin_key: &str) -> Result<RevokeResponse> {
        let response = self
            .http
            .post(self.url(&format!("/admin/devices/{}/revoke", device_id)))
            .header(ADMIN_KEY_HEADER, admin_key)
            .send()
            .await?;

        let response = check_status(response).await?;
        read_json(response).await
    }
}

#[async_trait]
impl DeviceApi for ApiClient {
    async fn register(&self, identity: &DeviceIdentity) -> Result<Registration> {
        let request = RegisterRequest {
            device_id: identity.device_id,
            name: &identity.name,
            device_type: identity.device_type,
        };

        debug!("calling remote");
        let response = self
            .http
            .post(self.url("/devices/register"))
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        read_json(response).await
    }

    async fn status(&self, device_key: &str) -> Result<StatusReport> {
        let response = self
            .http
            .get(self.url("/devices/me"))
            .header(DEVICE_KEY_HEADER, device_key)
            .send()
            .await?;

        let response = check_status(response).await?;
        read_json(response).await
    }

    async fn send_telemetry(&self, device_key: &str, sample: &TelemetrySample) -> Result<()> {
        let response = self
            .http
            .post(self.url("/telemetry"))
            .header(DEVICE_KEY_HEADER, device_key)
            .json(sample)
            .send()
            .await?;

        // success body is not used
        check_status(response).await?;
        Ok(())
    }
}

/// Turns a non-2xx response into `Error::Protocol`.
///
/// The body is read as `{"message": ...}` when possible. A missing or
/// unparseable body falls back to the status reason phrase.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!(response = field::display(status), "success");
        return Ok(response);
    }

    warn!(response = field::display(status), "received error response");

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body.message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    });

    Err(Error::Protocol { status, message })
}

/// Parses a successful response body. A body that does not match the
/// expected shape is a `Decode` error, not a connection failure.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    response.json().await.map_err(|source| {
        if source.is_decode() {
            Error::Decode { status, source }
        } else {
            Error::Transport(source)
        }
    })
}
