use crate::client::ApiClient;
use crate::config::DEFAULT_API_URL;
use crate::errors::{Error, Result};
use clap::Parser;
use reqwest::StatusCode;
use tracing::info;

/// Revokes a device so it can no longer report telemetry.
#[derive(Debug, Parser)]
#[command(name = "revoke-device", version)]
pub struct RevokeArgs {
    /// Id of the device to revoke
    pub device_id: Option<String>,

    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "ADMIN_API_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RevokeConfig {
    pub device_id: String,
    pub api_url: String,
    pub admin_key: String,
}

impl TryFrom<RevokeArgs> for RevokeConfig {
    type Error = Error;

    fn try_from(args: RevokeArgs) -> Result<Self> {
        let device_id = args
            .device_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Config("usage: revoke-device <deviceId>".to_string()))?;

        let admin_key = args
            .admin_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("ADMIN_API_KEY is not set".to_string()))?;

        Ok(Self {
            device_id,
            api_url: args.api_url,
            admin_key,
        })
    }
}

pub async fn revoke_device(api: &ApiClient, config: &RevokeConfig) -> Result<()> {
    info!("Revoking device {}...", config.device_id);

    let response = api.revoke(&config.device_id, &config.admin_key).await?;

    info!(
        "Device revoked, id: {}, status: {}",
        config.device_id, response.status
    );
    Ok(())
}

/// Operator facing text for a failed revoke.
pub fn describe_failure(err: &Error, device_id: &str) -> String {
    match err {
        Error::Protocol { status, .. } if *status == StatusCode::NOT_FOUND => {
            format!("Device not found: {}", device_id)
        }
        Error::Protocol { status, .. } if *status == StatusCode::UNAUTHORIZED => {
            "Invalid admin API key".to_string()
        }
        other => other.to_string(),
    }
}
