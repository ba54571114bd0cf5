use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of sensor being simulated. Decides the telemetry payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Climate,
    Presence,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Climate => "climate",
            DeviceType::Presence => "presence",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status as reported by the server.
///
/// The server owns this value; unknown strings are kept as `Other` and
/// treated like `Pending` by the activation wait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DeviceStatus {
    Pending,
    Active,
    Revoked,
    Other(String),
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => DeviceStatus::Pending,
            "active" => DeviceStatus::Active,
            "revoked" => DeviceStatus::Revoked,
            _ => DeviceStatus::Other(value),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Pending => f.write_str("pending"),
            DeviceStatus::Active => f.write_str("active"),
            DeviceStatus::Revoked => f.write_str("revoked"),
            DeviceStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Identity of one simulated device, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: Uuid,
    pub name: String,
    pub device_type: DeviceType,
}

impl DeviceIdentity {
    pub fn generate(device_type: DeviceType, name: Option<String>) -> Self {
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(device_type, Utc::now().timestamp_millis()));

        Self {
            device_id: Uuid::new_v4(),
            name,
            device_type,
        }
    }
}

/// `{type}-sensor-{millis in base 36}`
pub fn default_name(device_type: DeviceType, unix_millis: i64) -> String {
    format!(
        "{}-sensor-{}",
        device_type,
        to_base36(unix_millis.max(0) as u64)
    )
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(char::from(DIGITS[(n % 36) as usize]));
        n /= 36;
    }
    digits.iter().rev().collect()
}
