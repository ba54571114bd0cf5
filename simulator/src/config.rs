use crate::device::DeviceType;
use crate::lifecycle::{
    PollSettings, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TELEMETRY_INTERVAL_MS,
};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Simulates one IoT device: register, wait for activation, then stream telemetry.
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
pub struct Args {
    /// Device type, decides the telemetry payload
    #[arg(long = "type", value_enum, default_value_t = DeviceType::Climate)]
    pub device_type: DeviceType,

    /// Device name, generated from the type and current time when absent
    #[arg(long)]
    pub name: Option<String>,

    /// Base address of the device API
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Status polls before giving up on activation
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(long, env = "TELEMETRY_INTERVAL_MS", default_value_t = DEFAULT_TELEMETRY_INTERVAL_MS)]
    pub telemetry_interval_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub device_type: DeviceType,
    pub name: Option<String>,
    pub api_url: String,
    pub poll: PollSettings,
    pub telemetry_interval: Duration,
}

impl From<Args> for SimulatorConfig {
    fn from(args: Args) -> Self {
        Self {
            device_type: args.device_type,
            name: args.name,
            api_url: args.api_url,
            poll: PollSettings {
                interval: Duration::from_millis(args.poll_interval_ms),
                max_attempts: args.max_attempts,
            },
            telemetry_interval: Duration::from_millis(args.telemetry_interval_ms),
        }
    }
}
