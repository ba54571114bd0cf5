use crate::device::DeviceType;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// One telemetry reading, generated fresh for every send.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySample {
    pub ts: DateTime<Utc>,
    pub battery: u8,
    #[serde(flatten)]
    pub reading: Reading,
}

/// Type specific part of a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Climate { temperature: f64, humidity: u8 },
    Presence { motion: bool },
}

impl TelemetrySample {
    pub fn generate(device_type: DeviceType, rng: &mut impl Rng) -> Self {
        let battery = rng.gen_range(70..=100);

        let reading = match device_type {
            DeviceType::Climate => Reading::Climate {
                // tenths of a degree, 18.0..=26.0
                temperature: f64::from(rng.gen_range(180..=260_u16)) / 10.0,
                humidity: rng.gen_range(40..=70),
            },
            DeviceType::Presence => Reading::Presence {
                motion: rng.gen_bool(0.3),
            },
        };

        Self {
            ts: Utc::now(),
            battery,
            reading,
        }
    }

    /// Short human readable line for the log.
    pub fn summary(&self) -> String {
        match &self.reading {
            Reading::Climate {
                temperature,
                humidity,
            } => format!(
                "{:.1}°C, {}% RH, battery {}%",
                temperature, humidity, self.battery
            ),
            Reading::Presence { motion } => {
                format!("motion={}, battery {}%", motion, self.battery)
            }
        }
    }
}
