use crate::client::{DeviceApi, Registration};
use crate::config::SimulatorConfig;
use crate::device::{DeviceIdentity, DeviceStatus, DeviceType};
use crate::errors::{Error, Result};
use crate::telemetry::TelemetrySample;
use std::io::Write;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 10_000;

/// How the activation wait polls the status endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Drives one device through registration, activation and telemetry.
///
/// Returns the number of telemetry sends once the device is revoked while
/// streaming. Every error before streaming starts is fatal.
pub async fn run<A: DeviceApi + ?Sized>(api: &A, config: &SimulatorConfig) -> Result<u64> {
    let identity = DeviceIdentity::generate(config.device_type, config.name.clone());

    let registration = register(api, &identity).await?;
    wait_for_activation(api, &registration.device_key, config.poll).await?;

    Ok(telemetry_loop(
        api,
        &registration.device_key,
        identity.device_type,
        config.telemetry_interval,
    )
    .await)
}

pub async fn register<A: DeviceApi + ?Sized>(
    api: &A,
    identity: &DeviceIdentity,
) -> Result<Registration> {
    info!(
        "Registering device {} (name: {}, type: {})",
        identity.device_id, identity.name, identity.device_type
    );

    let registration = api.register(identity).await?;

    info!(
        "Registered, device key: {}, status: {}",
        registration.device_key, registration.status
    );

    Ok(registration)
}

/// Polls the device status until it becomes active.
///
/// Fails with `Error::Revoked` as soon as the device is seen revoked and
/// with `Error::Timeout` after `max_attempts` polls. HTTP failures are not
/// retried.
pub async fn wait_for_activation<A: DeviceApi + ?Sized>(
    api: &A,
    device_key: &str,
    settings: PollSettings,
) -> Result<()> {
    info!(
        "Waiting for admin approval (polling every {:?}, at most {} attempts)",
        settings.interval, settings.max_attempts
    );

    let mut progress = Progress::default();

    for attempt in 1..=settings.max_attempts {
        let report = match api.status(device_key).await {
            Ok(report) => report,
            Err(e) => {
                progress.finish();
                return Err(e);
            }
        };

        match report.status {
            DeviceStatus::Active => {
                progress.finish();
                info!("Device activated after {} attempt(s)", attempt);
                return Ok(());
            }
            DeviceStatus::Revoked => {
                progress.finish();
                return Err(Error::Revoked);
            }
            status => progress.update(attempt, settings.max_attempts, &status),
        }

        if attempt < settings.max_attempts {
            tokio::time::sleep(settings.interval).await;
        }
    }

    progress.finish();
    Err(Error::Timeout(settings.max_attempts))
}

/// Sends one fresh sample per interval until the server revokes the device.
///
/// Other failures are logged and the loop carries on. Returns the number of
/// sends attempted, the last one being the rejected one.
pub async fn telemetry_loop<A: DeviceApi + ?Sized>(
    api: &A,
    device_key: &str,
    device_type: DeviceType,
    interval: Duration,
) -> u64 {
    info!("Starting telemetry every {:?}, Ctrl+C to stop", interval);

    let mut sent = 0u64;

    loop {
        let sample = TelemetrySample::generate(device_type, &mut rand::thread_rng());
        sent += 1;

        match api.send_telemetry(device_key, &sample).await {
            Ok(()) => info!("Telemetry sent: {}", sample.summary()),
            Err(e) => {
                error!("Failed to send telemetry: {}", e);

                if e.is_revoked() {
                    warn!("Device revoked, stopping simulation");
                    return sent;
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Single status line rewritten in place on stderr.
#[derive(Default)]
struct Progress {
    dirty: bool,
}

impl Progress {
    fn update(&mut self, attempt: u32, max_attempts: u32, status: &DeviceStatus) {
        let mut stderr = std::io::stderr();
        // progress output is best effort
        let _ = write!(
            stderr,
            "\r   attempt {}/{} - status: {}   ",
            attempt, max_attempts, status
        );
        let _ = stderr.flush();
        self.dirty = true;
    }

    fn finish(&mut self) {
        if self.dirty {
            eprintln!();
            self.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StatusReport;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const TICK: Duration = Duration::from_millis(1);

    /// In-memory API answering from scripted queues.
    #[derive(Default)]
    struct ScriptedApi {
        registration: Mutex<Option<Result<Registration>>>,
        statuses: Mutex<VecDeque<Result<DeviceStatus>>>,
        sends: Mutex<VecDeque<Result<()>>>,
        registered: Mutex<Vec<DeviceIdentity>>,
        status_keys: Mutex<Vec<String>>,
        send_keys: Mutex<Vec<String>>,
    }

    impl ScriptedApi {
        fn with_statuses(statuses: Vec<Result<DeviceStatus>>) -> Self {
            Self {
                statuses: Mutex::new(statuses.into()),
                ..Default::default()
            }
        }

        fn with_sends(sends: Vec<Result<()>>) -> Self {
            Self {
                sends: Mutex::new(sends.into()),
                ..Default::default()
            }
        }

        fn status_calls(&self) -> usize {
            self.status_keys.lock().unwrap().len()
        }

        fn send_calls(&self) -> usize {
            self.send_keys.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DeviceApi for ScriptedApi {
        async fn register(&self, identity: &DeviceIdentity) -> Result<Registration> {
            self.registered.lock().unwrap().push(identity.clone());
            self.registration
                .lock()
                .unwrap()
                .take()
                .expect("unexpected registration")
        }

        async fn status(&self, device_key: &str) -> Result<StatusReport> {
            self.status_keys.lock().unwrap().push(device_key.to_string());
            let status = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(DeviceStatus::Pending))?;

            Ok(StatusReport {
                status,
                device_id: None,
            })
        }

        async fn send_telemetry(&self, device_key: &str, _sample: &TelemetrySample) -> Result<()> {
            self.send_keys.lock().unwrap().push(device_key.to_string());
            self.sends
                .lock()
                .unwrap()
                .pop_front()
                .expect("telemetry loop ran past the script")
        }
    }

    fn http_error(status: StatusCode) -> Error {
        Error::Protocol {
            status,
            message: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    fn settings(max_attempts: u32) -> PollSettings {
        PollSettings {
            interval: TICK,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn test_timeout_after_exactly_max_attempts() {
        let api = ScriptedApi::default();

        let err = wait_for_activation(&api, "k1", settings(60)).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(60)));
        assert_eq!(api.status_calls(), 60);
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let api = ScriptedApi::with_statuses(vec![
            Ok(DeviceStatus::Other("suspended".to_string())),
            Ok(DeviceStatus::Pending),
        ]);

        let err = wait_for_activation(&api, "k1", settings(3)).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(3)));
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_active_stops_polling() {
        let api = ScriptedApi::with_statuses(vec![
            Ok(DeviceStatus::Pending),
            Ok(DeviceStatus::Active),
            Ok(DeviceStatus::Pending),
        ]);

        wait_for_activation(&api, "k1", settings(10)).await.unwrap();

        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_revoked_fails_immediately() {
        let api = ScriptedApi::with_statuses(vec![
            Ok(DeviceStatus::Pending),
            Ok(DeviceStatus::Pending),
            Ok(DeviceStatus::Revoked),
            Ok(DeviceStatus::Active),
        ]);

        let err = wait_for_activation(&api, "k1", settings(10)).await.unwrap_err();

        assert!(matches!(err, Error::Revoked));
        assert_eq!(api.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_poll_http_error_is_not_retried() {
        let api = ScriptedApi::with_statuses(vec![
            Ok(DeviceStatus::Pending),
            Err(http_error(StatusCode::SERVICE_UNAVAILABLE)),
            Ok(DeviceStatus::Active),
        ]);

        let err = wait_for_activation(&api, "k1", settings(10)).await.unwrap_err();

        match err {
            Error::Protocol { status, .. } => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(api.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_telemetry_loop_stops_on_revocation() {
        let api = ScriptedApi::with_sends(vec![
            Ok(()),
            Err(http_error(StatusCode::INTERNAL_SERVER_ERROR)),
            Ok(()),
            Err(http_error(StatusCode::FORBIDDEN)),
        ]);

        let sent = telemetry_loop(&api, "k1", DeviceType::Climate, TICK).await;

        assert_eq!(sent, 4);
        assert_eq!(api.send_calls(), 4);
        assert!(api.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_telemetry_loop_ignores_non_forbidden_client_errors() {
        let api = ScriptedApi::with_sends(vec![
            Err(http_error(StatusCode::UNAUTHORIZED)),
            Err(http_error(StatusCode::BAD_REQUEST)),
            Err(Error::Revoked),
        ]);

        let sent = telemetry_loop(&api, "k1", DeviceType::Presence, TICK).await;

        assert_eq!(sent, 3);
    }

    #[tokio::test]
    async fn test_telemetry_loop_continues_after_connection_failure() {
        // nothing listens on port 1
        let refused = reqwest::get("http://127.0.0.1:1").await.unwrap_err();

        let api = ScriptedApi::with_sends(vec![
            Err(Error::Transport(refused)),
            Err(http_error(StatusCode::FORBIDDEN)),
        ]);

        let sent = telemetry_loop(&api, "k1", DeviceType::Climate, TICK).await;

        assert_eq!(sent, 2);
        assert_eq!(api.send_calls(), 2);
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let api = ScriptedApi {
            registration: Mutex::new(Some(Ok(Registration {
                device_key: "k1".to_string(),
                status: DeviceStatus::Pending,
            }))),
            statuses: Mutex::new(
                vec![
                    Ok(DeviceStatus::Pending),
                    Ok(DeviceStatus::Pending),
                    Ok(DeviceStatus::Active),
                ]
                .into(),
            ),
            sends: Mutex::new(vec![Err(http_error(StatusCode::FORBIDDEN))].into()),
            ..Default::default()
        };

        let config = SimulatorConfig {
            device_type: DeviceType::Climate,
            name: Some("Kitchen".to_string()),
            api_url: "http://unused".to_string(),
            poll: settings(60),
            telemetry_interval: TICK,
        };

        let sent = run(&api, &config).await.unwrap();
        assert_eq!(sent, 1);

        let registered = api.registered.lock().unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].name, "Kitchen");
        assert_eq!(registered[0].device_type, DeviceType::Climate);

        assert_eq!(*api.status_keys.lock().unwrap(), vec!["k1"; 3]);
        assert_eq!(*api.send_keys.lock().unwrap(), vec!["k1"]);
    }

    #[tokio::test]
    async fn test_run_registration_failure_is_fatal() {
        let api = ScriptedApi {
            registration: Mutex::new(Some(Err(http_error(StatusCode::BAD_REQUEST)))),
            ..Default::default()
        };

        let config = SimulatorConfig {
            device_type: DeviceType::Presence,
            name: None,
            api_url: "http://unused".to_string(),
            poll: settings(5),
            telemetry_interval: TICK,
        };

        let err = run(&api, &config).await.unwrap_err();

        assert!(matches!(err, Error::Protocol { .. }));
        assert_eq!(api.status_calls(), 0);
        assert_eq!(api.send_calls(), 0);
    }
}
