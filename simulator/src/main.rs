use clap::Parser;
use simulator::client::ApiClient;
use simulator::config::{Args, SimulatorConfig};
use simulator::lifecycle;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = SimulatorConfig::from(Args::parse());

    simulator::init_tracing();

    info!("Starting IoT device simulator");
    info!("API: {}", config.api_url);

    let api = match ApiClient::new(&config.api_url) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    match lifecycle::run(&api, &config).await {
        Ok(sent) => info!("Simulation stopped after {} telemetry send(s)", sent),
        Err(e) => {
            error!("Fatal error: {}", e);
            std::process::exit(1);
        }
    }
}
