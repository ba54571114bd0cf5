use clap::Parser;
use simulator::admin::{self, RevokeArgs, RevokeConfig};
use simulator::client::ApiClient;
use tracing::error;

#[tokio::main]
async fn main() {
    simulator::init_tracing();

    // checked before any network call
    let config = match RevokeConfig::try_from(RevokeArgs::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let api = match ApiClient::new(&config.api_url) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = admin::revoke_device(&api, &config).await {
        error!("{}", admin::describe_failure(&e, &config.device_id));
        std::process::exit(1);
    }
}
