use device_api::db;
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| db::DEFAULT_DATABASE_URL.to_string());

    device_api::init_tracing();

    info!("Resetting database {}", database_url.split('@').last().unwrap_or("***"));

    let pool = match db::make_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let result = db::reset(&pool).await;
    pool.close().await;

    match result {
        Ok(cleared) if cleared.is_empty() => {
            info!("No tables found, the database is already empty");
        }
        Ok(cleared) => {
            let rows: u64 = cleared.iter().map(|(_, n)| n).sum();
            info!("Database reset: {} table(s), {} row(s) deleted", cleared.len(), rows);
        }
        Err(e) => {
            error!("Database reset failed: {}", e);
            std::process::exit(1);
        }
    }
}
