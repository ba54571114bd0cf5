use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

/// Shared handler state. Holds the pool handed over by `main`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub ok: bool,
}

pub fn create_router(pool: PgPool) -> Router {
    let state = AppState { pool };

    Router::new()
        .route("/ping", get(ping))
        .with_state(state)
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse { ok: true })
}
