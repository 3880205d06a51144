use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers::handle_fetch, state::AppState};
use crate::config::ProxyConfig;

/// Create the application router.
pub fn create_router(config: &ProxyConfig) -> anyhow::Result<Router> {
    let state = AppState::new(config)?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);
    let cors = if config.cors_origin == "*" {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(config.cors_origin.parse::<HeaderValue>()?)
    };

    let app = Router::new()
        .route("/fetch", get(handle_fetch))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "tracked_requests": state.interceptor.tracker().len(),
    }))
}
