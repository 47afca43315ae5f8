use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use liveboard_core::config::LiveboardConfig;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::hub::HubHandle;

/// Central shared state: passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: LiveboardConfig,
    pub hub: HubHandle,
}

impl AppState {
    pub fn new(config: LiveboardConfig, hub: HubHandle) -> Self {
        Self { config, hub }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let assets_dir = state.config.gateway.assets_dir.clone();

    let mut router = Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/ws", get(crate::ws::connection::ws_handler));

    // overlay pages and their assets, served as browser sources
    if let Some(dir) = assets_dir {
        info!(path = %dir, "serving static assets");
        router = router.fallback_service(ServeDir::new(dir));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
