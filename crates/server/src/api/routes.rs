use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{cards, handlers, middleware::metrics_middleware, process, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboard static files path (configurable via env)
    let dashboard_dir = std::env::var("DASHBOARD_DIR").unwrap_or_else(|_| "dashboard".to_string());

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Run control
        .route("/process/start", post(process::start))
        .route("/process/stop", post(process::stop))
        .route("/process/status", get(process::get_status))
        // History
        .route("/cards", get(cards::list_cards))
        .route("/export", post(cards::export))
        // Live updates
        .route("/ws", get(ws::ws_handler))
        .with_state(state.clone());

    // Serve dashboard with SPA fallback
    let index_path = format!("{}/index.html", dashboard_dir);
    let serve_dir = ServeDir::new(&dashboard_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics).with_state(state))
        .fallback_service(serve_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
