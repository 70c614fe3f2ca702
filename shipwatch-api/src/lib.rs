use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod events;
pub mod intake;
pub mod locks;
pub mod metrics;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/v1/events/order-status-changed", post(events::order_status_changed))
        .route("/v1/orders/{increment_id}/status-log", get(events::get_status_log))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shipwatch"
    }))
}
