use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shipwatch_core::OrderStatusLogEntry;
use shipwatch_order::ReactionReport;
use shipwatch_shared::OrderStatusChangedEvent;

use crate::error::AppError;
use crate::intake::handle_status_change;
use crate::state::AppState;

/// POST /v1/events/order-status-changed
/// Receive a status change signal from the order platform
pub async fn order_status_changed(
    State(state): State<AppState>,
    Json(payload): Json<OrderStatusChangedEvent>,
) -> Result<(StatusCode, Json<ReactionReport>), AppError> {
    if payload.order_increment_id.trim().is_empty() {
        return Err(AppError::ValidationError("order_increment_id is required".to_string()));
    }

    tracing::info!(
        "Received status change for order {}: {:?} -> {:?}",
        payload.order_increment_id, payload.old_status, payload.new_status
    );

    let increment_id = payload.order_increment_id.clone();
    match handle_status_change(&state, payload).await? {
        Some(report) => Ok((StatusCode::ACCEPTED, Json(report))),
        None => Err(AppError::NotFoundError(format!("Order not found: {}", increment_id))),
    }
}

/// GET /v1/orders/{increment_id}/status-log
/// Audit trail of one order, newest first
pub async fn get_status_log(
    State(state): State<AppState>,
    Path(increment_id): Path<String>,
) -> Result<Json<Vec<OrderStatusLogEntry>>, AppError> {
    let entries = state.status_log.list_for_order(&increment_id).await?;
    Ok(Json(entries))
}
