use shipwatch_core::{CoreResult, OrderStatus};
use shipwatch_order::{ReactionReport, StatusChangeEvent};
use shipwatch_shared::OrderStatusChangedEvent;

use crate::state::AppState;

/// Empty strings count as "no status", same as a missing field.
fn status(raw: Option<String>) -> Option<OrderStatus> {
    raw.filter(|s| !s.trim().is_empty()).map(OrderStatus::new)
}

/// Bind a status signal to its order and run the reaction.
///
/// Reactions for the same order run one at a time, whichever source the
/// signal came from. Returns `Ok(None)` when the order is unknown. The only
/// error is failing to load the order; nothing from the reaction itself is
/// surfaced.
pub async fn handle_status_change(
    state: &AppState,
    signal: OrderStatusChangedEvent,
) -> CoreResult<Option<ReactionReport>> {
    let _order_lock = state.order_locks.acquire(&signal.order_increment_id).await;

    let Some(order) = state.orders.find_by_increment_id(&signal.order_increment_id).await? else {
        tracing::warn!(order = %signal.order_increment_id, "Status change for unknown order ignored");
        return Ok(None);
    };

    let mut event = StatusChangeEvent::new(order, status(signal.old_status), status(signal.new_status));
    let report = state.coordinator.react(&mut event).await;
    state.metrics.observe(&report);

    Ok(Some(report))
}
