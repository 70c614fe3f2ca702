use crate::audit::AuditLogger;
use crate::dispatcher::NotificationDispatcher;
use crate::gate::NotificationGate;
use crate::models::{ReactionReport, ReactionOutcome, ShipmentReport, ShipmentResult, StatusChangeEvent};
use shipwatch_core::ObservabilitySink;
use std::sync::Arc;

/// Reacts to order status changes: audit first, then one notification per
/// unnotified shipment.
///
/// Runs in the caller's task. Shipments are handled one after another in
/// collection order, and one shipment's failure never stops its siblings.
/// Nothing is returned as an error; failures go to the observability sink and
/// are summarised in the [`ReactionReport`].
pub struct StatusChangeCoordinator {
    audit: AuditLogger,
    gate: NotificationGate,
    dispatcher: NotificationDispatcher,
    sink: Arc<dyn ObservabilitySink>,
}

impl StatusChangeCoordinator {
    pub fn new(
        audit: AuditLogger,
        gate: NotificationGate,
        dispatcher: NotificationDispatcher,
        sink: Arc<dyn ObservabilitySink>,
    ) -> Self {
        Self {
            audit,
            gate,
            dispatcher,
            sink,
        }
    }

    /// Entry point registered with the event source.
    ///
    /// The only mutation is the `notification_sent` flag of shipments that
    /// were successfully notified.
    pub async fn react(&self, event: &mut StatusChangeEvent) -> ReactionReport {
        if !event.is_transition() {
            tracing::debug!(order = %event.order_increment_id, "Order status unchanged, nothing to do");
            return ReactionReport::no_change(&event.order_increment_id);
        }

        let audit_recorded = match self
            .audit
            .record(
                &event.order_increment_id,
                event.old_status.as_ref(),
                event.new_status.as_ref(),
            )
            .await
        {
            Ok(_) => true,
            Err(e) => {
                self.sink.error(&e.to_string());
                false
            }
        };

        let mut shipments = Vec::with_capacity(event.order.shipments.len());
        for index in 0..event.order.shipments.len() {
            let result = self.process_shipment(event, index).await;
            shipments.push(ShipmentReport {
                shipment_id: event.order.shipments[index].id,
                result,
            });
        }

        let report = ReactionReport {
            order_increment_id: event.order_increment_id.clone(),
            outcome: ReactionOutcome::Done,
            audit_recorded,
            shipments,
        };

        tracing::info!(
            order = %report.order_increment_id,
            old_status = ?event.old_status,
            new_status = ?event.new_status,
            sent = report.count(ShipmentResult::Sent),
            skipped = report.count(ShipmentResult::Skipped),
            failed = report.count(ShipmentResult::DispatchFailed) + report.count(ShipmentResult::FlagPersistFailed),
            "Order status change handled"
        );
        report
    }

    async fn process_shipment(&self, event: &mut StatusChangeEvent, index: usize) -> ShipmentResult {
        if !self.gate.should_notify(&event.order.shipments[index]) {
            return ShipmentResult::Skipped;
        }

        if let Err(e) = self.dispatcher.send(&event.order).await {
            self.sink.error(&format!(
                "Error sending shipment notification for shipment {} of order {}: {}",
                event.order.shipments[index].increment_id, event.order_increment_id, e
            ));
            return ShipmentResult::DispatchFailed;
        }

        match self.gate.mark_notified(&mut event.order.shipments[index]).await {
            Ok(()) => ShipmentResult::Sent,
            Err(e) => {
                // Mail is out but the gate is still open; a replay sends again.
                self.sink.error(&format!(
                    "Shipment notification sent but not marked for order {}, duplicate possible on replay: {}",
                    event.order_increment_id, e
                ));
                ShipmentResult::FlagPersistFailed
            }
        }
    }
}
