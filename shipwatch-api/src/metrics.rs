use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use shipwatch_order::{ReactionOutcome, ReactionReport};

use crate::state::AppState;

/// Reaction counters exposed at `/metrics`.
///
/// `notifications_total{result="flag_persist_failed"}` counts mails that went
/// out without the shipment being marked; any non-zero value means a replay
/// may notify those customers twice.
pub struct Metrics {
    registry: Registry,
    pub status_changes: IntCounterVec,
    pub audit_write_failures: IntCounter,
    pub notifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let status_changes = IntCounterVec::new(
            Opts::new("status_changes_total", "Order status change signals handled"),
            &["outcome"],
        )?;
        registry.register(Box::new(status_changes.clone()))?;

        let audit_write_failures = IntCounter::new(
            "audit_write_failures_total",
            "Status transitions that could not be written to the audit log",
        )?;
        registry.register(Box::new(audit_write_failures.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Shipment notification decisions"),
            &["result"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        Ok(Self {
            registry,
            status_changes,
            audit_write_failures,
            notifications,
        })
    }

    pub fn observe(&self, report: &ReactionReport) {
        self.status_changes
            .with_label_values(&[report.outcome.as_str()])
            .inc();

        if report.outcome == ReactionOutcome::Done && !report.audit_recorded {
            self.audit_write_failures.inc();
        }

        for shipment in &report.shipments {
            self.notifications
                .with_label_values(&[shipment.result.as_str()])
                .inc();
        }
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwatch_order::{ShipmentReport, ShipmentResult};
    use uuid::Uuid;

    #[test]
    fn test_observe_counts_by_result() {
        let metrics = Metrics::new().unwrap();
        let report = ReactionReport {
            order_increment_id: "000000001".to_string(),
            outcome: ReactionOutcome::Done,
            audit_recorded: false,
            shipments: vec![
                ShipmentReport { shipment_id: Uuid::new_v4(), result: ShipmentResult::Sent },
                ShipmentReport { shipment_id: Uuid::new_v4(), result: ShipmentResult::FlagPersistFailed },
                ShipmentReport { shipment_id: Uuid::new_v4(), result: ShipmentResult::Sent },
            ],
        };

        metrics.observe(&report);

        assert_eq!(metrics.status_changes.with_label_values(&["done"]).get(), 1);
        assert_eq!(metrics.audit_write_failures.get(), 1);
        assert_eq!(metrics.notifications.with_label_values(&["sent"]).get(), 2);
        assert_eq!(metrics.notifications.with_label_values(&["flag_persist_failed"]).get(), 1);
    }

    #[test]
    fn test_no_change_is_not_an_audit_failure() {
        let metrics = Metrics::new().unwrap();

        metrics.observe(&ReactionReport::no_change("000000002"));

        assert_eq!(metrics.status_changes.with_label_values(&["no_change"]).get(), 1);
        assert_eq!(metrics.audit_write_failures.get(), 0);
        assert!(metrics.render().unwrap().contains("status_changes_total"));
    }
}
