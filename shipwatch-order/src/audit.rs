use shipwatch_core::{CoreError, OrderStatus, OrderStatusLogEntry, StatusLogRepository};
use std::sync::Arc;

/// Writes one audit row per observed status transition
pub struct AuditLogger {
    repository: Arc<dyn StatusLogRepository>,
}

impl AuditLogger {
    pub fn new(repository: Arc<dyn StatusLogRepository>) -> Self {
        Self { repository }
    }

    /// Persist a transition stamped with the current UTC time.
    ///
    /// No retry: the transition already happened upstream, the caller decides
    /// what to do with a failed write.
    pub async fn record(
        &self,
        order_increment_id: &str,
        old_status: Option<&OrderStatus>,
        new_status: Option<&OrderStatus>,
    ) -> Result<OrderStatusLogEntry, AuditWriteError> {
        let entry = OrderStatusLogEntry::new(
            order_increment_id,
            old_status.cloned(),
            new_status.cloned(),
        );

        self.repository
            .insert(&entry)
            .await
            .map_err(|source| AuditWriteError {
                order_increment_id: order_increment_id.to_string(),
                source,
            })?;

        tracing::debug!(
            order = %order_increment_id,
            old_status = ?entry.old_status,
            new_status = ?entry.new_status,
            "Order status change logged"
        );
        Ok(entry)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Error logging order status change for order {order_increment_id}: {source}")]
pub struct AuditWriteError {
    pub order_increment_id: String,
    #[source]
    pub source: CoreError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStatusLog;

    #[tokio::test]
    async fn test_record_persists_entry() {
        let log = Arc::new(InMemoryStatusLog::new());
        let logger = AuditLogger::new(log.clone());

        let entry = logger
            .record("000000001", Some(&OrderStatus::pending()), Some(&OrderStatus::processing()))
            .await
            .unwrap();

        let stored = log.entries();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], entry);
        assert_eq!(stored[0].old_status, Some(OrderStatus::pending()));
        assert_eq!(stored[0].new_status, Some(OrderStatus::processing()));
    }

    #[tokio::test]
    async fn test_record_keeps_unset_old_status() {
        let log = Arc::new(InMemoryStatusLog::new());
        let logger = AuditLogger::new(log.clone());

        logger.record("000000003", None, Some(&OrderStatus::pending())).await.unwrap();

        assert_eq!(log.entries()[0].old_status, None);
    }

    #[tokio::test]
    async fn test_record_surfaces_write_failure() {
        let log = Arc::new(InMemoryStatusLog::failing());
        let logger = AuditLogger::new(log.clone());

        let err = logger
            .record("000000001", None, Some(&OrderStatus::pending()))
            .await
            .unwrap_err();

        assert_eq!(err.order_increment_id, "000000001");
        assert!(err.to_string().starts_with("Error logging order status change"));
        assert!(log.entries().is_empty());
    }
}
