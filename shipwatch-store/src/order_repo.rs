use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use shipwatch_core::{CoreError, CoreResult, Order, OrderRepository, OrderStatus, Shipment};
use shipwatch_shared::Masked;

use crate::database::persistence;
use crate::shipment_repo::is_flag_column;

/// Loads orders with their shipments. The notified state is read from the
/// same flag column the [`ShipmentFlagStore`](shipwatch_core::ShipmentFlagStore) writes.
pub struct PgOrderRepository {
    pool: PgPool,
    shipments_sql: String,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool, flag_attribute: &str) -> CoreResult<Self> {
        Ok(Self {
            pool,
            shipments_sql: shipments_query(flag_attribute)?,
        })
    }
}

// Creation order, so the first shipment is notified first
fn shipments_query(flag_attribute: &str) -> CoreResult<String> {
    if !is_flag_column(flag_attribute) {
        return Err(CoreError::Persistence(format!("Unknown shipment attribute: {}", flag_attribute)));
    }
    Ok(format!(
        "SELECT id, order_id, increment_id, {} AS notification_sent, created_at FROM shipments WHERE order_id = $1 ORDER BY created_at, increment_id",
        flag_attribute
    ))
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    increment_id: String,
    store_id: i32,
    customer_email: String,
    customer_name: Option<String>,
    status: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: Uuid,
    order_id: Uuid,
    increment_id: String,
    notification_sent: bool,
    created_at: DateTime<Utc>,
}

impl From<ShipmentRow> for Shipment {
    fn from(row: ShipmentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            increment_id: row.increment_id,
            notification_sent: row.notification_sent,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn find_by_increment_id(&self, increment_id: &str) -> CoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(
            "SELECT id, increment_id, store_id, customer_email, customer_name, status, created_at FROM orders WHERE increment_id = $1",
        )
        .bind(increment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let shipments: Vec<ShipmentRow> = sqlx::query_as(self.shipments_sql.as_str())
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence)?;

        let store_id = u32::try_from(row.store_id)
            .map_err(|_| CoreError::Persistence(format!("Invalid store id {} on order {}", row.store_id, row.increment_id)))?;

        Ok(Some(Order {
            id: row.id,
            increment_id: row.increment_id,
            store_id,
            customer_email: Masked(row.customer_email),
            customer_name: row.customer_name,
            status: row.status.map(OrderStatus::new),
            shipments: shipments.into_iter().map(Shipment::from).collect(),
            created_at: row.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipments_query_reads_configured_flag() {
        let sql = shipments_query("custom_email_sent").unwrap();

        assert!(sql.contains("custom_email_sent AS notification_sent"));
    }

    #[test]
    fn test_shipments_query_rejects_unknown_flag() {
        let err = shipments_query("status").unwrap_err();

        assert!(matches!(err, CoreError::Persistence(_)));
    }
}
