use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use shipwatch_core::{CoreResult, OrderStatus, OrderStatusLogEntry, StatusLogRepository};

use crate::database::persistence;

pub struct PgStatusLogRepository {
    pool: PgPool,
}

impl PgStatusLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct StatusLogRow {
    id: Uuid,
    order_increment_id: String,
    old_status: Option<String>,
    new_status: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StatusLogRow> for OrderStatusLogEntry {
    fn from(row: StatusLogRow) -> Self {
        Self {
            id: row.id,
            order_increment_id: row.order_increment_id,
            old_status: row.old_status.map(OrderStatus::new),
            new_status: row.new_status.map(OrderStatus::new),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl StatusLogRepository for PgStatusLogRepository {
    async fn insert(&self, entry: &OrderStatusLogEntry) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_status_log (id, order_increment_id, old_status, new_status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.order_increment_id)
        .bind(entry.old_status.as_ref().map(OrderStatus::as_str))
        .bind(entry.new_status.as_ref().map(OrderStatus::as_str))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(())
    }

    async fn list_for_order(&self, order_increment_id: &str) -> CoreResult<Vec<OrderStatusLogEntry>> {
        let rows: Vec<StatusLogRow> = sqlx::query_as(
            r#"
            SELECT id, order_increment_id, old_status, new_status, created_at
            FROM order_status_log
            WHERE order_increment_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(order_increment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        Ok(rows.into_iter().map(OrderStatusLogEntry::from).collect())
    }
}
