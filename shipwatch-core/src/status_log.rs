use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::order::OrderStatus;

/// Audit row for one observed order status transition. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatusLogEntry {
    pub id: Uuid,
    pub order_increment_id: String,
    pub old_status: Option<OrderStatus>,
    pub new_status: Option<OrderStatus>,
    pub created_at: DateTime<Utc>,
}

impl OrderStatusLogEntry {
    pub fn new(
        order_increment_id: impl Into<String>,
        old_status: Option<OrderStatus>,
        new_status: Option<OrderStatus>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_increment_id: order_increment_id.into(),
            old_status,
            new_status,
            created_at: Utc::now(),
        }
    }
}
