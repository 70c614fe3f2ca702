use async_trait::async_trait;
use uuid::Uuid;

use crate::order::Order;
use crate::status_log::OrderStatusLogEntry;
use crate::CoreResult;

/// Append-only storage for status transition audit rows
#[async_trait]
pub trait StatusLogRepository: Send + Sync {
    async fn insert(&self, entry: &OrderStatusLogEntry) -> CoreResult<()>;

    /// Entries for one order, newest first
    async fn list_for_order(&self, order_increment_id: &str) -> CoreResult<Vec<OrderStatusLogEntry>>;
}

/// Writes a single shipment attribute without rewriting the whole record.
#[async_trait]
pub trait ShipmentFlagStore: Send + Sync {
    async fn set_flag(&self, shipment_id: Uuid, attribute: &str, value: bool) -> CoreResult<()>;
}

/// Loads the order aggregate an incoming status signal refers to
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_increment_id(&self, increment_id: &str) -> CoreResult<Option<Order>>;
}
