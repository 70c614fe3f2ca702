use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use shipwatch_shared::Masked;
use std::fmt;

/// Order status as reported by the order platform.
///
/// The platform lets merchants define their own statuses, so this is an open
/// string value rather than a closed enum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn pending() -> Self {
        Self::new("pending")
    }

    pub fn processing() -> Self {
        Self::new("processing")
    }

    pub fn complete() -> Self {
        Self::new("complete")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}

/// Order aggregate as seen by the status-change reaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-facing order number, e.g. `000000123`.
    pub increment_id: String,
    pub store_id: u32,
    pub customer_email: Masked<String>,
    pub customer_name: Option<String>,
    pub status: Option<OrderStatus>,
    pub shipments: Vec<Shipment>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(increment_id: impl Into<String>, store_id: u32, customer_email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            increment_id: increment_id.into(),
            store_id,
            customer_email: Masked(customer_email.into()),
            customer_name: None,
            status: None,
            shipments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach a shipment to the order
    pub fn add_shipment(&mut self, shipment: Shipment) {
        self.shipments.push(shipment);
    }
}

/// A shipment belonging to an order.
///
/// `notification_sent` is the only attribute the reaction engine writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shipment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub increment_id: String,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(order_id: Uuid, increment_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            increment_id: increment_id.into(),
            notification_sent: false,
            created_at: Utc::now(),
        }
    }

    pub fn already_notified(mut self) -> Self {
        self.notification_sent = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_plain_string() {
        let status = OrderStatus::processing();
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"processing\"");

        let parsed: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(parsed, OrderStatus::new("shipped"));
    }

    #[test]
    fn test_new_shipment_is_not_notified() {
        let order = Order::new("000000001", 1, "customer@example.com");
        let shipment = Shipment::new(order.id, "000000001-1");

        assert!(!shipment.notification_sent);
        assert!(shipment.clone().already_notified().notification_sent);
    }

    #[test]
    fn test_order_debug_masks_customer_email() {
        let order = Order::new("000000001", 1, "customer@example.com");
        let dump = format!("{:?}", order);

        assert!(!dump.contains("customer@example.com"));
    }
}
