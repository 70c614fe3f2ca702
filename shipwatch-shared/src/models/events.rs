use serde::{Deserialize, Serialize};

/// Signal published by the order platform whenever an order is saved with a
/// status that may differ from the one it was loaded with.
///
/// Either side may be absent: a freshly placed order has no previous status.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderStatusChangedEvent {
    pub order_increment_id: String,
    #[serde(default)]
    pub old_status: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl OrderStatusChangedEvent {
    pub fn new(
        order_increment_id: impl Into<String>,
        old_status: Option<&str>,
        new_status: Option<&str>,
    ) -> Self {
        Self {
            order_increment_id: order_increment_id.into(),
            old_status: old_status.map(str::to_string),
            new_status: new_status.map(str::to_string),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}
