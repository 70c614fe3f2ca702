use serde::{Deserialize, Serialize};
use uuid::Uuid;
use shipwatch_core::{Order, OrderStatus};

/// One order-status-changed signal, bound to the order it refers to.
///
/// Built by the event source right before the reaction and consumed by it.
#[derive(Debug, Clone)]
pub struct StatusChangeEvent {
    pub order_increment_id: String,
    pub old_status: Option<OrderStatus>,
    pub new_status: Option<OrderStatus>,
    pub order: Order,
}

impl StatusChangeEvent {
    pub fn new(order: Order, old_status: Option<OrderStatus>, new_status: Option<OrderStatus>) -> Self {
        Self {
            order_increment_id: order.increment_id.clone(),
            old_status,
            new_status,
            order,
        }
    }

    /// True when the two observations differ. Two unset statuses are equal.
    pub fn is_transition(&self) -> bool {
        self.old_status != self.new_status
    }
}

/// Terminal state of one reaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionOutcome {
    NoChange,
    Done,
}

impl ReactionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionOutcome::NoChange => "no_change",
            ReactionOutcome::Done => "done",
        }
    }
}

/// What happened to a single shipment during a reaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentResult {
    /// Flag was already set; nothing sent.
    Skipped,
    Sent,
    /// Mail could not be composed or delivered; flag left unset.
    DispatchFailed,
    /// Mail went out but the flag write failed. A replay will send again.
    FlagPersistFailed,
}

impl ShipmentResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentResult::Skipped => "skipped",
            ShipmentResult::Sent => "sent",
            ShipmentResult::DispatchFailed => "dispatch_failed",
            ShipmentResult::FlagPersistFailed => "flag_persist_failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipmentReport {
    pub shipment_id: Uuid,
    pub result: ShipmentResult,
}

/// Summary of one reaction, for the host's metrics and responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionReport {
    pub order_increment_id: String,
    pub outcome: ReactionOutcome,
    pub audit_recorded: bool,
    pub shipments: Vec<ShipmentReport>,
}

impl ReactionReport {
    pub fn no_change(order_increment_id: impl Into<String>) -> Self {
        Self {
            order_increment_id: order_increment_id.into(),
            outcome: ReactionOutcome::NoChange,
            audit_recorded: false,
            shipments: Vec::new(),
        }
    }

    /// Number of shipments that ended with the given result
    pub fn count(&self, result: ShipmentResult) -> usize {
        self.shipments.iter().filter(|s| s.result == result).count()
    }
}
