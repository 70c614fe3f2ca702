use shipwatch_core::{CoreError, Shipment, ShipmentFlagStore};
use std::sync::Arc;
use uuid::Uuid;

/// Attribute used when none is configured
pub const DEFAULT_FLAG_ATTRIBUTE: &str = "custom_email_sent";

/// Per-shipment at-most-once gate for the shipment notification.
///
/// Check and mark are two separate calls with no locking in between; callers
/// must not run two reactions for the same shipment concurrently.
pub struct NotificationGate {
    flags: Arc<dyn ShipmentFlagStore>,
    attribute: String,
}

impl NotificationGate {
    pub fn new(flags: Arc<dyn ShipmentFlagStore>) -> Self {
        Self::with_attribute(flags, DEFAULT_FLAG_ATTRIBUTE)
    }

    pub fn with_attribute(flags: Arc<dyn ShipmentFlagStore>, attribute: impl Into<String>) -> Self {
        Self {
            flags,
            attribute: attribute.into(),
        }
    }

    /// True iff the shipment has not been notified yet
    pub fn should_notify(&self, shipment: &Shipment) -> bool {
        !shipment.notification_sent
    }

    /// Durably mark the shipment notified. Only call after a confirmed send.
    ///
    /// The in-memory flag flips only once the write succeeded, and is never
    /// set back to false here.
    pub async fn mark_notified(&self, shipment: &mut Shipment) -> Result<(), FlagPersistError> {
        self.flags
            .set_flag(shipment.id, &self.attribute, true)
            .await
            .map_err(|source| FlagPersistError {
                shipment_id: shipment.id,
                source,
            })?;

        shipment.notification_sent = true;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Notification flag not persisted for shipment {shipment_id}: {source}")]
pub struct FlagPersistError {
    pub shipment_id: Uuid,
    #[source]
    pub source: CoreError,
}
