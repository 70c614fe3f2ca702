pub mod order;
pub mod status_log;
pub mod repository;
pub mod mail;
pub mod translation;
pub mod observability;

pub use order::{Order, OrderStatus, Shipment};
pub use status_log::OrderStatusLogEntry;
pub use repository::{OrderRepository, ShipmentFlagStore, StatusLogRepository};
pub use mail::{MailMessage, MailTransport, Sender, TemplateOptions};
pub use translation::InlineTranslation;
pub use observability::{ObservabilitySink, TracingSink};

/// Error returned by every port adapter.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Persistence failed: {0}")]
    Persistence(String),
    #[error("Mail transport failed: {0}")]
    Transport(String),
    #[error("Template could not be resolved: {0}")]
    Template(String),
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
