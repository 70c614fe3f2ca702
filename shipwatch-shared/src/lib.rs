pub mod models;
pub mod pii;

pub use models::events::OrderStatusChangedEvent;
pub use pii::Masked;
