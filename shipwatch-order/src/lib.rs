pub mod models;
pub mod audit;
pub mod gate;
pub mod dispatcher;
pub mod coordinator;
pub mod testing;

pub use models::{ReactionOutcome, ReactionReport, ShipmentReport, ShipmentResult, StatusChangeEvent};
pub use audit::{AuditLogger, AuditWriteError};
pub use gate::{FlagPersistError, NotificationGate};
pub use dispatcher::{DispatchError, NotificationDispatcher, NotificationSettings};
pub use coordinator::StatusChangeCoordinator;
