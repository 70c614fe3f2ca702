pub mod app_config;
pub mod database;
pub mod status_log_repo;
pub mod shipment_repo;
pub mod order_repo;
pub mod mailer;
pub mod translation;

pub use database::DbClient;
pub use status_log_repo::PgStatusLogRepository;
pub use shipment_repo::PgShipmentFlagStore;
pub use order_repo::PgOrderRepository;
pub use mailer::SmtpMailTransport;
pub use translation::InlineTranslationState;
