use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context};
use shipwatch_api::{app, state::AppState, worker};
use shipwatch_core::{Sender, TracingSink};
use shipwatch_order::{
    AuditLogger, NotificationDispatcher, NotificationGate, NotificationSettings,
    StatusChangeCoordinator,
};
use shipwatch_store::{
    app_config::Config, mailer::render_shipment_notification, shipment_repo::is_flag_column,
    DbClient, InlineTranslationState, PgOrderRepository, PgShipmentFlagStore,
    PgStatusLogRepository, SmtpMailTransport,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shipwatch_api=debug,shipwatch_order=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Shipwatch on port {}", config.server.port);

    if !is_flag_column(&config.notification.flag_attribute) {
        bail!(
            "Unknown shipment flag attribute: {}",
            config.notification.flag_attribute
        );
    }

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let settings = NotificationSettings {
        template_id: config.notification.template_id.clone(),
        sender: Sender {
            email: config.notification.sender_email.clone(),
            name: config.notification.sender_name.clone(),
        },
    };
    let transport = SmtpMailTransport::new(&config.smtp)
        .with_template(settings.template_id.clone(), render_shipment_notification);

    let status_log = Arc::new(PgStatusLogRepository::new(db.pool.clone()));
    let orders = Arc::new(PgOrderRepository::new(
        db.pool.clone(),
        &config.notification.flag_attribute,
    )?);

    let coordinator = StatusChangeCoordinator::new(
        AuditLogger::new(status_log.clone()),
        NotificationGate::with_attribute(
            Arc::new(PgShipmentFlagStore::new(db.pool.clone())),
            config.notification.flag_attribute.clone(),
        ),
        NotificationDispatcher::new(
            Arc::new(transport),
            Arc::new(InlineTranslationState::default()),
            settings,
        ),
        Arc::new(TracingSink),
    );

    let state = AppState::new(coordinator, orders, status_log)?;

    if config.kafka.enabled {
        let kafka = config.kafka.clone();
        let worker_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = worker::start_status_change_worker(
                kafka.brokers,
                kafka.group_id,
                kafka.topic,
                worker_state,
            )
            .await
            {
                tracing::error!("Status change worker stopped: {}", e);
            }
        });
    } else {
        tracing::info!("Kafka consumer disabled, accepting status changes over HTTP only");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
