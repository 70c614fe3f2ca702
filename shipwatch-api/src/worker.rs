use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use shipwatch_shared::OrderStatusChangedEvent;
use tracing::{error, info, warn};

use crate::intake::handle_status_change;
use crate::state::AppState;

/// Consume order status signals from Kafka.
///
/// Messages are handled one at a time, in partition order. The platform keys
/// them by order increment id, so every reaction for one order runs in this
/// loop and never concurrently with another for the same order.
pub async fn start_status_change_worker(
    brokers: String,
    group_id: String,
    topic: String,
    state: AppState,
) -> Result<(), KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &brokers)
        .set("group.id", &group_id)
        .set("enable.auto.commit", "true")
        .set("auto.offset.reset", "earliest")
        .create()?;

    consumer.subscribe(&[topic.as_str()])?;

    info!("Status change worker started, listening on {}...", topic);

    loop {
        match consumer.recv().await {
            Err(e) => error!("Kafka error: {}", e),
            Ok(m) => {
                let payload = match m.payload_view::<str>() {
                    Some(Ok(payload)) => payload.to_owned(),
                    Some(Err(e)) => {
                        error!("Error reading payload: {}", e);
                        continue;
                    }
                    None => {
                        warn!("Empty message on {} at offset {}", topic, m.offset());
                        continue;
                    }
                };
                process_payload(&state, &payload).await;
            }
        }
    }
}

/// Decode one message and run the reaction for it. Bad payloads and lookup
/// failures are logged and skipped.
pub async fn process_payload(state: &AppState, payload: &str) {
    let signal: OrderStatusChangedEvent = match serde_json::from_str(payload) {
        Ok(signal) => signal,
        Err(e) => {
            error!("Malformed status change payload: {}", e);
            return;
        }
    };

    if signal.order_increment_id.trim().is_empty() {
        warn!("Status change without order_increment_id ignored");
        return;
    }

    info!("Processing status change for order {}", signal.order_increment_id);
    let increment_id = signal.order_increment_id.clone();
    match handle_status_change(state, signal).await {
        Ok(Some(report)) => info!(
            "Order {} handled: {} ({} shipment notification(s) sent)",
            report.order_increment_id,
            report.outcome.as_str(),
            report.count(shipwatch_order::ShipmentResult::Sent)
        ),
        Ok(None) => {}
        Err(e) => error!("Failed to load order {}: {}", increment_id, e),
    }
}
