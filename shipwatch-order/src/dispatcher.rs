use shipwatch_core::{CoreError, InlineTranslation, MailTransport, Order, Sender, TemplateOptions};
use std::sync::Arc;

/// Template and sender used for the shipment notification, injected at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub template_id: String,
    pub sender: Sender,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            template_id: "custom_shipment_notification_email_template".to_string(),
            sender: Sender {
                email: "vendor.support@example.com".to_string(),
                name: "Vendor Support".to_string(),
            },
        }
    }
}

/// Inline translation stays suspended for as long as this guard lives.
///
/// `resume` runs on drop, so every exit path out of rendering (including `?`
/// and panics) releases the suspension.
pub struct TranslationSuspension<'a> {
    translation: &'a dyn InlineTranslation,
}

impl<'a> TranslationSuspension<'a> {
    pub fn acquire(translation: &'a dyn InlineTranslation) -> Self {
        translation.suspend();
        Self { translation }
    }
}

impl Drop for TranslationSuspension<'_> {
    fn drop(&mut self) {
        self.translation.resume();
    }
}

/// Composes the shipment notification for an order and hands it to the transport
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    translation: Arc<dyn InlineTranslation>,
    settings: NotificationSettings,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        translation: Arc<dyn InlineTranslation>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            transport,
            translation,
            settings,
        }
    }

    /// Send the shipment notification to the order's customer. Does not retry.
    pub async fn send(&self, order: &Order) -> Result<(), DispatchError> {
        let options = TemplateOptions::frontend(order.store_id);
        let _suspension = TranslationSuspension::acquire(self.translation.as_ref());

        let recipient = validate_recipient(order.customer_email.expose())
            .ok_or_else(|| DispatchError::InvalidRecipient(order.customer_email.hint()))?;

        let vars = serde_json::json!({ "order": order });
        let message = self
            .transport
            .compose(&self.settings.template_id, &options, &vars, &self.settings.sender, recipient)
            .await
            .map_err(|e| DispatchError::from_compose(e, order))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DispatchError::from_send(e, order))?;

        tracing::info!(
            order = %order.increment_id,
            recipient = %order.customer_email.hint(),
            template = %self.settings.template_id,
            "Shipment notification sent"
        );
        Ok(())
    }
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain, no whitespace.
fn validate_recipient(address: &str) -> Option<&str> {
    let address = address.trim();
    if address.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = address.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let dotted = domain
        .split('.')
        .all(|label| !label.is_empty());
    if !dotted || !domain.contains('.') {
        return None;
    }
    Some(address)
}

/// Any failure composing or delivering the notification
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Template resolution failed: {0}")]
    Template(CoreError),

    #[error("Mail transport failed: {0}")]
    Transport(CoreError),
}

impl DispatchError {
    fn from_compose(err: CoreError, order: &Order) -> Self {
        match err {
            CoreError::InvalidAddress(_) => Self::InvalidRecipient(order.customer_email.hint()),
            other => Self::Template(other),
        }
    }

    fn from_send(err: CoreError, order: &Order) -> Self {
        match err {
            CoreError::InvalidAddress(_) => Self::InvalidRecipient(order.customer_email.hint()),
            other => Self::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingTranslation, RecordingMailTransport};

    fn dispatcher(
        transport: Arc<RecordingMailTransport>,
        translation: Arc<CountingTranslation>,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(transport, translation, NotificationSettings::default())
    }

    #[test]
    fn test_validate_recipient() {
        assert_eq!(validate_recipient("jane@example.com"), Some("jane@example.com"));
        assert_eq!(validate_recipient("  jane@example.com "), Some("jane@example.com"));
        assert!(validate_recipient("").is_none());
        assert!(validate_recipient("jane").is_none());
        assert!(validate_recipient("@example.com").is_none());
        assert!(validate_recipient("jane@localhost").is_none());
        assert!(validate_recipient("jane@@example.com").is_none());
        assert!(validate_recipient("jane doe@example.com").is_none());
        assert!(validate_recipient("jane@example..com").is_none());
    }

    #[tokio::test]
    async fn test_send_composes_from_settings() {
        let transport = Arc::new(RecordingMailTransport::new());
        let translation = Arc::new(CountingTranslation::new());
        let order = Order::new("000000010", 2, "jane@example.com");

        dispatcher(transport.clone(), translation.clone()).send(&order).await.unwrap();

        let composed = transport.composed();
        assert_eq!(composed.len(), 1);
        assert_eq!(composed[0].template_id, "custom_shipment_notification_email_template");
        assert_eq!(composed[0].options, TemplateOptions::frontend(2));
        assert_eq!(composed[0].vars["order"]["increment_id"], "000000010");
        assert_eq!(composed[0].from.email, "vendor.support@example.com");
        assert_eq!(composed[0].to, "jane@example.com");

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "jane@example.com");
        assert_eq!(translation.suspended(), 1);
        assert_eq!(translation.resumed(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_still_resumes_translation() {
        let transport = Arc::new(RecordingMailTransport::new());
        transport.fail_sends(1);
        let translation = Arc::new(CountingTranslation::new());
        let order = Order::new("000000011", 1, "jane@example.com");

        let err = dispatcher(transport.clone(), translation.clone())
            .send(&order)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Transport(_)));
        assert!(transport.sent().is_empty());
        assert_eq!(translation.suspended(), 1);
        assert_eq!(translation.resumed(), 1);
    }

    #[tokio::test]
    async fn test_unknown_template_is_template_error() {
        let transport = Arc::new(RecordingMailTransport::new().with_known_templates(&["other_template"]));
        let translation = Arc::new(CountingTranslation::new());
        let order = Order::new("000000012", 1, "jane@example.com");

        let err = dispatcher(transport.clone(), translation.clone())
            .send(&order)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Template(CoreError::Template(_))));
        assert!(transport.sent().is_empty());
        assert_eq!(translation.resumed(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_never_reaches_transport() {
        let transport = Arc::new(RecordingMailTransport::new());
        let translation = Arc::new(CountingTranslation::new());
        let order = Order::new("000000013", 1, "not-an-address");

        let err = dispatcher(transport.clone(), translation.clone())
            .send(&order)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::InvalidRecipient(_)));
        assert!(!err.to_string().contains("not-an-address"));
        assert!(transport.composed().is_empty());
        assert_eq!(translation.suspended(), 1);
        assert_eq!(translation.resumed(), 1);
    }
}
