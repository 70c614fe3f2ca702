//! SMTP mail transport using Lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::collections::HashMap;
use std::time::Duration;
use shipwatch_core::{CoreError, CoreResult, MailMessage, MailTransport, Sender, TemplateOptions};

use crate::app_config::SmtpConfig;

/// Subject and HTML body produced by a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub html_body: String,
}

pub type TemplateRenderer = fn(&TemplateOptions, &serde_json::Value) -> CoreResult<RenderedTemplate>;

/// Sends composed messages through an SMTP relay.
///
/// Templates are looked up by identifier in a fixed registry filled at
/// startup; an unknown identifier fails `compose`.
#[derive(Clone)]
pub struct SmtpMailTransport {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    tls: bool,
    timeout: Duration,
    templates: HashMap<String, TemplateRenderer>,
}

impl SmtpMailTransport {
    pub fn new(config: &SmtpConfig) -> Self {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        };

        Self {
            host: config.host.clone(),
            port: config.port,
            credentials,
            tls: config.tls,
            timeout: Duration::from_secs(config.timeout_seconds),
            templates: HashMap::new(),
        }
    }

    /// Register a renderer under a template identifier
    pub fn with_template(mut self, template_id: impl Into<String>, renderer: TemplateRenderer) -> Self {
        self.templates.insert(template_id.into(), renderer);
        self
    }

    /// Builds a fresh transport per message, no connection pooling.
    fn build_transport(&self) -> CoreResult<SmtpTransport> {
        let builder = if self.tls {
            SmtpTransport::relay(&self.host)
                .map_err(|e| CoreError::Transport(format!("SMTP relay error: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.host)
        };

        let mut builder = builder.port(self.port).timeout(Some(self.timeout));
        if let Some(credentials) = &self.credentials {
            builder = builder.credentials(credentials.clone());
        }
        Ok(builder.build())
    }
}

fn parse_mailbox(address: &str) -> CoreResult<Mailbox> {
    address
        .parse()
        .map_err(|e| CoreError::InvalidAddress(format!("{}", e)))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn compose(
        &self,
        template_id: &str,
        options: &TemplateOptions,
        vars: &serde_json::Value,
        from: &Sender,
        to: &str,
    ) -> CoreResult<MailMessage> {
        let renderer = self
            .templates
            .get(template_id)
            .ok_or_else(|| CoreError::Template(format!("Unknown template: {}", template_id)))?;

        parse_mailbox(&from.mailbox())?;
        parse_mailbox(to)?;

        let rendered = renderer(options, vars)?;
        Ok(MailMessage {
            template_id: template_id.to_string(),
            from: from.clone(),
            to: to.to_string(),
            subject: rendered.subject,
            html_body: rendered.html_body,
        })
    }

    async fn send(&self, message: MailMessage) -> CoreResult<()> {
        let email = Message::builder()
            .from(parse_mailbox(&message.from.mailbox())?)
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body)
            .map_err(|e| CoreError::Transport(format!("Failed to build email: {}", e)))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| CoreError::Transport(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("Email task failed: {}", e)))?
        .map(|_| ())
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Built-in layout for the "your order has shipped" mail.
///
/// Expects `vars.order` to be a serialized order.
pub fn render_shipment_notification(
    options: &TemplateOptions,
    vars: &serde_json::Value,
) -> CoreResult<RenderedTemplate> {
    let order = vars
        .get("order")
        .ok_or_else(|| CoreError::Template("Missing template variable: order".to_string()))?;
    let increment_id = order["increment_id"]
        .as_str()
        .ok_or_else(|| CoreError::Template("Order has no increment_id".to_string()))?;

    let increment_id = escape_html(increment_id);
    let greeting = match order["customer_name"].as_str() {
        Some(name) if !name.trim().is_empty() => format!("Hello {},", escape_html(name.trim())),
        _ => "Hello,".to_string(),
    };
    let shipment_count = order["shipments"].as_array().map(Vec::len).unwrap_or(0);
    let store_id = options.store_id;

    let html_body = format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Your order #{increment_id} has shipped</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;" data-store="{store_id}">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">Your order is on its way</h2>
        <p>{greeting}</p>
        <p>Good news: order <strong>#{increment_id}</strong> has shipped ({shipment_count} shipment(s) in total).</p>
        <p style="color: #666; font-size: 14px;">
            You will receive tracking details separately once the carrier picks up your parcel.
        </p>
    </div>
</body>
</html>
        "#
    );

    Ok(RenderedTemplate {
        subject: format!("Your order #{} has shipped", increment_id),
        html_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE_ID: &str = "custom_shipment_notification_email_template";

    fn transport() -> SmtpMailTransport {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            tls: false,
            timeout_seconds: 1,
        };
        SmtpMailTransport::new(&config).with_template(TEMPLATE_ID, render_shipment_notification)
    }

    fn sender() -> Sender {
        Sender {
            email: "vendor.support@example.com".to_string(),
            name: "Vendor Support".to_string(),
        }
    }

    fn vars() -> serde_json::Value {
        serde_json::json!({
            "order": {
                "increment_id": "000000042",
                "customer_name": "Jane <Doe>",
                "shipments": [{}, {}]
            }
        })
    }

    #[tokio::test]
    async fn test_compose_renders_registered_template() {
        let message = transport()
            .compose(TEMPLATE_ID, &TemplateOptions::frontend(1), &vars(), &sender(), "jane@example.com")
            .await
            .unwrap();

        assert_eq!(message.subject, "Your order #000000042 has shipped");
        assert_eq!(message.to, "jane@example.com");
        assert!(message.html_body.contains("Hello Jane &lt;Doe&gt;,"));
        assert!(message.html_body.contains("2 shipment(s)"));
    }

    #[tokio::test]
    async fn test_compose_rejects_unknown_template() {
        let err = transport()
            .compose("missing_template", &TemplateOptions::frontend(1), &vars(), &sender(), "jane@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Template(_)));
    }

    #[tokio::test]
    async fn test_compose_rejects_invalid_recipient() {
        let err = transport()
            .compose(TEMPLATE_ID, &TemplateOptions::frontend(1), &vars(), &sender(), "not an address")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidAddress(_)));
    }

    #[test]
    fn test_render_requires_order() {
        let err = render_shipment_notification(&TemplateOptions::frontend(1), &serde_json::json!({}))
            .unwrap_err();

        assert!(matches!(err, CoreError::Template(_)));
    }
}
