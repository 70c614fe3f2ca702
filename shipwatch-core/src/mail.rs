use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// Sender identity placed in the `From` header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Sender {
    /// `Name <email>` form accepted by mail builders
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Rendering context for a template: design area and store scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateOptions {
    pub area: String,
    pub store_id: u32,
}

impl TemplateOptions {
    pub const AREA_FRONTEND: &'static str = "frontend";

    pub fn frontend(store_id: u32) -> Self {
        Self {
            area: Self::AREA_FRONTEND.to_string(),
            store_id,
        }
    }
}

/// A fully composed message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub template_id: String,
    pub from: Sender,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Outgoing mail transport.
///
/// `compose` resolves the template and renders it; `send` hands the result to
/// the delivery backend. Either step may fail independently.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn compose(
        &self,
        template_id: &str,
        options: &TemplateOptions,
        vars: &serde_json::Value,
        from: &Sender,
        to: &str,
    ) -> CoreResult<MailMessage>;

    async fn send(&self, message: MailMessage) -> CoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_mailbox() {
        let sender = Sender {
            email: "vendor.support@example.com".to_string(),
            name: "Vendor Support".to_string(),
        };
        assert_eq!(sender.mailbox(), "Vendor Support <vendor.support@example.com>");
    }

    #[test]
    fn test_frontend_options() {
        let options = TemplateOptions::frontend(3);
        assert_eq!(options.area, "frontend");
        assert_eq!(options.store_id, 3);
    }
}
