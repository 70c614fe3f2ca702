//! In-memory port adapters that record every call.
//!
//! Used by this crate's tests and by the host's HTTP tests; also handy for
//! running the reaction without a database or SMTP relay.

use async_trait::async_trait;
use shipwatch_core::{
    CoreError, CoreResult, InlineTranslation, MailMessage, MailTransport, ObservabilitySink,
    Order, OrderRepository, OrderStatusLogEntry, Sender, ShipmentFlagStore, StatusLogRepository,
    TemplateOptions,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct InMemoryStatusLog {
    entries: Mutex<Vec<OrderStatusLogEntry>>,
    fail: AtomicBool,
}

impl InMemoryStatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert fails with a persistence error
    pub fn failing() -> Self {
        let log = Self::default();
        log.fail.store(true, Ordering::SeqCst);
        log
    }

    pub fn entries(&self) -> Vec<OrderStatusLogEntry> {
        lock(&self.entries).clone()
    }
}

#[async_trait]
impl StatusLogRepository for InMemoryStatusLog {
    async fn insert(&self, entry: &OrderStatusLogEntry) -> CoreResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("status log table unavailable".to_string()));
        }
        lock(&self.entries).push(entry.clone());
        Ok(())
    }

    async fn list_for_order(&self, order_increment_id: &str) -> CoreResult<Vec<OrderStatusLogEntry>> {
        let mut entries: Vec<_> = lock(&self.entries)
            .iter()
            .filter(|e| e.order_increment_id == order_increment_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagWrite {
    pub shipment_id: Uuid,
    pub attribute: String,
    pub value: bool,
}

#[derive(Default)]
pub struct InMemoryShipmentFlags {
    calls: Mutex<Vec<FlagWrite>>,
    failing: Mutex<HashSet<Uuid>>,
    fail_all: AtomicBool,
}

impl InMemoryShipmentFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let flags = Self::default();
        flags.fail_all.store(true, Ordering::SeqCst);
        flags
    }

    /// Writes for this shipment fail
    pub fn fail_for(&self, shipment_id: Uuid) {
        lock(&self.failing).insert(shipment_id);
    }

    /// Every attempted write, including failed ones
    pub fn calls(&self) -> Vec<FlagWrite> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, shipment_id: Uuid) -> Vec<FlagWrite> {
        self.calls()
            .into_iter()
            .filter(|c| c.shipment_id == shipment_id)
            .collect()
    }
}

#[async_trait]
impl ShipmentFlagStore for InMemoryShipmentFlags {
    async fn set_flag(&self, shipment_id: Uuid, attribute: &str, value: bool) -> CoreResult<()> {
        lock(&self.calls).push(FlagWrite {
            shipment_id,
            attribute: attribute.to_string(),
            value,
        });

        if self.fail_all.load(Ordering::SeqCst) || lock(&self.failing).contains(&shipment_id) {
            return Err(CoreError::Persistence(format!("could not save {} on shipment", attribute)));
        }
        Ok(())
    }
}

/// Arguments of one `compose` call
#[derive(Debug, Clone)]
pub struct ComposeCall {
    pub template_id: String,
    pub options: TemplateOptions,
    pub vars: serde_json::Value,
    pub from: Sender,
    pub to: String,
}

#[derive(Default)]
pub struct RecordingMailTransport {
    composed: Mutex<Vec<ComposeCall>>,
    sent: Mutex<Vec<MailMessage>>,
    known_templates: Option<HashSet<String>>,
    failing_sends: AtomicUsize,
    send_attempts: AtomicUsize,
    yield_on_send: bool,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `compose` to these template ids; others fail to resolve
    pub fn with_known_templates(mut self, templates: &[&str]) -> Self {
        self.known_templates = Some(templates.iter().map(|t| t.to_string()).collect());
        self
    }

    /// `send` gives up the task once before delivering, like a network round trip
    pub fn with_send_yield(mut self) -> Self {
        self.yield_on_send = true;
        self
    }

    /// The next `count` calls to `send` fail
    pub fn fail_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn composed(&self) -> Vec<ComposeCall> {
        lock(&self.composed).clone()
    }

    /// Messages that were delivered successfully
    pub fn sent(&self) -> Vec<MailMessage> {
        lock(&self.sent).clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.send_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn compose(
        &self,
        template_id: &str,
        options: &TemplateOptions,
        vars: &serde_json::Value,
        from: &Sender,
        to: &str,
    ) -> CoreResult<MailMessage> {
        lock(&self.composed).push(ComposeCall {
            template_id: template_id.to_string(),
            options: options.clone(),
            vars: vars.clone(),
            from: from.clone(),
            to: to.to_string(),
        });

        if let Some(known) = &self.known_templates {
            if !known.contains(template_id) {
                return Err(CoreError::Template(format!("unknown template {}", template_id)));
            }
        }

        let increment_id = vars["order"]["increment_id"].as_str().unwrap_or_default();
        Ok(MailMessage {
            template_id: template_id.to_string(),
            from: from.clone(),
            to: to.to_string(),
            subject: format!("Your order #{} has shipped", increment_id),
            html_body: String::new(),
        })
    }

    async fn send(&self, message: MailMessage) -> CoreResult<()> {
        if self.yield_on_send {
            tokio::task::yield_now().await;
        }
        self.send_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failing_sends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_sends.store(remaining - 1, Ordering::SeqCst);
            return Err(CoreError::Transport("connection refused".to_string()));
        }

        lock(&self.sent).push(message);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CountingTranslation {
    suspended: AtomicUsize,
    resumed: AtomicUsize,
}

impl CountingTranslation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suspended(&self) -> usize {
        self.suspended.load(Ordering::SeqCst)
    }

    pub fn resumed(&self) -> usize {
        self.resumed.load(Ordering::SeqCst)
    }
}

impl InlineTranslation for CountingTranslation {
    fn suspend(&self) {
        self.suspended.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }
}

impl ObservabilitySink for RecordingSink {
    fn error(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        lock(&self.orders).insert(order.increment_id.clone(), order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_increment_id(&self, increment_id: &str) -> CoreResult<Option<Order>> {
        Ok(lock(&self.orders).get(increment_id).cloned())
    }
}

/// Keeps stored shipments in step with flag writes, so a replayed event
/// sees what the previous reaction marked.
#[async_trait]
impl ShipmentFlagStore for InMemoryOrderRepository {
    async fn set_flag(&self, shipment_id: Uuid, _attribute: &str, value: bool) -> CoreResult<()> {
        let mut orders = lock(&self.orders);
        let shipment = orders
            .values_mut()
            .flat_map(|order| order.shipments.iter_mut())
            .find(|shipment| shipment.id == shipment_id)
            .ok_or_else(|| CoreError::Persistence(format!("shipment {} not found", shipment_id)))?;
        shipment.notification_sent = value;
        Ok(())
    }
}
