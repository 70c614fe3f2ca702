/// Operator-facing error sink. Fire-and-forget.
pub trait ObservabilitySink: Send + Sync {
    fn error(&self, message: &str);
}

/// Forwards to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ObservabilitySink for TracingSink {
    fn error(&self, message: &str) {
        tracing::error!(target: "shipwatch::reaction", "{}", message);
    }
}
