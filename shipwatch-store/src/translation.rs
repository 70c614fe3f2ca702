use std::sync::atomic::{AtomicUsize, Ordering};
use shipwatch_core::InlineTranslation;

/// Process-wide inline translation switch.
///
/// Suspensions nest: translation is active again only once every `suspend`
/// has been matched by a `resume`.
#[derive(Debug)]
pub struct InlineTranslationState {
    enabled: bool,
    suspensions: AtomicUsize,
}

impl InlineTranslationState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            suspensions: AtomicUsize::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.suspensions.load(Ordering::SeqCst) == 0
    }
}

impl Default for InlineTranslationState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl InlineTranslation for InlineTranslationState {
    fn suspend(&self) {
        self.suspensions.fetch_add(1, Ordering::SeqCst);
    }

    fn resume(&self) {
        // An unmatched resume must not wrap the counter.
        let _ = self
            .suspensions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}
