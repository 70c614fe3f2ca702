/// Inline translation state of the storefront.
///
/// Inline translation decorates rendered strings with editor markup, which
/// must not end up in outgoing mail. Callers suspend it around rendering and
/// resume it afterwards.
pub trait InlineTranslation: Send + Sync {
    fn suspend(&self);
    fn resume(&self);
}
