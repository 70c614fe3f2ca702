use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for customer contact data (email addresses, phone numbers).
///
/// `Debug` and `Display` never print the value, so an order can be dumped
/// with `tracing::debug!(?order)` without leaking the customer's address.
/// Serialization writes the real value because the mail transport and the
/// database need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Masked(value)
    }
}

impl Masked<String> {
    /// Partially redacted form for log lines: `j***@example.com`.
    pub fn hint(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().map(String::from).unwrap_or_default();
                format!("{}***@{}", first, domain)
            }
            None => "********".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let email = Masked("jane@example.com".to_string());
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(email.to_string(), "********");
    }

    #[test]
    fn test_serialize_writes_real_value() {
        let email = Masked("jane@example.com".to_string());
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"jane@example.com\"");
    }

    #[test]
    fn test_hint_keeps_domain() {
        assert_eq!(Masked("jane@example.com".to_string()).hint(), "j***@example.com");
        assert_eq!(Masked("not-an-address".to_string()).hint(), "********");
    }
}
