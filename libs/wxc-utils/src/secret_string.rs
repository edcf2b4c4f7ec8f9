use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A string that never shows up in logs.
///
/// Access tokens, refresh tokens and client secrets are held in this wrapper.
/// `Debug` and `Display` print `[REDACTED]`, and the buffer is wiped on drop.
/// Call [`expose`](Self::expose) only where the raw value must go on the
/// wire (an `Authorization` header or a token-service form body).
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

// Deserialize only: secrets come in from config and token responses but are
// never written back out through serde.
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn formatting_never_leaks_the_value() {
        let s = SecretString::new("NmQ2ZDNjZjgtYWNjZXNz");
        assert_eq!(format!("{s:?}"), "[REDACTED]");
        assert_eq!(format!("{s}"), "[REDACTED]");
        assert!(!format!("{s:#?}").contains("NmQ2"));
    }

    #[test]
    fn expose_returns_raw_value() {
        let s = SecretString::from("bearer-value");
        assert_eq!(s.expose(), "bearer-value");
        assert!(!s.is_empty());
        assert!(SecretString::new("").is_empty());
    }

    #[test]
    fn zeroize_empties_the_buffer() {
        let mut s = SecretString::new("client-secret");
        s.zeroize();
        assert!(s.is_empty());
    }

    #[test]
    fn deserializes_from_json_string() {
        let s: SecretString = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s.expose(), "abc");
    }

    #[test]
    fn equality_compares_contents() {
        assert_eq!(SecretString::new("a"), SecretString::from("a".to_owned()));
        assert_ne!(SecretString::new("a"), SecretString::new("b"));
    }
}
