use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use wxc_utils::SecretString;

/// OAuth credential pair with its expiry.
///
/// Deserializes straight from a token-service response. Relative lifetimes
/// (`expires_in`) become absolute timestamps through
/// [`set_expiration`](Self::set_expiration); [`remaining`](Self::remaining)
/// is always computed against the current clock.
///
/// Not `Serialize`; secrets leave only through [`SecretString::expose`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tokens {
    #[serde(default)]
    pub access_token: Option<SecretString>,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    /// Access token lifetime in seconds as issued.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(skip)]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<u64>,
    #[serde(skip)]
    pub refresh_token_expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub token_type: Option<String>,
}

fn seconds_after(now: OffsetDateTime, secs: u64) -> OffsetDateTime {
    now.saturating_add(time::Duration::seconds(
        i64::try_from(secs).unwrap_or(i64::MAX),
    ))
}

impl Tokens {
    /// A personal or bot access token with unknown expiry and no refresh token.
    #[must_use]
    pub fn from_access_token(token: impl Into<SecretString>) -> Self {
        Self {
            access_token: Some(token.into()),
            token_type: Some("Bearer".to_owned()),
            ..Self::default()
        }
    }

    /// Derives `expires_at` and `refresh_token_expires_at` from the relative
    /// lifetimes, counting from now.
    pub fn set_expiration(&mut self) {
        self.set_expiration_from(OffsetDateTime::now_utc());
    }

    pub fn set_expiration_from(&mut self, now: OffsetDateTime) {
        if let Some(secs) = self.expires_in {
            self.expires_at = Some(seconds_after(now, secs));
        }
        if let Some(secs) = self.refresh_token_expires_in {
            self.refresh_token_expires_at = Some(seconds_after(now, secs));
        }
    }

    /// Whole seconds until the access token expires; `0` when the expiry is
    /// unknown. Negative once expired.
    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.remaining_at(OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn remaining_at(&self, now: OffsetDateTime) -> i64 {
        self.expires_at
            .map_or(0, |expires_at| (expires_at - now).whole_seconds())
    }

    /// True when `remaining()` is below `min_lifetime`.
    #[must_use]
    pub fn needs_refresh(&self, min_lifetime: Duration) -> bool {
        self.needs_refresh_at(min_lifetime, OffsetDateTime::now_utc())
    }

    #[must_use]
    pub fn needs_refresh_at(&self, min_lifetime: Duration, now: OffsetDateTime) -> bool {
        let min = i64::try_from(min_lifetime.as_secs()).unwrap_or(i64::MAX);
        self.remaining_at(now) < min
    }

    /// An access token is present and not known to be expired.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.access_token.is_some() && (self.expires_at.is_none() || self.remaining() > 0)
    }

    /// Copies a refresh response over the current values.
    ///
    /// The refresh token and its expiry are replaced only when the response
    /// carried a new one.
    pub fn update(&mut self, new: Tokens) {
        self.access_token = new.access_token;
        self.expires_in = new.expires_in;
        self.expires_at = new.expires_at;
        if new.refresh_token.is_some() {
            self.refresh_token = new.refresh_token;
            self.refresh_token_expires_in = new.refresh_token_expires_in;
            self.refresh_token_expires_at = new.refresh_token_expires_at;
        }
        if new.token_type.is_some() {
            self.token_type = new.token_type;
        }
    }

    /// Marks the tokens as unauthenticated.
    pub fn clear_access_token(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use time::macros::datetime;

    const WIRE: &str = r#"{
        "access_token": "ZDI3MGEyYzQtNmFl",
        "expires_in": 1209599,
        "refresh_token": "MDEyMzQ1Njc4OTAx",
        "refresh_token_expires_in": 7775999,
        "token_type": "Bearer",
        "scope": "spark:kms"
    }"#;

    #[test]
    fn deserializes_token_service_response() {
        let t: Tokens = serde_json::from_str(WIRE).unwrap();
        assert_eq!(t.access_token.as_ref().unwrap().expose(), "ZDI3MGEyYzQtNmFl");
        assert_eq!(t.refresh_token.as_ref().unwrap().expose(), "MDEyMzQ1Njc4OTAx");
        assert_eq!(t.expires_in, Some(1_209_599));
        assert_eq!(t.refresh_token_expires_in, Some(7_775_999));
        assert!(t.expires_at.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let t: Tokens = serde_json::from_str(WIRE).unwrap();
        let dbg = format!("{t:?}");
        assert!(!dbg.contains("ZDI3MGEyYzQtNmFl"));
        assert!(!dbg.contains("MDEyMzQ1Njc4OTAx"));
    }

    #[test]
    fn remaining_is_relative_to_now() {
        let now = datetime!(2026-01-01 00:00 UTC);
        let mut t = Tokens {
            expires_in: Some(600),
            refresh_token_expires_in: Some(3600),
            ..Tokens::default()
        };
        t.set_expiration_from(now);
        assert_eq!(t.expires_at, Some(datetime!(2026-01-01 00:10 UTC)));
        assert_eq!(t.refresh_token_expires_at, Some(datetime!(2026-01-01 01:00 UTC)));
        assert_eq!(t.remaining_at(now), 600);
        assert_eq!(t.remaining_at(datetime!(2026-01-01 00:09 UTC)), 60);
        assert_eq!(t.remaining_at(datetime!(2026-01-01 00:11 UTC)), -60);
    }

    #[test]
    fn refresh_threshold_is_exclusive() {
        let now = datetime!(2026-01-01 00:00 UTC);
        let min_lifetime = Duration::from_secs(300);
        let mut t = Tokens {
            expires_in: Some(300),
            ..Tokens::default()
        };
        t.set_expiration_from(now);
        assert_eq!(t.remaining_at(now), 300);
        assert!(!t.needs_refresh_at(min_lifetime, now));

        t.expires_in = Some(299);
        t.set_expiration_from(now);
        assert_eq!(t.remaining_at(now), 299);
        assert!(t.needs_refresh_at(min_lifetime, now));
    }

    #[test]
    fn remaining_is_recomputed_on_every_call() {
        let mut t = Tokens {
            expires_in: Some(2),
            ..Tokens::default()
        };
        t.set_expiration();
        let first = t.remaining();
        std::thread::sleep(Duration::from_millis(1100));
        assert!(t.remaining() < first);
    }

    #[test]
    fn unknown_expiry_has_zero_remaining() {
        let t = Tokens::from_access_token("personal");
        assert_eq!(t.remaining(), 0);
        assert!(t.is_valid());
        assert!(t.needs_refresh(Duration::from_secs(300)));
    }

    #[test]
    fn expired_token_is_invalid() {
        let t = Tokens {
            access_token: Some(SecretString::new("a")),
            expires_at: Some(OffsetDateTime::now_utc() - time::Duration::minutes(1)),
            ..Tokens::default()
        };
        assert!(!t.is_valid());
    }

    #[test]
    fn update_keeps_refresh_token_when_absent() {
        let mut t: Tokens = serde_json::from_str(WIRE).unwrap();
        let new = Tokens {
            access_token: Some(SecretString::new("new-access")),
            expires_in: Some(100),
            ..Tokens::default()
        };
        t.update(new);
        assert_eq!(t.access_token.as_ref().unwrap().expose(), "new-access");
        assert_eq!(t.expires_in, Some(100));
        assert_eq!(t.refresh_token.as_ref().unwrap().expose(), "MDEyMzQ1Njc4OTAx");
        assert_eq!(t.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn update_replaces_rotated_refresh_token() {
        let mut t: Tokens = serde_json::from_str(WIRE).unwrap();
        t.update(Tokens {
            access_token: Some(SecretString::new("a2")),
            refresh_token: Some(SecretString::new("r2")),
            ..Tokens::default()
        });
        assert_eq!(t.refresh_token.as_ref().unwrap().expose(), "r2");
    }

    #[test]
    fn clear_access_token_keeps_refresh_token() {
        let mut t: Tokens = serde_json::from_str(WIRE).unwrap();
        t.set_expiration();
        t.clear_access_token();
        assert!(t.access_token.is_none());
        assert!(t.expires_at.is_none());
        assert!(t.refresh_token.is_some());
        assert!(!t.is_valid());
    }
}
