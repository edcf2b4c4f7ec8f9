use std::sync::Arc;

use arc_swap::ArcSwapOption;
use wxc_utils::SecretString;

use crate::error::TokenError;

/// Lock-free handle to the access token currently in use.
///
/// Clones share the slot. The bearer layer reads it on every attempt;
/// [`TokenManager`](crate::TokenManager) writes it after a refresh.
#[derive(Clone, Default)]
pub struct SharedToken {
    slot: Arc<ArcSwapOption<SecretString>>,
}

impl SharedToken {
    #[must_use]
    pub fn new(token: Option<SecretString>) -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::new(token.map(Arc::new))),
        }
    }

    /// # Errors
    /// [`TokenError::Unavailable`] when no token is published.
    pub fn get(&self) -> Result<Arc<SecretString>, TokenError> {
        self.slot
            .load_full()
            .ok_or_else(|| TokenError::Unavailable("no access token".to_owned()))
    }

    pub fn publish(&self, token: Option<SecretString>) {
        self.slot.store(token.map(Arc::new));
    }
}

impl std::fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedToken")
            .field("present", &self.slot.load().is_some())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clones_see_published_value() {
        let shared = SharedToken::default();
        let reader = shared.clone();
        assert!(matches!(reader.get(), Err(TokenError::Unavailable(_))));

        shared.publish(Some(SecretString::new("t1")));
        assert_eq!(reader.get().unwrap().expose(), "t1");

        shared.publish(None);
        assert!(reader.get().is_err());
    }

    #[test]
    fn debug_hides_token() {
        let shared = SharedToken::new(Some(SecretString::new("t1")));
        assert_eq!(format!("{shared:?}"), "SharedToken { present: true }");
    }
}
