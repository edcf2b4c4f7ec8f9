use wxc_auth::{Integration, Tokens};

use crate::api::{DevicesApi, LicensesApi, LocationsApi, PeopleApi};
use crate::config::WebexConfig;
use crate::error::SdkError;
use crate::session::RestSession;

/// Entry point: one [`RestSession`] shared by every endpoint group.
///
/// ```ignore
/// use futures_util::TryStreamExt;
///
/// let api = WebexSimpleApi::from_env()?;
/// let me = api.people.me(false).await?;
/// let locations: Vec<_> = api.locations.list(None, None, None, None).try_collect().await?;
/// ```
#[derive(Clone, Debug)]
pub struct WebexSimpleApi {
    pub session: RestSession,
    pub people: PeopleApi,
    pub locations: LocationsApi,
    pub licenses: LicensesApi,
    pub devices: DevicesApi,
}

impl WebexSimpleApi {
    #[must_use]
    pub fn new(session: RestSession) -> Self {
        Self {
            people: PeopleApi::new(session.clone()),
            locations: LocationsApi::new(session.clone()),
            licenses: LicensesApi::new(session.clone()),
            devices: DevicesApi::new(session.clone()),
            session,
        }
    }

    /// # Errors
    /// When the HTTP client cannot be built.
    pub fn from_tokens(tokens: Tokens) -> Result<Self, SdkError> {
        Self::with_config(WebexConfig::default(), tokens, None)
    }

    /// Tokens that are refreshed through `integration` before they expire.
    ///
    /// # Errors
    /// When the HTTP client cannot be built.
    pub fn with_config(
        config: WebexConfig,
        tokens: Tokens,
        integration: Option<Integration>,
    ) -> Result<Self, SdkError> {
        let mut builder = RestSession::builder(config).tokens(tokens);
        if let Some(integration) = integration {
            builder = builder.integration(integration);
        }
        Ok(Self::new(builder.build()?))
    }

    /// Configuration and access token from `WEBEX_*` environment variables.
    ///
    /// # Errors
    /// [`SdkError::Config`] when the environment is incomplete or malformed.
    pub fn from_env() -> Result<Self, SdkError> {
        let config = WebexConfig::from_env()?;
        Ok(Self::new(RestSession::builder(config).build()?))
    }
}
