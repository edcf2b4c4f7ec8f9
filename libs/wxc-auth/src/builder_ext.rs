use tower::ServiceExt;
use wxc_http::HttpClientBuilder;

use crate::layer::BearerAuthLayer;
use crate::shared::SharedToken;

/// Adds bearer-token injection to [`HttpClientBuilder`].
///
/// ```ignore
/// use wxc_auth::{HttpClientBuilderExt, SharedToken};
///
/// let token = SharedToken::new(Some("...".into()));
/// let client = HttpClientBuilder::new().with_bearer_auth(token).build()?;
/// ```
pub trait HttpClientBuilderExt {
    #[must_use]
    fn with_bearer_auth(self, token: SharedToken) -> Self;
}

impl HttpClientBuilderExt for HttpClientBuilder {
    fn with_bearer_auth(self, token: SharedToken) -> Self {
        let layer = BearerAuthLayer::new(token);
        self.with_auth_layer(move |svc| {
            tower::ServiceBuilder::new()
                .layer(layer)
                .service(svc)
                .boxed_clone()
        })
    }
}
