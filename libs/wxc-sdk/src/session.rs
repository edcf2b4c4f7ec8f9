use std::future::Future;
use std::sync::Arc;

use futures_core::Stream;
use futures_util::StreamExt;
use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wxc_auth::{HttpClientBuilderExt, Integration, TokenManager, Tokens};
use wxc_http::{HttpClient, HttpClientBuilder, HttpClientConfig, HttpResponse};

use crate::config::WebexConfig;
use crate::error::SdkError;
use crate::pagination::{LinkPager, Page, PageRequest, PagesPager, next_link};
use crate::params::QueryParams;

/// Authenticated access to the REST API.
///
/// Cheap to clone; clones share the HTTP client, its concurrency limit and
/// the token manager. Every request first gives the token manager a chance
/// to refresh, then goes out with the current bearer token. `429` answers
/// are retried inside the transport after `Retry-After`.
#[derive(Clone, Debug)]
pub struct RestSession {
    client: HttpClient,
    tokens: Arc<TokenManager>,
    base: String,
    concurrent_requests: usize,
}

impl RestSession {
    #[must_use]
    pub fn builder(config: WebexConfig) -> RestSessionBuilder {
        RestSessionBuilder {
            config,
            tokens: None,
            integration: None,
            http_config: None,
        }
    }

    /// Session for a fixed access token with default settings.
    ///
    /// # Errors
    /// When the HTTP client cannot be built.
    pub fn from_access_token(token: &str) -> Result<Self, SdkError> {
        Self::builder(WebexConfig::default())
            .tokens(Tokens::from_access_token(token))
            .build()
    }

    /// Full URL for an endpoint path below the base URL.
    #[must_use]
    pub fn ep(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{path}", self.base)
        }
    }

    #[must_use]
    pub fn token_manager(&self) -> &TokenManager {
        &self.tokens
    }

    #[must_use]
    pub fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    /// # Errors
    /// [`SdkError::Rest`] on a non-2xx answer, [`SdkError::Http`] on transport
    /// failures and [`SdkError::Validation`] for a body that is not JSON.
    pub async fn get(&self, url: &str, params: Option<&QueryParams>) -> Result<Value, SdkError> {
        self.execute::<Value>(Method::GET, url, params, None).await
    }

    /// # Errors
    /// As [`get`](Self::get).
    pub async fn post(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Value, SdkError> {
        self.execute(Method::POST, url, params, body).await
    }

    /// # Errors
    /// As [`get`](Self::get).
    pub async fn put(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Value, SdkError> {
        self.execute(Method::PUT, url, params, body).await
    }

    /// # Errors
    /// As [`get`](Self::get).
    pub async fn patch(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
    ) -> Result<Value, SdkError> {
        self.execute(Method::PATCH, url, params, body).await
    }

    /// # Errors
    /// As [`get`](Self::get).
    pub async fn delete(
        &self,
        url: &str,
        params: Option<&QueryParams>,
    ) -> Result<Value, SdkError> {
        self.execute::<Value>(Method::DELETE, url, params, None).await
    }

    /// GET and deserialize into `T`.
    ///
    /// # Errors
    /// As [`get`](Self::get); [`SdkError::Validation`] when the body does
    /// not match `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: Option<&QueryParams>,
    ) -> Result<T, SdkError> {
        let value = self.get(url, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// As [`get_json`](Self::get_json).
    pub async fn post_json<T, B>(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: &B,
    ) -> Result<T, SdkError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let value = self.execute(Method::POST, url, params, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// As [`get_json`](Self::get_json).
    pub async fn put_json<T, B>(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: &B,
    ) -> Result<T, SdkError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let value = self.execute(Method::PUT, url, params, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// # Errors
    /// As [`get_json`](Self::get_json).
    pub async fn patch_json<T, B>(
        &self,
        url: &str,
        params: Option<&QueryParams>,
        body: &B,
    ) -> Result<T, SdkError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let value = self.execute(Method::PATCH, url, params, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Lazy stream over every item of a paginated list.
    ///
    /// Items are taken from the array under `item_key`, or from the whole
    /// payload without one. `params` apply to the first request only; the
    /// server encodes them into the `rel="next"` links it returns.
    pub fn follow_pagination<T>(
        &self,
        url: &str,
        params: Option<QueryParams>,
        item_key: Option<&str>,
    ) -> impl Stream<Item = Result<T, SdkError>> + Send + use<T>
    where
        T: DeserializeOwned,
    {
        let session = self.clone();
        let item_key = item_key.map(str::to_owned);
        LinkPager::new(
            PageRequest {
                url: url.to_owned(),
                params,
            },
            move |request| {
                let session = session.clone();
                let item_key = item_key.clone();
                async move { session.fetch_page(request, item_key.as_deref()).await }
            },
        )
    }

    /// Like [`follow_pagination`](Self::follow_pagination) but yields one
    /// `Vec<T>` per page.
    pub fn follow_pagination_pages<T>(
        &self,
        url: &str,
        params: Option<QueryParams>,
        item_key: Option<&str>,
    ) -> impl Stream<Item = Result<Vec<T>, SdkError>> + Send + use<T>
    where
        T: DeserializeOwned,
    {
        let session = self.clone();
        let item_key = item_key.map(str::to_owned);
        PagesPager::new(
            PageRequest {
                url: url.to_owned(),
                params,
            },
            move |request| {
                let session = session.clone();
                let item_key = item_key.clone();
                async move { session.fetch_page(request, item_key.as_deref()).await }
            },
        )
    }

    /// Runs independent calls with at most `concurrent_requests` in flight.
    /// Results come back in input order.
    pub async fn fan_out<I, Fut, T>(&self, calls: I) -> Vec<T>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = T>,
    {
        futures_util::stream::iter(calls)
            .buffered(self.concurrent_requests.max(1))
            .collect()
            .await
    }

    async fn fetch_page(
        &self,
        request: PageRequest,
        item_key: Option<&str>,
    ) -> Result<Page, SdkError> {
        let response = self
            .dispatch::<Value>(Method::GET, &request.url, request.params.as_ref(), None)
            .await?;
        let next = next_link(response.headers(), &request.url);
        let payload = read_json(response).await?;
        let page = Page::from_payload(payload, item_key, next);
        tracing::debug!(
            url = %request.url,
            items = page.items.len(),
            has_next = page.next.is_some(),
            "fetched page"
        );
        Ok(page)
    }

    async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<&B>,
    ) -> Result<Value, SdkError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self.dispatch(method, url, params, body).await?;
        read_json(response).await
    }

    async fn dispatch<B>(
        &self,
        method: Method,
        url: &str,
        params: Option<&QueryParams>,
        body: Option<&B>,
    ) -> Result<HttpResponse, SdkError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.tokens.ensure_fresh().await;

        let mut request = self.client.request(method, url);
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body)?;
        }
        Ok(request.send().await?)
    }
}

/// Body of a 2xx response as JSON; an empty body is `null`.
async fn read_json(response: HttpResponse) -> Result<Value, SdkError> {
    let body = response.checked_bytes().await?;
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Builder for [`RestSession`].
pub struct RestSessionBuilder {
    config: WebexConfig,
    tokens: Option<Tokens>,
    integration: Option<Integration>,
    http_config: Option<HttpClientConfig>,
}

impl RestSessionBuilder {
    /// Tokens to start from. Without them `access_token` from the config is
    /// used.
    #[must_use]
    pub fn tokens(mut self, tokens: Tokens) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Integration used to refresh the tokens before they expire.
    #[must_use]
    pub fn integration(mut self, integration: Integration) -> Self {
        self.integration = Some(integration);
        self
    }

    /// Replaces the transport settings derived from [`WebexConfig`].
    #[must_use]
    pub fn http_config(mut self, http_config: HttpClientConfig) -> Self {
        self.http_config = Some(http_config);
        self
    }

    /// # Errors
    /// [`SdkError::Config`] without any access token, [`SdkError::Http`]
    /// when the HTTP client cannot be built.
    pub fn build(self) -> Result<RestSession, SdkError> {
        let tokens = match (self.tokens, &self.config.access_token) {
            (Some(tokens), _) => tokens,
            (None, Some(token)) => Tokens::from_access_token(token.clone()),
            (None, None) => {
                return Err(SdkError::Config(
                    "no tokens given and no access_token configured".into(),
                ));
            }
        };

        let manager = TokenManager::new(tokens, self.integration);
        let http_config = self
            .http_config
            .unwrap_or_else(|| self.config.http_config());
        let client = HttpClientBuilder::with_config(http_config)
            .with_bearer_auth(manager.shared_token())
            .build()?;

        Ok(RestSession {
            client,
            tokens: Arc::new(manager),
            base: self.config.base_url.as_str().trim_end_matches('/').to_owned(),
            concurrent_requests: self.config.concurrent_requests,
        })
    }
}
