use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use crate::{
    rate_limit::RateLimiter,
    retry::RetryPolicy,
    transport::{HttpRequest, ReqwestTransport, Transport, TransportFailure},
    ClientConfig, ContentKind, Payload, RequestSettings, RestError, Result,
};

/// Joins the base URL and an endpoint path with exactly one slash between them.
pub(crate) fn endpoint_url(api_url: &str, endpoint: &str) -> String {
    let base = api_url.trim_end_matches('/');
    if endpoint.is_empty() {
        return base.to_owned();
    }
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

/// HTTP client for the REST API.
///
/// Clones share configuration, transport, rate-limit marker, request counter,
/// access token and cancellation token.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    access_token: RwLock<Option<String>>,
    requests_made: AtomicU64,
    cancel: CancellationToken,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.inner.config)
            .field("transport", &self.inner.transport)
            .field("requests_made", &self.requests_made())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RestClient`].
#[derive(Debug, Default)]
pub struct RestClientBuilder {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    cancel: Option<CancellationToken>,
}

impl RestClientBuilder {
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default `reqwest` transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Token whose cancellation aborts in-flight requests, rate-limit waits
    /// and retry sleeps.
    #[must_use]
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Result<RestClient> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::build(
                &self.config.user_agent,
                self.config.timeout(),
            )?),
        };

        Ok(RestClient {
            inner: Arc::new(Inner {
                limiter: RateLimiter::new(self.config.rate_limit_delay()),
                retry: RetryPolicy::from_secs(&self.config.retry_sequence_secs),
                access_token: RwLock::new(self.config.access_token.clone()),
                requests_made: AtomicU64::new(0),
                cancel: self.cancel.unwrap_or_default(),
                transport,
                config: self.config,
            }),
        })
    }
}

impl RestClient {
    /// Creates a client with the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Creates a client from `RESTPIPE_*` environment variables.
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Number of attempts that reached the transport, retries included.
    pub fn requests_made(&self) -> u64 {
        self.inner.requests_made.load(Ordering::SeqCst)
    }

    /// Current bearer token, including one obtained through token exchange.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_access_token(&self, token: String) {
        *self
            .inner
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Token that cancels this client's in-flight work when triggered.
    ///
    /// Cancellation is permanent: every later call on this client and its
    /// clones fails with [`RestError::Cancelled`]. Use
    /// [`RestClient::request_with_cancel`] to abort a single call.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Sends a GET and deserializes the response object into `T`.
    pub async fn get<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.send(Method::GET, endpoint, settings).await
    }

    /// Sends a JSON POST and deserializes the response object into `T`.
    pub async fn post<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.send(Method::POST, endpoint, settings).await
    }

    /// Sends a JSON PUT and deserializes the response object into `T`.
    pub async fn put<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.send(Method::PUT, endpoint, settings).await
    }

    /// Sends a JSON PATCH and deserializes the response object into `T`.
    pub async fn patch<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.send(Method::PATCH, endpoint, settings).await
    }

    /// Sends a JSON DELETE and deserializes the response object into `T`.
    pub async fn delete<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.send(Method::DELETE, endpoint, settings).await
    }

    async fn send<T, S>(&self, method: Method, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        let value = self
            .request(endpoint, method, &settings.to_payload(), ContentKind::Json)
            .await?;
        decode_json(value)
    }

    /// Executes one logical request and returns the parsed response object.
    ///
    /// GET requests carry the payload as query parameters; other verbs send it
    /// as a JSON object or a form-encoded body depending on `kind`. Transient
    /// failures are retried following the configured retry sequence.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        payload: &Payload,
        kind: ContentKind,
    ) -> Result<JsonValue> {
        let request = self.build_request(endpoint, method, payload, kind)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let inner = &self.inner;
        let body = inner
            .retry
            .execute(&inner.cancel, || self.attempt(request.clone()))
            .await?;

        parse_object(&body)
    }

    /// [`RestClient::request`] that can also be aborted through `cancel`.
    ///
    /// Cancelling `cancel` fails only this call with [`RestError::Cancelled`];
    /// the client and its clones stay usable. The client-wide token from
    /// [`RestClient::cancellation_token`] still applies.
    pub async fn request_with_cancel(
        &self,
        endpoint: &str,
        method: Method,
        payload: &Payload,
        kind: ContentKind,
        cancel: &CancellationToken,
    ) -> Result<JsonValue> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RestError::Cancelled),
            result = self.request(endpoint, method, payload, kind) => result,
        }
    }

    /// One rate-limited transport attempt.
    async fn attempt(
        &self,
        request: HttpRequest,
    ) -> Result<std::result::Result<String, TransportFailure>> {
        let inner = &self.inner;
        inner.limiter.throttle(&inner.cancel).await?;
        inner.requests_made.fetch_add(1, Ordering::SeqCst);
        let result = inner.transport.send(request).await;
        inner.limiter.mark_complete();
        Ok(result)
    }

    fn build_request(
        &self,
        endpoint: &str,
        method: Method,
        payload: &Payload,
        kind: ContentKind,
    ) -> Result<HttpRequest> {
        let config = &self.inner.config;

        let mut headers = vec![("Content-Type".to_owned(), kind.content_type().to_owned())];
        if let Some(token) = self.access_token().filter(|token| !token.is_empty()) {
            headers.push(("Authorization".to_owned(), format!("bearer {token}")));
        }

        let mut query = Vec::new();
        if let Some(api_key) = config.api_key.as_deref().filter(|key| !key.is_empty()) {
            query.push(("api_key".to_owned(), api_key.to_owned()));
        }

        let body = if method == Method::GET {
            query.extend(payload.to_pairs());
            None
        } else {
            match kind {
                ContentKind::Json => Some(serde_json::to_string(payload).map_err(|err| {
                    RestError::Decode(format!("could not encode request payload: {err}"))
                })?),
                ContentKind::Form => Some(payload.to_form_body()),
            }
        };

        Ok(HttpRequest {
            method,
            url: endpoint_url(&config.api_url, endpoint),
            headers,
            query,
            body,
        })
    }
}

/// Parses a response body into a JSON object; an empty body is `{}`.
pub(crate) fn parse_object(body: &str) -> Result<JsonValue> {
    if body.trim().is_empty() {
        return Ok(JsonValue::Object(serde_json::Map::new()));
    }
    let value: JsonValue = serde_json::from_str(body)
        .map_err(|err| RestError::Decode(format!("invalid response JSON: {err}; body: {body}")))?;
    if !value.is_object() {
        return Err(RestError::Decode(format!(
            "expected a JSON object response, got: {body}"
        )));
    }
    Ok(value)
}

pub(crate) fn decode_json<T: DeserializeOwned>(value: JsonValue) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|err| RestError::Decode(format!("response did not match expected shape: {err}")))
}
