//! Single-attempt HTTP transport.
//!
//! A [`Transport`] performs exactly one request and reports either the raw
//! body of a 2xx response or a [`TransportFailure`]. Retrying, rate limiting
//! and error translation happen above this layer.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::BoxError;

/// Fully assembled outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Why a single attempt did not yield a successful body.
#[derive(Debug)]
pub enum TransportFailure {
    /// No HTTP response was received.
    NoResponse(BoxError),
    /// TLS negotiation failed before any response.
    SecureChannel(BoxError),
    /// The server answered with a non-success status.
    Status { status: u16, body: String },
}

impl TransportFailure {
    pub fn no_response(source: impl Into<BoxError>) -> Self {
        Self::NoResponse(source.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse(source) => write!(f, "no response: {source}"),
            Self::SecureChannel(source) => write!(f, "secure channel failure: {source}"),
            Self::Status { status, .. } => write!(f, "http status {status}"),
        }
    }
}

/// Performs one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn send(&self, request: HttpRequest) -> Result<String, TransportFailure>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<String, TransportFailure> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub(crate) fn build(user_agent: &str, timeout: Duration) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| crate::RestError::Config(format!("could not build HTTP client: {err}")))?;
        Ok(Self::new(http, timeout))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<String, TransportFailure> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .timeout(self.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_reqwest_error)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportFailure::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportFailure {
    if is_tls_failure(&err) {
        TransportFailure::SecureChannel(Box::new(err))
    } else {
        TransportFailure::NoResponse(Box::new(err))
    }
}

/// Walks the source chain looking for a TLS failure.
///
/// rustls errors reach us wrapped in `std::io::Error`, whose `source()` skips
/// the wrapped error itself, so io errors are unwrapped with `get_ref()`.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    if chain_has_tls_error(err) {
        return true;
    }
    err.is_connect() && chain_mentions_certificate(err)
}

fn chain_has_tls_error(err: &(dyn StdError + 'static)) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if current.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(inner) = current
            .downcast_ref::<std::io::Error>()
            .and_then(std::io::Error::get_ref)
        {
            if chain_has_tls_error(inner) {
                return true;
            }
        }
        source = current.source();
    }
    false
}

/// Fallback for TLS failures that surface only as text.
fn chain_mentions_certificate(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("handshake") {
            return true;
        }
        source = inner.source();
    }
    false
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::{HttpRequest, Transport, TransportFailure};

    /// Scripted transport recording every request it receives.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        responses: Mutex<VecDeque<Result<String, TransportFailure>>>,
        pub(crate) requests: Mutex<Vec<(Instant, HttpRequest)>>,
        latency: Duration,
    }

    impl MockTransport {
        pub(crate) fn new(responses: Vec<Result<String, TransportFailure>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::default(),
                latency: Duration::ZERO,
            }
        }

        /// Makes every request take `latency` before answering.
        pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub(crate) fn hits(&self) -> usize {
            self.requests.lock().expect("requests mutex").len()
        }

        pub(crate) fn request(&self, index: usize) -> HttpRequest {
            self.requests.lock().expect("requests mutex")[index].1.clone()
        }

        pub(crate) fn sent_at(&self, index: usize) -> Instant {
            self.requests.lock().expect("requests mutex")[index].0
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<String, TransportFailure> {
            self.requests
                .lock()
                .expect("requests mutex")
                .push((Instant::now(), request));
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.responses
                .lock()
                .expect("responses mutex")
                .pop_front()
                .unwrap_or_else(|| Err(TransportFailure::status(500, "no scripted response")))
        }
    }
}
