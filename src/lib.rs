//! `restpipe-http` is an async HTTP client for page-numbered REST APIs.
//!
//! Every request goes through the same pipeline:
//! - a per-client rate limiter keeps a minimum idle gap between requests
//! - transient failures (no response, HTTP 503) are retried following a fixed
//!   delay sequence
//! - other failures surface as [`RestError`], with the API's error envelope
//!   parsed into an [`ApiError`] when present
//!
//! [`RestClient::page`] flattens numbered pages into one result list.
//! [`blocking::RestClient`] offers the same operations synchronously.
//!
//! ```no_run
//! use restpipe_http::{ClientConfig, PageSettings, RestClient};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Survey {
//!     id: String,
//!     title: String,
//! }
//!
//! # async fn run() -> restpipe_http::Result<()> {
//! let client = RestClient::new(ClientConfig::default().with_access_token("token"))?;
//! let surveys: Vec<Survey> = client.page(&PageSettings::new(), "/surveys", 100).await?;
//! println!("{} surveys, {} requests", surveys.len(), client.requests_made());
//! # Ok(())
//! # }
//! ```

pub mod blocking;
mod client;
mod error;
mod oauth;
mod options;
mod paging;
mod payload;
mod rate_limit;
mod retry;
pub mod transport;
mod types;
mod value;
mod wire;

pub use client::{RestClient, RestClientBuilder};
pub use error::{BoxError, RestError};
pub use oauth::TokenExchangeSettings;
pub use options::{
    ClientConfig, DEFAULT_API_URL, DEFAULT_RATE_LIMIT_DELAY_MS, DEFAULT_RETRY_SEQUENCE_SECS,
};
pub use payload::{PageSettings, PagingSettings, Payload, RequestSettings};
pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
pub use types::{ApiError, ContentKind, PageResult, INSUFFICIENT_SCOPE_ERROR_ID};
pub use value::Value;

pub type Result<T> = std::result::Result<T, RestError>;
