use std::fmt;
use std::time::Duration;

use crate::{RestError, Result};

pub const DEFAULT_API_URL: &str = "https://api.example.com/v3";
pub const DEFAULT_RATE_LIMIT_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_SEQUENCE_SECS: [u64; 4] = [5, 30, 300, 900];

/// Client construction settings.
///
/// Fixed for the lifetime of a client; only the access token can later be
/// replaced through the OAuth token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_url: String,
    /// Sent as the `api_key` query parameter when set.
    pub api_key: Option<String>,
    /// Sent as `Authorization: bearer <token>` when set.
    pub access_token: Option<String>,
    /// Minimum idle time between the end of one request and the start of the
    /// next, in milliseconds. `0` disables the limiter.
    pub rate_limit_delay_ms: u64,
    /// Seconds to wait before each retry of a transient failure. Empty means
    /// a single attempt.
    pub retry_sequence_secs: Vec<u64>,
    /// Per-attempt transport timeout in milliseconds.
    pub timeout_ms: u64,
    /// Upper bound on pages fetched by one pagination run. `None` keeps
    /// fetching until a short page arrives.
    pub max_pages: Option<u32>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            api_key: None,
            access_token: None,
            rate_limit_delay_ms: DEFAULT_RATE_LIMIT_DELAY_MS,
            retry_sequence_secs: DEFAULT_RETRY_SEQUENCE_SECS.to_vec(),
            timeout_ms: 30_000,
            max_pages: None,
            user_agent: format!("restpipe-http/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .field("retry_sequence_secs", &self.retry_sequence_secs)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_pages", &self.max_pages)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn with_retry_sequence_secs(mut self, sequence: impl Into<Vec<u64>>) -> Self {
        self.retry_sequence_secs = sequence.into();
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builds a config from environment variables, starting from defaults.
    ///
    /// Reads:
    /// - `RESTPIPE_API_URL`
    /// - `RESTPIPE_API_KEY`
    /// - `RESTPIPE_ACCESS_TOKEN`
    /// - `RESTPIPE_RATE_LIMIT_DELAY_MS`
    /// - `RESTPIPE_RETRY_SEQUENCE`: comma separated seconds, or `none` to
    ///   disable retries
    /// - `RESTPIPE_TIMEOUT_MS`
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = read("RESTPIPE_API_URL") {
            config.api_url = url;
        }
        config.api_key = read("RESTPIPE_API_KEY");
        config.access_token = read("RESTPIPE_ACCESS_TOKEN");
        if let Some(delay) = read("RESTPIPE_RATE_LIMIT_DELAY_MS") {
            config.rate_limit_delay_ms = parse_number("RESTPIPE_RATE_LIMIT_DELAY_MS", &delay)?;
        }
        if let Some(sequence) = read("RESTPIPE_RETRY_SEQUENCE") {
            config.retry_sequence_secs = parse_sequence(&sequence)?;
        }
        if let Some(timeout) = read("RESTPIPE_TIMEOUT_MS") {
            config.timeout_ms = parse_number("RESTPIPE_TIMEOUT_MS", &timeout)?;
        }
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_url)
            .map_err(|err| RestError::Config(format!("invalid api_url '{}': {err}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RestError::Config(format!(
                "api_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|err| RestError::Config(format!("{name} must be a whole number, got '{value}': {err}")))
}

fn parse_sequence(value: &str) -> Result<Vec<u64>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| parse_number("RESTPIPE_RETRY_SEQUENCE", part.trim()))
        .collect()
}
