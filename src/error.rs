use crate::ApiError;

/// Boxed source error carried by transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// TLS negotiation failed; retrying cannot help.
    #[error(
        "TLS error: the secure channel to the API could not be established. The API requires \
         TLS 1.2 or newer; check the platform's TLS configuration and trusted root certificates"
    )]
    SecureChannel {
        #[source]
        source: BoxError,
    },
    /// Non-success status with a parsed API error envelope.
    #[error("{0}")]
    Api(ApiError),
    /// Non-success status whose body is not an API error envelope.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// The client's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RestError {
    /// Returns the HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(error) => Some(error.http_status_code),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the structured API error, if one was parsed.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }
}
