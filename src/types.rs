use std::fmt;

use crate::wire;

/// Error id the API uses when the token lacks a required scope.
pub const INSUFFICIENT_SCOPE_ERROR_ID: &str = "1014";

const SCOPE_HINT: &str = " Ensure your app has sufficient scopes granted to make this request: \
                          https://developer.example.com/api/v3/#scopes";

/// Structured error parsed from the API's error envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub http_status_code: u16,
    pub id: String,
    pub name: String,
    pub message: String,
    pub docs: String,
}

impl ApiError {
    /// Builds the error from an envelope body; `status` fills in a missing
    /// `http_status_code`.
    pub(crate) fn from_wire(body: wire::ErrorBody, status: u16) -> Self {
        Self {
            http_status_code: body.http_status_code.unwrap_or(status),
            id: body.id,
            name: body.name,
            message: body.message,
            docs: body.docs,
        }
    }

    pub fn is_insufficient_scope(&self) -> bool {
        self.id == INSUFFICIENT_SCOPE_ERROR_ID
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Http status: {}, error code {}. {}: {}. See {} for more information.",
            self.http_status_code, self.id, self.name, self.message, self.docs
        )?;
        if self.is_insufficient_scope() {
            f.write_str(SCOPE_HINT)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// One page of results.
#[derive(Clone, Debug, PartialEq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Whether the server may hold further pages.
    pub has_more: bool,
}

/// Body encoding of an outgoing request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentKind {
    #[default]
    Json,
    Form,
}

impl ContentKind {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Form => "application/x-www-form-urlencoded",
        }
    }
}
