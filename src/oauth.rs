//! OAuth authorization-code exchange.

use reqwest::Method;

use crate::{
    client::decode_json, wire, ContentKind, Payload, RequestSettings, RestClient, RestError,
    Result,
};

const TOKEN_ENDPOINT: &str = "/oauth/token";

/// Form fields posted to the token endpoint.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenExchangeSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub grant_type: Option<String>,
}

impl std::fmt::Debug for TokenExchangeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeSettings")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("code", &self.code.as_ref().map(|_| "<redacted>"))
            .field("redirect_uri", &self.redirect_uri)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

impl TokenExchangeSettings {
    /// Settings for exchanging an authorization code for a long-lived token.
    pub fn authorization_code(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        code: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            code: Some(code.into()),
            redirect_uri: Some(redirect_uri.into()),
            grant_type: Some("authorization_code".to_owned()),
        }
    }
}

impl RequestSettings for TokenExchangeSettings {
    fn to_payload(&self) -> Payload {
        Payload::new()
            .with_opt("client_id", self.client_id.as_deref())
            .with_opt("client_secret", self.client_secret.as_deref())
            .with_opt("code", self.code.as_deref())
            .with_opt("redirect_uri", self.redirect_uri.as_deref())
            .with_opt("grant_type", self.grant_type.as_deref())
    }
}

impl RestClient {
    /// Exchanges an authorization code for a long-lived access token.
    ///
    /// The returned token also replaces the client's bearer token, so later
    /// requests from this client (and its clones) are made on its behalf.
    pub async fn exchange_access_token(&self, settings: &TokenExchangeSettings) -> Result<String> {
        let response = self
            .request(
                TOKEN_ENDPOINT,
                Method::POST,
                &settings.to_payload(),
                ContentKind::Form,
            )
            .await?;
        let token = decode_json::<wire::TokenResponse>(response)?
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                RestError::Decode("token response has no access_token".to_owned())
            })?;

        #[cfg(feature = "tracing")]
        tracing::debug!("access token exchanged");

        self.set_access_token(token.clone());
        Ok(token)
    }
}
