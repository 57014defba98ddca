//! Blocking entry point.
//!
//! [`RestClient`] drives the async client on a private current-thread tokio
//! runtime. It shares configuration, request counter, rate-limit marker and
//! access token with the async client it wraps, so both entry points can be
//! used against the same API budget.
//!
//! Calling these methods from inside an async runtime panics, as with any
//! nested `block_on`.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::runtime::{Builder, Runtime};

use crate::{
    ClientConfig, ContentKind, PageResult, PagingSettings, Payload, RequestSettings, RestError,
    Result, TokenExchangeSettings,
};

/// Synchronous counterpart of [`crate::RestClient`].
#[derive(Clone, Debug)]
pub struct RestClient {
    client: crate::RestClient,
    runtime: Arc<Runtime>,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::from_async(crate::RestClient::new(config)?)
    }

    /// Wraps an existing async client; both share all client state.
    pub fn from_async(client: crate::RestClient) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| RestError::Config(format!("could not start runtime: {err}")))?;
        Ok(Self {
            client,
            runtime: Arc::new(runtime),
        })
    }

    pub fn as_async(&self) -> &crate::RestClient {
        &self.client
    }

    pub fn requests_made(&self) -> u64 {
        self.client.requests_made()
    }

    pub fn access_token(&self) -> Option<String> {
        self.client.access_token()
    }

    pub fn request(
        &self,
        endpoint: &str,
        method: Method,
        payload: &Payload,
        kind: ContentKind,
    ) -> Result<JsonValue> {
        self.runtime
            .block_on(self.client.request(endpoint, method, payload, kind))
    }

    pub fn get<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.runtime.block_on(self.client.get(endpoint, settings))
    }

    pub fn post<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.runtime.block_on(self.client.post(endpoint, settings))
    }

    pub fn put<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.runtime.block_on(self.client.put(endpoint, settings))
    }

    pub fn patch<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.runtime.block_on(self.client.patch(endpoint, settings))
    }

    pub fn delete<T, S>(&self, endpoint: &str, settings: &S) -> Result<T>
    where
        T: DeserializeOwned,
        S: RequestSettings + ?Sized,
    {
        self.runtime.block_on(self.client.delete(endpoint, settings))
    }

    /// See [`crate::RestClient::page`].
    pub fn page<T, S>(&self, settings: &S, endpoint: &str, page_size: u32) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        S: PagingSettings + ?Sized,
    {
        self.runtime
            .block_on(self.client.page(settings, endpoint, page_size))
    }

    pub fn fetch_page<T, S>(&self, settings: &S, endpoint: &str) -> Result<PageResult<T>>
    where
        T: DeserializeOwned,
        S: PagingSettings + ?Sized,
    {
        self.runtime
            .block_on(self.client.fetch_page(settings, endpoint))
    }

    pub fn exchange_access_token(&self, settings: &TokenExchangeSettings) -> Result<String> {
        self.runtime
            .block_on(self.client.exchange_access_token(settings))
    }
}
