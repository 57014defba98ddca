//! Page-number pagination.
//!
//! [`RestClient::page`] walks pages 1, 2, 3, ... until the server returns a
//! page shorter than the requested size, concatenating the `data` arrays in
//! order. Settings that already name a page or page size get exactly one
//! request instead.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{
    client::decode_json, ContentKind, PageResult, PagingSettings, Payload, RestClient, RestError,
    Result,
};

const PAGE_KEY: &str = "page";
const PER_PAGE_KEY: &str = "per_page";

impl RestClient {
    /// Fetches every item behind a pageable endpoint.
    ///
    /// When `settings` carries an explicit page or page size, a single request
    /// is made with those settings. Otherwise pages of `page_size` items are
    /// requested from page 1 until a short (or empty) page arrives, or until
    /// [`ClientConfig::max_pages`](crate::ClientConfig::max_pages) is reached
    /// when one is configured.
    pub async fn page<T, S>(&self, settings: &S, endpoint: &str, page_size: u32) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        S: PagingSettings + ?Sized,
    {
        if settings.page().is_some() || settings.per_page().is_some() {
            return self.page_request(endpoint, &settings.to_payload()).await;
        }
        if page_size == 0 {
            return Err(RestError::Config(
                "page size must be greater than zero".to_owned(),
            ));
        }

        let max_pages = self.config().max_pages;
        let mut results = Vec::new();
        let mut page = 1u32;
        loop {
            let mut payload = settings.to_payload();
            payload.insert(PAGE_KEY, page);
            payload.insert(PER_PAGE_KEY, page_size);

            let items: Vec<T> = self.page_request(endpoint, &payload).await?;
            let received = items.len();
            results.extend(items);

            #[cfg(feature = "tracing")]
            tracing::debug!(endpoint, page, received, total = results.len(), "fetched page");

            if received < page_size as usize {
                break;
            }
            if max_pages.is_some_and(|max| page >= max) {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    endpoint,
                    max_pages = page,
                    "page limit reached before a short page; results may be incomplete"
                );
                break;
            }
            page += 1;
        }
        Ok(results)
    }

    /// Fetches a single page as described by `settings`.
    ///
    /// `has_more` is derived from the page size in `settings` when present:
    /// a full page may be followed by another. Without a page size any
    /// non-empty page counts as possibly having a successor.
    pub async fn fetch_page<T, S>(&self, settings: &S, endpoint: &str) -> Result<PageResult<T>>
    where
        T: DeserializeOwned,
        S: PagingSettings + ?Sized,
    {
        let items: Vec<T> = self.page_request(endpoint, &settings.to_payload()).await?;
        let has_more = match settings.per_page() {
            Some(per_page) => per_page > 0 && items.len() >= per_page as usize,
            None => !items.is_empty(),
        };
        Ok(PageResult { items, has_more })
    }

    async fn page_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &Payload,
    ) -> Result<Vec<T>> {
        let response = self
            .request(endpoint, Method::GET, payload, ContentKind::Json)
            .await?;
        decode_json(take_data(response)?)
    }
}

fn take_data(mut response: JsonValue) -> Result<JsonValue> {
    match response.get_mut("data").map(JsonValue::take) {
        Some(data @ JsonValue::Array(_)) => Ok(data),
        Some(JsonValue::Null) | None => Err(RestError::Decode(
            "paged response has no data array".to_owned(),
        )),
        Some(other) => Err(RestError::Decode(format!(
            "paged response data is not an array: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;
    use serde_json::json;

    use crate::transport::testing::MockTransport;
    use crate::transport::TransportFailure;
    use crate::{ClientConfig, PageSettings, RestClient, RestError};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn page_body(ids: std::ops::Range<u32>) -> Result<String, TransportFailure> {
        let data: Vec<_> = ids.map(|id| json!({ "id": id })).collect();
        Ok(json!({ "data": data }).to_string())
    }

    fn client_with(
        config: ClientConfig,
        responses: Vec<Result<String, TransportFailure>>,
    ) -> (RestClient, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new(responses));
        let client = RestClient::builder()
            .config(config.with_rate_limit_delay_ms(0))
            .transport(mock.clone())
            .build()
            .expect("client must build");
        (client, mock)
    }

    #[tokio::test]
    async fn walks_pages_until_short_page() {
        let (client, mock) = client_with(
            ClientConfig::default(),
            vec![
                page_body(0..5),
                page_body(5..10),
                page_body(10..15),
                page_body(15..18),
            ],
        );

        let items: Vec<Item> = client
            .page(&PageSettings::new(), "/surveys", 5)
            .await
            .expect("pagination must succeed");

        assert_eq!(mock.hits(), 4);
        assert_eq!(items.len(), 18);
        assert!(items.iter().enumerate().all(|(i, item)| item.id == i as u32));
        for index in 0..4 {
            let sent = mock.request(index);
            assert_eq!(sent.query_param("page"), Some((index + 1).to_string().as_str()));
            assert_eq!(sent.query_param("per_page"), Some("5"));
        }
    }

    #[tokio::test]
    async fn empty_page_ends_pagination() {
        let (client, mock) = client_with(
            ClientConfig::default(),
            vec![page_body(0..2), page_body(2..4), page_body(0..0)],
        );

        let items: Vec<Item> = client
            .page(&PageSettings::new().with_sort_by("title"), "/surveys", 2)
            .await
            .expect("pagination must succeed");

        assert_eq!(mock.hits(), 3);
        assert_eq!(items.len(), 4);
        assert_eq!(mock.request(2).query_param("sort_by"), Some("title"));
    }

    #[tokio::test]
    async fn explicit_paging_makes_single_request() {
        let (client, mock) = client_with(ClientConfig::default(), vec![page_body(0..10)]);

        let items: Vec<Item> = client
            .page(&PageSettings::new().with_page(2).with_per_page(10), "/surveys", 50)
            .await
            .expect("request must succeed");

        assert_eq!(mock.hits(), 1);
        assert_eq!(items.len(), 10);
        let sent = mock.request(0);
        assert_eq!(sent.query_param("page"), Some("2"));
        assert_eq!(sent.query_param("per_page"), Some("10"));
    }

    #[tokio::test]
    async fn max_pages_bounds_full_pages() {
        let (client, mock) = client_with(
            ClientConfig::default().with_max_pages(2),
            vec![page_body(0..3), page_body(3..6), page_body(6..9)],
        );

        let items: Vec<Item> = client
            .page(&PageSettings::new(), "/responses", 3)
            .await
            .expect("pagination must succeed");

        assert_eq!(mock.hits(), 2);
        assert_eq!(items.len(), 6);
    }

    #[tokio::test]
    async fn fetch_page_reports_has_more() {
        let (client, _) = client_with(
            ClientConfig::default(),
            vec![page_body(0..10), page_body(0..4)],
        );
        let settings = PageSettings::new().with_page(1).with_per_page(10);

        let full = client
            .fetch_page::<Item, _>(&settings, "/surveys")
            .await
            .expect("first page");
        let short = client
            .fetch_page::<Item, _>(&settings.clone().with_page(2), "/surveys")
            .await
            .expect("second page");

        assert!(full.has_more);
        assert!(!short.has_more);
        assert_eq!(short.items.len(), 4);
    }

    #[tokio::test]
    async fn missing_data_is_decode_error() {
        let (client, _) = client_with(
            ClientConfig::default(),
            vec![Ok(json!({ "total": 0 }).to_string())],
        );

        let err = client
            .page::<Item, _>(&PageSettings::new(), "/surveys", 10)
            .await
            .expect_err("must fail");

        assert!(matches!(err, RestError::Decode(_)));
    }

    #[tokio::test]
    async fn zero_page_size_is_rejected() {
        let (client, mock) = client_with(ClientConfig::default(), Vec::new());

        let err = client
            .page::<Item, _>(&PageSettings::new(), "/surveys", 0)
            .await
            .expect_err("must fail");

        assert!(matches!(err, RestError::Config(_)));
        assert_eq!(mock.hits(), 0);
    }
}
