use std::collections::BTreeMap;

use serde::Serialize;

use crate::Value;

/// Flat key/value request payload.
///
/// Only populated fields ever enter a payload: `None`, empty text and
/// (through [`Payload::insert_non_default`]) default values are skipped, so
/// nothing is sent as an empty string or `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value unless it is empty text.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.0.insert(key.into(), value);
    }

    /// Inserts the value when the field is set.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Inserts the value unless it equals the type's default.
    pub fn insert_non_default<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Into<Value> + Default + PartialEq,
    {
        if value != V::default() {
            self.insert(key, value);
        }
    }

    /// Chaining form of [`Payload::insert_opt`].
    #[must_use]
    pub fn with_opt<V: Into<Value>>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    /// Chaining form of [`Payload::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Key/value pairs rendered as strings, as used for query parameters.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }

    /// Encodes the payload as an `application/x-www-form-urlencoded` body.
    ///
    /// Pairs with an empty key or an empty rendered value are omitted.
    pub fn to_form_body(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            let value = value.to_string();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

/// A request-settings value that projects its populated fields into a payload.
///
/// Implementors keep every optional field as an `Option` and insert it with
/// [`Payload::insert_opt`]; the field's own `None` state decides omission.
pub trait RequestSettings {
    fn to_payload(&self) -> Payload;
}

impl RequestSettings for Payload {
    fn to_payload(&self) -> Payload {
        self.clone()
    }
}

impl RequestSettings for () {
    fn to_payload(&self) -> Payload {
        Payload::default()
    }
}

/// Settings for an endpoint whose results are split across numbered pages.
pub trait PagingSettings: RequestSettings {
    /// Explicit page number requested by the caller.
    fn page(&self) -> Option<u32>;

    /// Explicit page size requested by the caller.
    fn per_page(&self) -> Option<u32>;
}

/// Generic list settings: paging plus optional sorting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageSettings {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub include: Option<String>,
}

impl PageSettings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn with_sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, order: impl Into<String>) -> Self {
        self.sort_order = Some(order.into());
        self
    }

    #[must_use]
    pub fn with_include(mut self, fields: impl Into<String>) -> Self {
        self.include = Some(fields.into());
        self
    }
}

impl RequestSettings for PageSettings {
    fn to_payload(&self) -> Payload {
        Payload::new()
            .with_opt("page", self.page)
            .with_opt("per_page", self.per_page)
            .with_opt("sort_by", self.sort_by.as_deref())
            .with_opt("sort_order", self.sort_order.as_deref())
            .with_opt("include", self.include.as_deref())
    }
}

impl PagingSettings for PageSettings {
    fn page(&self) -> Option<u32> {
        self.page
    }

    fn per_page(&self) -> Option<u32> {
        self.per_page
    }
}
