//! Query parameters and the fluent filter vocabulary shared by v1 and v2.
//!
//! Every resource builder owns a [`Query`]: the API session plus an
//! insertion-ordered [`QueryParams`] map. Device-listing builders also
//! implement [`DeviceFilters`], whose mutators consume and return the
//! builder so calls chain:
//!
//! ```ignore
//! let page = api
//!     .devices("customer-id")?
//!     .filter_by([("bitlocker", true), ("firewall", true)])
//!     .filter_by_operator(FilterByOperator::And)
//!     .order_by(Order::Ascending, "os_version")
//!     .limit(Some(50))
//!     .all()
//!     .await?;
//! ```
//!
//! Mutators ignore "empty" input (`None`, `0`, `""`, no filters) so
//! optional caller arguments can be forwarded without branching.

use std::fmt;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{ApiClient, ApiVersion};
use crate::error::Result;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Sent as-is.
    Str(String),
    /// Sent in decimal.
    Int(i64),
    /// Sent as one `name=value` pair per element.
    List(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

/// Insertion-ordered parameter map.
///
/// Keys are independent: setting one never touches another, and setting
/// an existing key replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no key is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens to `(name, value)` pairs for the URL query string.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                ParamValue::List(items) => {
                    pairs.extend(items.iter().map(|item| (key.clone(), item.clone())));
                }
                other => pairs.push((key.clone(), other.to_string())),
            }
        }
        pairs
    }
}

/// How multiple `filterby` conditions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterByOperator {
    /// Every condition must match.
    And,
    /// Any condition may match.
    Or,
}

impl FilterByOperator {
    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterByOperator::And => "and",
            FilterByOperator::Or => "or",
        }
    }
}

/// Sort direction, rendered as a prefix on the sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `+field`
    Ascending,
    /// `-field`
    Descending,
}

impl Order {
    /// Wire prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Ascending => "+",
            Order::Descending => "-",
        }
    }
}

/// Renders `field:value` pairs as a lower-cased, comma-joined string.
///
/// Returns `None` when there are no pairs.
pub fn render_filters<I, K, V>(filters: I) -> Option<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let rendered: Vec<String> = filters
        .into_iter()
        .map(|(field, value)| format!("{}:{}", field.as_ref(), value))
        .collect();
    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join(",").to_lowercase())
    }
}

// ── Query ────────────────────────────────────────────────────────────

/// Session, API version and accumulated parameters of one resource query.
#[derive(Debug, Clone)]
pub struct Query {
    client: ApiClient,
    version: ApiVersion,
    params: QueryParams,
}

impl Query {
    /// Starts a query with no parameters.
    pub fn new(client: ApiClient, version: ApiVersion) -> Self {
        Query {
            client,
            version,
            params: QueryParams::new(),
        }
    }

    /// The shared API session.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Parameters accumulated so far.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Mutable access for builders.
    pub fn params_mut(&mut self) -> &mut QueryParams {
        &mut self.params
    }

    /// Sends the request and decodes the response body as `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        payload: Option<&Value>,
    ) -> Result<T> {
        self.client
            .execute(self.version, method, resource, &self.params, payload)
            .await
    }

    /// Sends the request and discards the response body.
    pub async fn send(&self, method: Method, resource: &str, payload: Option<&Value>) -> Result<()> {
        self.client
            .execute_empty(self.version, method, resource, &self.params, payload)
            .await
    }
}

/// Filtering, ordering and pagination shared by the device listings.
///
/// Implementors only say where their [`Query`] lives and which key
/// carries the sort expression.
pub trait DeviceFilters: Sized {
    /// Parameter name for [`order_by`](Self::order_by).
    const ORDER_KEY: &'static str;

    /// The builder's query.
    fn query_mut(&mut self) -> &mut Query;

    /// Sets `filterby` from `(field, value)` pairs, e.g.
    /// `[("bitlocker", true), ("firewall", true)]` →
    /// `"bitlocker:true,firewall:true"`.
    fn filter_by<I, K, V>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        if let Some(rendered) = render_filters(filters) {
            self.query_mut().params_mut().set("filterby", rendered);
        }
        self
    }

    /// Sets `filterbyOperator`.
    fn filter_by_operator(mut self, operator: impl Into<Option<FilterByOperator>>) -> Self {
        if let Some(op) = operator.into() {
            self.query_mut()
                .params_mut()
                .set("filterbyOperator", op.as_str());
        }
        self
    }

    /// Sets the page size. `None` and `0` leave it unset.
    fn limit(mut self, limit: Option<u32>) -> Self {
        if let Some(n) = limit.filter(|n| *n > 0) {
            self.query_mut().params_mut().set("limit", n);
        }
        self
    }

    /// Sets the continuation cursor from a previous page's `after`.
    fn after<'a>(mut self, cursor: impl Into<Option<&'a str>>) -> Self {
        if let Some(c) = cursor.into().filter(|c| !c.is_empty()) {
            self.query_mut().params_mut().set("after", c);
        }
        self
    }

    /// Sets the sort expression `{+|-}{field}`. Needs both arguments.
    fn order_by<'a>(
        mut self,
        order: impl Into<Option<Order>>,
        field: impl Into<Option<&'a str>>,
    ) -> Self {
        if let (Some(order), Some(field)) = (order.into(), field.into().filter(|f| !f.is_empty())) {
            self.query_mut()
                .params_mut()
                .set(Self::ORDER_KEY, format!("{}{}", order.as_str(), field));
        }
        self
    }
}
