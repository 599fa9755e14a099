//! Request descriptors and URL composition.
//!
//! # Design
//! URL composition is straight concatenation:
//! `base_url [/base_path] [/request.url] [?query]`. Segments are appended
//! only when present and non-empty, and slashes are never normalized, so
//! callers own the shape of each segment. Query pairs are form-encoded the
//! way browsers encode `URLSearchParams`; a raw query string passes through
//! untouched.

use url::form_urlencoded;

/// One `key=value` query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    pub key: String,
    pub value: String,
}

impl QueryPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Query parameters attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParameters {
    Pair(QueryPair),
    /// Encoded in order; duplicate keys are kept.
    Pairs(Vec<QueryPair>),
    /// Already encoded; appended after `?` verbatim.
    Raw(String),
}

impl From<QueryPair> for QueryParameters {
    fn from(pair: QueryPair) -> Self {
        QueryParameters::Pair(pair)
    }
}

impl From<Vec<QueryPair>> for QueryParameters {
    fn from(pairs: Vec<QueryPair>) -> Self {
        QueryParameters::Pairs(pairs)
    }
}

impl From<&str> for QueryParameters {
    fn from(raw: &str) -> Self {
        QueryParameters::Raw(raw.to_string())
    }
}

impl From<String> for QueryParameters {
    fn from(raw: String) -> Self {
        QueryParameters::Raw(raw)
    }
}

/// Per-call URL options shared by every verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    /// Sub-path appended after the site's own path.
    pub url: Option<String>,
    pub parameters: Option<QueryParameters>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn parameters(mut self, parameters: impl Into<QueryParameters>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Splice a resource key onto the sub-path: `{url}/{key}`, or just
    /// `{key}` when there is no sub-path.
    pub fn with_key(&self, key: &str) -> Self {
        let url = match self.url.as_deref() {
            Some(url) if !url.is_empty() => format!("{url}/{key}"),
            _ => key.to_string(),
        };
        Self {
            url: Some(url),
            parameters: self.parameters.clone(),
        }
    }
}

/// Parameters for a GET request.
pub type GetParameters = RequestParameters;

/// Parameters for a POST request.
#[derive(Debug, Clone, PartialEq)]
pub struct PostParameters<T> {
    pub request: RequestParameters,
    pub body: T,
}

impl<T> PostParameters<T> {
    pub fn new(body: T) -> Self {
        Self {
            request: RequestParameters::default(),
            body,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request = self.request.url(url);
        self
    }

    pub fn parameters(mut self, parameters: impl Into<QueryParameters>) -> Self {
        self.request = self.request.parameters(parameters);
        self
    }
}

/// Parameters for a PUT request. The resulting path ends in `/{key}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PutParameters<T> {
    pub request: RequestParameters,
    pub key: String,
    pub body: T,
}

impl<T> PutParameters<T> {
    pub fn new(key: impl Into<String>, body: T) -> Self {
        Self {
            request: RequestParameters::default(),
            key: key.into(),
            body,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request = self.request.url(url);
        self
    }

    pub fn parameters(mut self, parameters: impl Into<QueryParameters>) -> Self {
        self.request = self.request.parameters(parameters);
        self
    }
}

/// Parameters for a DELETE request. The resulting path ends in `/{key}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteParameters {
    pub request: RequestParameters,
    pub key: String,
}

impl DeleteParameters {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            request: RequestParameters::default(),
            key: key.into(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request = self.request.url(url);
        self
    }

    pub fn parameters(mut self, parameters: impl Into<QueryParameters>) -> Self {
        self.request = self.request.parameters(parameters);
        self
    }
}

/// Options fixed when a request site is created.
///
/// Keys left as `None` are generated, and can be read back from the
/// site's cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposableOptions {
    pub url: Option<String>,
    pub loading_key: Option<String>,
    pub error_key: Option<String>,
    pub data_key: Option<String>,
}

impl ComposableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn loading_key(mut self, key: impl Into<String>) -> Self {
        self.loading_key = Some(key.into());
        self
    }

    pub fn error_key(mut self, key: impl Into<String>) -> Self {
        self.error_key = Some(key.into());
        self
    }

    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }
}

/// Render query parameters as `?k=v&...`, or `""` when there are none.
pub fn build_query_string(query: Option<&QueryParameters>) -> String {
    match query {
        None => String::new(),
        Some(QueryParameters::Raw(raw)) if raw.is_empty() => String::new(),
        Some(QueryParameters::Raw(raw)) => format!("?{raw}"),
        Some(QueryParameters::Pair(pair)) => encode_pairs(std::slice::from_ref(pair)),
        Some(QueryParameters::Pairs(pairs)) if pairs.is_empty() => String::new(),
        Some(QueryParameters::Pairs(pairs)) => encode_pairs(pairs),
    }
}

fn encode_pairs(pairs: &[QueryPair]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for pair in pairs {
        serializer.append_pair(&pair.key, &pair.value);
    }
    format!("?{}", serializer.finish())
}

/// Composes request URLs under a fixed base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestUrlBuilder {
    base_url: String,
}

impl RequestUrlBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, base_path: Option<&str>, request: Option<&RequestParameters>) -> String {
        let mut url = self.base_url.clone();
        push_segment(&mut url, base_path);

        if let Some(request) = request {
            push_segment(&mut url, request.url.as_deref());
            url.push_str(&build_query_string(request.parameters.as_ref()));
        }
        url
    }
}

fn push_segment(url: &mut String, segment: Option<&str>) {
    if let Some(segment) = segment.filter(|s| !s.is_empty()) {
        url.push('/');
        url.push_str(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_query_is_empty() {
        assert_eq!(build_query_string(None), "");
        assert_eq!(build_query_string(Some(&"".into())), "");
        assert_eq!(build_query_string(Some(&QueryParameters::Pairs(Vec::new()))), "");
    }

    #[test]
    fn raw_query_is_not_reencoded() {
        assert_eq!(build_query_string(Some(&"a=1".into())), "?a=1");
        assert_eq!(build_query_string(Some(&"q=a b&x=%20".into())), "?q=a b&x=%20");
    }

    #[test]
    fn single_pair() {
        let query = QueryParameters::from(QueryPair::new("a", "1"));
        assert_eq!(build_query_string(Some(&query)), "?a=1");
    }

    #[test]
    fn pairs_keep_order_and_duplicates() {
        let query = QueryParameters::from(vec![
            QueryPair::new("a", "1"),
            QueryPair::new("b", "2"),
            QueryPair::new("a", "3"),
        ]);
        assert_eq!(build_query_string(Some(&query)), "?a=1&b=2&a=3");
    }

    #[test]
    fn pairs_are_form_encoded() {
        let query = QueryParameters::from(QueryPair::new("setup", "knock knock&who"));
        assert_eq!(build_query_string(Some(&query)), "?setup=knock+knock%26who");
    }

    #[test]
    fn build_url_joins_base_path_and_request_url() {
        let builder = RequestUrlBuilder::new("http://x");
        let request = RequestParameters::new().url("5");
        assert_eq!(builder.build_url(Some("items"), Some(&request)), "http://x/items/5");
    }

    #[test]
    fn build_url_skips_missing_and_empty_segments() {
        let builder = RequestUrlBuilder::new("http://x");
        assert_eq!(builder.build_url(None, None), "http://x");
        assert_eq!(builder.build_url(Some(""), None), "http://x");

        let request = RequestParameters::new().url("").parameters(QueryPair::new("a", "1"));
        assert_eq!(builder.build_url(None, Some(&request)), "http://x?a=1");
    }

    #[test]
    fn build_url_does_not_normalize_slashes() {
        let builder = RequestUrlBuilder::new("http://x/");
        let request = RequestParameters::new().url("/5/");
        assert_eq!(builder.build_url(Some("items"), Some(&request)), "http://x//items//5/");
    }

    #[test]
    fn empty_base_yields_relative_path() {
        let builder = RequestUrlBuilder::new("");
        let request = RequestParameters::new().url("cards");
        assert_eq!(builder.build_url(None, Some(&request)), "/cards");
    }

    #[test]
    fn with_key_appends_resource_key() {
        let request = RequestParameters::new().url("items").with_key("7");
        assert_eq!(request.url.as_deref(), Some("items/7"));

        let bare = RequestParameters::new().with_key("7");
        assert_eq!(bare.url.as_deref(), Some("7"));
    }
}
