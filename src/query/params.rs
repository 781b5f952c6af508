//! Raw query-string parameters with first-value-wins semantics.

use axum::extract::Query;
use axum::http::Uri;

/// Query parameters in request order, one entry per distinct key.
///
/// When a key repeats (`?a=1&a=2`) the first value is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (k, v) in pairs {
            if !entries.iter().any(|(seen, _)| *seen == k) {
                entries.push((k, v));
            }
        }
        QueryParams { entries }
    }

    /// Parse the query of a request URI. A malformed query string yields no parameters.
    pub fn from_uri(uri: &Uri) -> Self {
        match Query::<Vec<(String, String)>>::try_from_uri(uri) {
            Ok(Query(pairs)) => Self::from_pairs(pairs),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed query string");
                Self::default()
            }
        }
    }

    /// Parse a bare query string such as `page=2&page_size=5`.
    pub fn parse(raw: &str) -> Self {
        format!("/?{}", raw)
            .parse::<Uri>()
            .map(|uri| Self::from_uri(&uri))
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key` when present and non-empty after trimming.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
