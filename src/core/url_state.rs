//! Browser URL mirror of a list view
//!
//! A subset of the list state is kept in the address bar so a view can be
//! bookmarked or shared:
//!
//! ```text
//! ?scope=team&search=acme&sortField=AnnualRevenue&sortDir=DESC&filters=[...]
//! ```
//!
//! The in-memory state stays authoritative. The URL is only read back on
//! load, and every value read from it is re-validated.

use url::form_urlencoded;

pub const SCOPE_KEY: &str = "scope";
pub const SEARCH_KEY: &str = "search";
pub const SORT_FIELD_KEY: &str = "sortField";
pub const SORT_DIR_KEY: &str = "sortDir";
pub const FILTERS_KEY: &str = "filters";

/// Raw, unvalidated query-string values of a list view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams {
    pub scope: Option<String>,
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_dir: Option<String>,
    pub filters: Option<String>,
}

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string, with or without the leading `?`
    ///
    /// Unknown keys are ignored, empty values count as absent and the last
    /// occurrence of a repeated key wins.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = (!value.is_empty()).then(|| value.into_owned());
            match key.as_ref() {
                SCOPE_KEY => params.scope = value,
                SEARCH_KEY => params.search = value,
                SORT_FIELD_KEY => params.sort_field = value,
                SORT_DIR_KEY => params.sort_dir = value,
                FILTERS_KEY => params.filters = value,
                _ => {}
            }
        }

        params
    }

    /// Canonical query string without the leading `?`
    ///
    /// Keys are written in a fixed order and absent or empty values are
    /// left out, so equal params always produce the same string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.entries() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Present entries in canonical order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            (SCOPE_KEY, &self.scope),
            (SEARCH_KEY, &self.search),
            (SORT_FIELD_KEY, &self.sort_field),
            (SORT_DIR_KEY, &self.sort_dir),
            (FILTERS_KEY, &self.filters),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
