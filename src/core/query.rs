//! List query state and its synchronisation with the URL
//!
//! [`ListFilterController`] reconciles the URL query string, the in-memory
//! filter list, the role default scope and user interaction into a single
//! [`ListQueryState`]. Every mutation re-derives the URL mirror in the same
//! call, so the two never diverge.
//!
//! # Example
//! ```rust,ignore
//! let mut controller = ListFilterController::initialize(
//!     "accounts",
//!     catalog,
//!     &UrlParams::parse("?scope=team&sortField=Name"),
//!     ListDefaults::new(OwnershipScope::Mine, "Name", SortDirection::Asc),
//! );
//! controller.add_filter(FilterCriteria::new("Industry", FilterOperator::Equals, "Tech"));
//! let params = controller.query_params(); // scope, filters, sortField, sortDir
//! ```

use crate::core::field::FieldCatalog;
use crate::core::filter::{FilterCriteria, decode_validated, encode_filters};
use crate::core::scope::OwnershipScope;
use crate::core::url_state::{
    FILTERS_KEY, SCOPE_KEY, SEARCH_KEY, SORT_DIR_KEY, SORT_FIELD_KEY, UrlParams,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort direction, `ASC` or `DESC` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(format!("unknown sort direction '{}'", s)),
        }
    }
}

/// Values a list view falls back to when the URL does not say otherwise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDefaults {
    /// Role default scope, resolved once per session
    pub scope: OwnershipScope,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl ListDefaults {
    pub fn new(
        scope: OwnershipScope,
        sort_field: impl Into<String>,
        sort_direction: SortDirection,
    ) -> Self {
        Self {
            scope,
            sort_field: sort_field.into(),
            sort_direction,
        }
    }
}

/// Scope, filters, search and sort of one list view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryState {
    pub scope: OwnershipScope,
    pub filters: Vec<FilterCriteria>,
    pub search: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl ListQueryState {
    /// State with nothing chosen beyond the defaults
    pub fn from_defaults(defaults: &ListDefaults) -> Self {
        Self {
            scope: defaults.scope,
            filters: Vec::new(),
            search: String::new(),
            sort_field: defaults.sort_field.clone(),
            sort_direction: defaults.sort_direction,
        }
    }

    /// Rebuild a state from URL params, re-validating every value
    ///
    /// Unknown scope, direction or sort field values fall back to the defaults. A
    /// `filters` value that fails to decode or validate resets to an empty
    /// list.
    pub fn from_url(params: &UrlParams, defaults: &ListDefaults, catalog: &FieldCatalog) -> Self {
        let scope = params
            .scope
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.scope);

        let sort_direction = params
            .sort_dir
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.sort_direction);

        let filters = match params.filters.as_deref() {
            None => Vec::new(),
            Some(raw) => decode_validated(raw, catalog).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding filters from URL");
                Vec::new()
            }),
        };

        Self {
            scope,
            filters,
            search: params
                .search
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_default()
                .to_string(),
            sort_field: params
                .sort_field
                .as_deref()
                .filter(|raw| catalog.contains(raw))
                .map(str::to_string)
                .unwrap_or_else(|| defaults.sort_field.clone()),
            sort_direction,
        }
    }

    /// Canonical URL mirror; default-equal values are omitted
    pub fn to_url(&self, defaults: &ListDefaults) -> UrlParams {
        UrlParams {
            scope: (self.scope != defaults.scope).then(|| self.scope.to_string()),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            sort_field: (!self.sort_field.is_empty() && self.sort_field != defaults.sort_field)
                .then(|| self.sort_field.clone()),
            sort_dir: (self.sort_direction != defaults.sort_direction)
                .then(|| self.sort_direction.to_string()),
            filters: (!self.filters.is_empty()).then(|| encode_filters(&self.filters)),
        }
    }

    /// Flat GET parameters; empty values are omitted, scope never is
    pub fn query_params(&self) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        params.insert(SCOPE_KEY.to_string(), self.scope.to_string());
        if !self.filters.is_empty() {
            params.insert(FILTERS_KEY.to_string(), encode_filters(&self.filters));
        }
        if !self.search.is_empty() {
            params.insert(SEARCH_KEY.to_string(), self.search.clone());
        }
        if !self.sort_field.is_empty() {
            params.insert(SORT_FIELD_KEY.to_string(), self.sort_field.clone());
            params.insert(SORT_DIR_KEY.to_string(), self.sort_direction.to_string());
        }
        params
    }
}

/// Identity of a fetched result set
///
/// Two keys are equal exactly when every value that shapes the server
/// result is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: String,
    pub scope: OwnershipScope,
    pub filters: String,
    pub search: String,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>, state: &ListQueryState) -> Self {
        Self {
            resource: resource.into(),
            scope: state.scope,
            filters: encode_filters(&state.filters),
            search: state.search.clone(),
            sort_field: state.sort_field.clone(),
            sort_direction: state.sort_direction,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}",
            self.resource,
            self.scope,
            self.filters,
            self.search,
            self.sort_field,
            self.sort_direction
        )
    }
}

/// Single owner of a list view's query state
#[derive(Debug, Clone)]
pub struct ListFilterController {
    resource: String,
    catalog: FieldCatalog,
    defaults: ListDefaults,
    state: ListQueryState,
    url: UrlParams,
}

impl ListFilterController {
    /// Build the state from the URL, falling back to `defaults`
    ///
    /// Never fails: malformed values degrade to their defaults.
    pub fn initialize(
        resource: impl Into<String>,
        catalog: FieldCatalog,
        url: &UrlParams,
        defaults: ListDefaults,
    ) -> Self {
        let state = ListQueryState::from_url(url, &defaults, &catalog);
        let url = state.to_url(&defaults);
        let resource = resource.into();

        tracing::debug!(
            resource = %resource,
            scope = %state.scope,
            filters = state.filters.len(),
            "initialized list state"
        );

        Self {
            resource,
            catalog,
            defaults,
            state,
            url,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn defaults(&self) -> &ListDefaults {
        &self.defaults
    }

    pub fn state(&self) -> &ListQueryState {
        &self.state
    }

    pub fn filters(&self) -> &[FilterCriteria] {
        &self.state.filters
    }

    /// Current URL mirror
    pub fn url(&self) -> &UrlParams {
        &self.url
    }

    /// Current URL mirror as a query string (no leading `?`)
    pub fn url_query(&self) -> String {
        self.url.to_query_string()
    }

    pub fn set_scope(&mut self, scope: OwnershipScope) {
        self.state.scope = scope;
        self.sync_url("scope");
    }

    /// Set the free-text search; blank text clears it
    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.state.search = if search.trim().is_empty() {
            String::new()
        } else {
            search
        };
        self.sync_url("search");
    }

    /// Set the sort field; an empty field restores the default
    pub fn set_sort_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        self.state.sort_field = if field.trim().is_empty() {
            self.defaults.sort_field.clone()
        } else {
            field
        };
        self.sync_url("sortField");
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        self.state.sort_direction = direction;
        self.sync_url("sortDir");
    }

    /// Column-header click: same field flips direction, a new field sorts ascending
    ///
    /// A blank field restores the default sort field like [`Self::set_sort_field`].
    pub fn sort_by(&mut self, field: impl Into<String>) {
        let field = field.into();
        if field.trim().is_empty() {
            self.set_sort_field(field);
            return;
        }
        if field == self.state.sort_field {
            self.state.sort_direction = self.state.sort_direction.reversed();
        } else {
            self.state.sort_field = field;
            self.state.sort_direction = SortDirection::Asc;
        }
        self.sync_url("sort");
    }

    /// Append a filter
    ///
    /// Incomplete or invalid criteria are ignored and `false` is returned;
    /// nothing partial ever enters the list.
    pub fn add_filter(&mut self, filter: FilterCriteria) -> bool {
        if let Err(e) = filter.validate(&self.catalog) {
            tracing::debug!(error = %e, "ignoring filter");
            return false;
        }
        self.state.filters.push(filter);
        self.sync_url("filters");
        true
    }

    /// Remove the filter at `index` (display position); out of range is a no-op
    pub fn remove_filter(&mut self, index: usize) -> Option<FilterCriteria> {
        if index >= self.state.filters.len() {
            return None;
        }
        let removed = self.state.filters.remove(index);
        self.sync_url("filters");
        Some(removed)
    }

    pub fn clear_filters(&mut self) {
        self.state.filters.clear();
        self.sync_url("filters");
    }

    /// Chip labels in display order
    pub fn filter_labels(&self) -> Vec<String> {
        self.state
            .filters
            .iter()
            .map(|f| f.label(&self.catalog))
            .collect()
    }

    pub fn query_params(&self) -> IndexMap<String, String> {
        self.state.query_params()
    }

    pub fn query_key(&self) -> QueryKey {
        QueryKey::new(self.resource.clone(), &self.state)
    }

    fn sync_url(&mut self, changed: &'static str) {
        self.url = self.state.to_url(&self.defaults);
        tracing::debug!(
            resource = %self.resource,
            changed,
            url = %self.url.to_query_string(),
            "list state updated"
        );
    }
}

/// Query parameters accepted by the list endpoints
///
/// The server does not trust these values: `filters` is decoded and
/// validated before use and a malformed value is a client error.
///
/// # Example
/// ```text
/// GET /api/accounts?scope=team&sortField=Name&sortDir=ASC
/// GET /api/opportunities?filters=[{"field":"Amount","operator":"gt","value":1000}]&includeClosed=true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ListRequest {
    pub scope: Option<String>,

    /// JSON-encoded filter list
    pub filters: Option<String>,

    pub search: Option<String>,

    pub sort_field: Option<String>,

    pub sort_dir: Option<String>,

    /// Opportunities only: include closed records
    pub include_closed: Option<bool>,

    /// Accounts only: return parent/child groups
    pub grouped: Option<bool>,
}

impl ListRequest {
    pub fn include_closed(&self) -> bool {
        self.include_closed.unwrap_or(false)
    }

    pub fn grouped(&self) -> bool {
        self.grouped.unwrap_or(false)
    }

    /// Search text, `None` when blank
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }
}
