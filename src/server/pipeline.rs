//! Server-side list pipeline
//!
//! Request parameters are untrusted: filters are decoded and validated
//! against the object's field catalog, and a bad value is a 400 rather than
//! being silently dropped. The validated query is then applied in a fixed
//! order: scope, filters (AND), search, stable sort with nulls last.

use crate::core::error::{RevOpsResult, ValidationError};
use crate::core::field::FieldCatalog;
use crate::core::filter::{FilterCriteria, decode_validated};
use crate::core::query::{ListDefaults, ListRequest, SortDirection};
use crate::core::record::{CurrentUser, Record};
use crate::core::scope::OwnershipScope;
use std::cmp::Ordering;

/// Validated form of a [`ListRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub scope: OwnershipScope,
    pub filters: Vec<FilterCriteria>,
    pub search: Option<String>,
    pub sort_field: String,
    pub sort_direction: SortDirection,
}

impl ListQuery {
    /// Validate `request`, filling absent values from `defaults`
    pub fn from_request(
        request: &ListRequest,
        catalog: &FieldCatalog,
        defaults: &ListDefaults,
    ) -> RevOpsResult<Self> {
        let scope = match request.scope.as_deref().filter(|s| !s.is_empty()) {
            None => defaults.scope,
            Some(raw) => raw.parse::<OwnershipScope>().map_err(|message| ValidationError::InvalidParameter {
                parameter: "scope".to_string(),
                value: raw.to_string(),
                message,
            })?,
        };

        let sort_direction = match request.sort_dir.as_deref().filter(|s| !s.is_empty()) {
            None => defaults.sort_direction,
            Some(raw) => raw.parse::<SortDirection>().map_err(|message| ValidationError::InvalidParameter {
                parameter: "sortDir".to_string(),
                value: raw.to_string(),
                message,
            })?,
        };

        let filters = match request.filters.as_deref().filter(|s| !s.trim().is_empty()) {
            None => Vec::new(),
            Some(raw) => decode_validated(raw, catalog)?,
        };

        let sort_field = request
            .sort_field
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| defaults.sort_field.clone());

        Ok(Self {
            scope,
            filters,
            search: request.search().map(str::to_string),
            sort_field,
            sort_direction,
        })
    }

    /// Narrow, filter, search and sort `records`
    pub fn apply<T: Record>(
        &self,
        records: Vec<T>,
        catalog: &FieldCatalog,
        user: &CurrentUser,
    ) -> Vec<T> {
        let total = records.len();

        let mut records: Vec<T> = records
            .into_iter()
            .filter(|r| self.scope.admits(r.owner_id(), user))
            .filter(|r| {
                self.filters
                    .iter()
                    .all(|f| f.matches(&r.field_value(&f.field), catalog.type_of(&f.field)))
            })
            .filter(|r| {
                self.search
                    .as_deref()
                    .is_none_or(|search| r.matches_search(search))
            })
            .collect();

        sort_records(&mut records, &self.sort_field, self.sort_direction);

        tracing::debug!(
            object_type = T::object_type(),
            scope = %self.scope,
            filters = self.filters.len(),
            total,
            matched = records.len(),
            "applied list query"
        );

        records
    }
}

/// Stable sort on one field; nulls stay last in both directions
pub fn sort_records<T: Record>(records: &mut [T], field: &str, direction: SortDirection) {
    records.sort_by(|a, b| compare_by(a, b, field, direction));
}

fn compare_by<T: Record>(a: &T, b: &T, field: &str, direction: SortDirection) -> Ordering {
    let left = a.field_value(field);
    let right = b.field_value(field);
    if left.is_null() || right.is_null() {
        return left.compare(&right);
    }
    match direction {
        SortDirection::Asc => left.compare(&right),
        SortDirection::Desc => right.compare(&left),
    }
}
