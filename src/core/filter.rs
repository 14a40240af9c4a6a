//! Declarative filter criteria (field / operator / value)
//!
//! A [`FilterCriteria`] is one predicate contributed through the filter bar.
//! The list of criteria is ANDed together by the backend. Criteria travel as
//! JSON, both inside the browser URL and as the `filters` query parameter:
//!
//! ```json
//! [{"field": "Industry", "operator": "eq", "value": "Tech"},
//!  {"field": "AnnualRevenue", "operator": "gte", "value": 1000000}]
//! ```

use crate::core::field::{FieldCatalog, FieldType, FieldValue, parse_date};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Closed set of comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "ne", alias = "neq")]
    NotEquals,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lte")]
    LessOrEqual,
    #[serde(rename = "gte")]
    GreaterOrEqual,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "between")]
    Between,
}

const STRING_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::Contains,
];

const NUMBER_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::LessThan,
    FilterOperator::GreaterThan,
    FilterOperator::LessOrEqual,
    FilterOperator::GreaterOrEqual,
];

const DATE_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::LessThan,
    FilterOperator::GreaterThan,
    FilterOperator::LessOrEqual,
    FilterOperator::GreaterOrEqual,
];

const PICKLIST_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Equals,
    FilterOperator::NotEquals,
    FilterOperator::In,
];

/// Operators valid for a field type, in picker order
pub fn operators_for(field_type: FieldType) -> &'static [FilterOperator] {
    match field_type {
        FieldType::String => STRING_OPERATORS,
        FieldType::Number => NUMBER_OPERATORS,
        FieldType::Date => DATE_OPERATORS,
        FieldType::Picklist => PICKLIST_OPERATORS,
    }
}

/// Operators valid for a declared type name; unknown names get the string set
pub fn operators_for_declared(type_name: &str) -> &'static [FilterOperator] {
    operators_for(FieldType::parse(type_name))
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 10] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::LessThan,
        FilterOperator::GreaterThan,
        FilterOperator::LessOrEqual,
        FilterOperator::GreaterOrEqual,
        FilterOperator::Contains,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Between,
    ];

    /// Wire name used in JSON and query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "eq",
            FilterOperator::NotEquals => "ne",
            FilterOperator::LessThan => "lt",
            FilterOperator::GreaterThan => "gt",
            FilterOperator::LessOrEqual => "lte",
            FilterOperator::GreaterOrEqual => "gte",
            FilterOperator::Contains => "contains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not_in",
            FilterOperator::Between => "between",
        }
    }

    /// Phrase used when rendering a filter chip
    pub fn phrase(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "does not equal",
            FilterOperator::LessThan => "is less than",
            FilterOperator::GreaterThan => "is greater than",
            FilterOperator::LessOrEqual => "is at most",
            FilterOperator::GreaterOrEqual => "is at least",
            FilterOperator::Contains => "contains",
            FilterOperator::In => "is one of",
            FilterOperator::NotIn => "is not one of",
            FilterOperator::Between => "is between",
        }
    }

    /// Whether the operator takes a list of values rather than a scalar
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::In | FilterOperator::NotIn | FilterOperator::Between
        )
    }

    pub fn is_valid_for(&self, field_type: FieldType) -> bool {
        operators_for(field_type).contains(self)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Empty text, or a list with no non-blank entry
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Number(_) => false,
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FilterValue::List(_))
    }

    /// Scalar view as a field value (lists are not scalars)
    fn scalar(&self) -> Option<FieldValue> {
        match self {
            FilterValue::Number(n) => Some(FieldValue::Number(*n)),
            FilterValue::Text(s) => Some(FieldValue::Text(s.clone())),
            FilterValue::List(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(value: Vec<String>) -> Self {
        FilterValue::List(value)
    }
}

/// Why a filter was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter field is empty")]
    EmptyField,

    #[error("filter on '{field}' has no value")]
    EmptyValue { field: String },

    #[error("operator '{operator}' is not valid for {field_type} field '{field}'")]
    IncompatibleOperator {
        field: String,
        field_type: FieldType,
        operator: FilterOperator,
    },

    #[error("operator '{operator}' on '{field}' expects {expected}")]
    ValueShape {
        field: String,
        operator: FilterOperator,
        expected: &'static str,
    },

    #[error("malformed filter list: {message}")]
    Malformed { message: String },
}

/// One field + operator + value predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCriteria {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Chip text, e.g. `Industry equals Tech`
    pub fn label(&self, catalog: &FieldCatalog) -> String {
        format!(
            "{} {} {}",
            catalog.label_of(&self.field),
            self.operator.phrase(),
            self.value
        )
    }

    /// Check the criteria against the field catalog
    ///
    /// Fields missing from the catalog are validated as strings.
    pub fn validate(&self, catalog: &FieldCatalog) -> Result<(), FilterError> {
        if self.field.trim().is_empty() {
            return Err(FilterError::EmptyField);
        }
        if self.value.is_empty() {
            return Err(FilterError::EmptyValue {
                field: self.field.clone(),
            });
        }

        let field_type = catalog.type_of(&self.field);
        if !self.operator.is_valid_for(field_type) {
            return Err(FilterError::IncompatibleOperator {
                field: self.field.clone(),
                field_type,
                operator: self.operator,
            });
        }

        match (&self.value, self.operator) {
            (FilterValue::List(bounds), FilterOperator::Between) if bounds.len() != 2 => {
                Err(self.shape_error("exactly two bounds"))
            }
            (value, op) if op.takes_list() && !value.is_list() => {
                Err(self.shape_error("a list of values"))
            }
            (value, op) if !op.takes_list() && value.is_list() => {
                Err(self.shape_error("a single value"))
            }
            // JSON has no encoding for NaN or infinities
            (FilterValue::Number(n), _) if !n.is_finite() => {
                Err(self.shape_error("a finite number"))
            }
            (FilterValue::Text(s), _) if field_type == FieldType::Number => {
                match s.trim().parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(()),
                    Ok(_) => Err(self.shape_error("a finite number")),
                    Err(_) => Err(self.shape_error("a number")),
                }
            }
            (FilterValue::Number(_), _) if field_type == FieldType::Date => {
                Err(self.shape_error("a date (YYYY-MM-DD)"))
            }
            (FilterValue::Text(s), _) if field_type == FieldType::Date => match parse_date(s) {
                Some(_) => Ok(()),
                None => Err(self.shape_error("a date (YYYY-MM-DD)")),
            },
            _ => Ok(()),
        }
    }

    fn shape_error(&self, expected: &'static str) -> FilterError {
        FilterError::ValueShape {
            field: self.field.clone(),
            operator: self.operator,
            expected,
        }
    }

    /// Evaluate the predicate against one record attribute
    ///
    /// A null attribute only satisfies `ne` and `not_in`.
    pub fn matches(&self, actual: &FieldValue, field_type: FieldType) -> bool {
        if actual.is_null() {
            return matches!(
                self.operator,
                FilterOperator::NotEquals | FilterOperator::NotIn
            );
        }

        match self.operator {
            FilterOperator::Equals => self.compare_scalar(actual, field_type) == Some(Ordering::Equal),
            FilterOperator::NotEquals => {
                self.compare_scalar(actual, field_type) != Some(Ordering::Equal)
            }
            FilterOperator::LessThan => self.compare_scalar(actual, field_type) == Some(Ordering::Less),
            FilterOperator::GreaterThan => {
                self.compare_scalar(actual, field_type) == Some(Ordering::Greater)
            }
            FilterOperator::LessOrEqual => matches!(
                self.compare_scalar(actual, field_type),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::GreaterOrEqual => matches!(
                self.compare_scalar(actual, field_type),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Contains => match (actual.as_text(), &self.value) {
                (Some(haystack), FilterValue::Text(needle)) => haystack
                    .to_lowercase()
                    .contains(&needle.trim().to_lowercase()),
                _ => false,
            },
            FilterOperator::In => self.list_contains(actual, field_type),
            FilterOperator::NotIn => !self.list_contains(actual, field_type),
            FilterOperator::Between => match &self.value {
                FilterValue::List(bounds) if bounds.len() == 2 => {
                    let low = compare_typed(actual, &FieldValue::Text(bounds[0].clone()), field_type);
                    let high = compare_typed(actual, &FieldValue::Text(bounds[1].clone()), field_type);
                    matches!(low, Some(Ordering::Greater | Ordering::Equal))
                        && matches!(high, Some(Ordering::Less | Ordering::Equal))
                }
                _ => false,
            },
        }
    }

    fn compare_scalar(&self, actual: &FieldValue, field_type: FieldType) -> Option<Ordering> {
        let expected = self.value.scalar()?;
        compare_typed(actual, &expected, field_type)
    }

    fn list_contains(&self, actual: &FieldValue, field_type: FieldType) -> bool {
        match &self.value {
            FilterValue::List(items) => items.iter().any(|item| {
                compare_typed(actual, &FieldValue::Text(item.clone()), field_type)
                    == Some(Ordering::Equal)
            }),
            _ => false,
        }
    }
}

/// Compare `actual` to `expected` under the semantics of `field_type`
fn compare_typed(actual: &FieldValue, expected: &FieldValue, field_type: FieldType) -> Option<Ordering> {
    match field_type {
        FieldType::Number => Some(actual.as_number()?.total_cmp(&expected.as_number()?)),
        FieldType::Date => Some(actual.as_date()?.cmp(&expected.as_date()?)),
        FieldType::String | FieldType::Picklist => {
            let left = scalar_text(actual)?;
            let right = scalar_text(expected)?;
            Some(left.cmp(&right))
        }
    }
}

fn scalar_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Number(n) => Some(n.to_string()),
        FieldValue::Date(d) => Some(d.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
        FieldValue::Null => None,
    }
}

/// Canonical JSON encoding of an ordered filter list
pub fn encode_filters(filters: &[FilterCriteria]) -> String {
    // Serializing plain data with string keys cannot fail
    serde_json::to_string(filters).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a JSON filter list without validating it against a catalog
pub fn decode_filters(raw: &str) -> Result<Vec<FilterCriteria>, FilterError> {
    serde_json::from_str(raw).map_err(|e| FilterError::Malformed {
        message: e.to_string(),
    })
}

/// Decode and validate every entry of a JSON filter list
pub fn decode_validated(
    raw: &str,
    catalog: &FieldCatalog,
) -> Result<Vec<FilterCriteria>, FilterError> {
    let filters = decode_filters(raw)?;
    for filter in &filters {
        filter.validate(catalog)?;
    }
    Ok(filters)
}

/// Pending filter being composed in the filter bar
///
/// Field, operator and value are chosen together; only a complete and
/// valid draft can be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDraft {
    field: String,
    operator: FilterOperator,
    value: Option<FilterValue>,
}

impl Default for FilterDraft {
    fn default() -> Self {
        Self {
            field: String::new(),
            operator: FilterOperator::Equals,
            value: None,
        }
    }
}

impl FilterDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> Option<&FilterValue> {
        self.value.as_ref()
    }

    /// Select a field. Resets the operator to `eq` and clears the value.
    pub fn select_field(&mut self, field: impl Into<String>) {
        self.field = field.into();
        self.operator = FilterOperator::Equals;
        self.value = None;
    }

    pub fn select_operator(&mut self, operator: FilterOperator) {
        self.operator = operator;
    }

    pub fn set_value(&mut self, value: impl Into<FilterValue>) {
        self.value = Some(value.into());
    }

    /// Operators the picker offers for the selected field
    pub fn available_operators(&self, catalog: &FieldCatalog) -> &'static [FilterOperator] {
        operators_for(catalog.type_of(&self.field))
    }

    /// Whether the Apply action is enabled
    pub fn can_apply(&self, catalog: &FieldCatalog) -> bool {
        self.to_criteria()
            .is_some_and(|criteria| criteria.validate(catalog).is_ok())
    }

    /// Take the draft as a criteria and reset the bar; `None` leaves it untouched
    pub fn apply(&mut self, catalog: &FieldCatalog) -> Option<FilterCriteria> {
        if !self.can_apply(catalog) {
            return None;
        }
        let criteria = self.to_criteria();
        *self = Self::default();
        criteria
    }

    fn to_criteria(&self) -> Option<FilterCriteria> {
        let value = self.value.clone()?;
        Some(FilterCriteria {
            field: self.field.clone(),
            operator: self.operator,
            value,
        })
    }
}
