//! Field types, typed field values and the per-object field catalog

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Declared semantic type of a queryable field
///
/// The operator table in [`crate::core::filter`] is keyed by this type.
/// Any declared type outside the four known ones is treated as `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Number,
    Date,
    Picklist,
}

impl FieldType {
    /// Parse a declared type name, falling back to `String` for anything unknown
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "picklist" => FieldType::Picklist,
            _ => FieldType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Picklist => "picklist",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(FieldType::parse(&name))
    }
}

/// A typed attribute value read from a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Build a text value, mapping `None` to `Null`
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(FieldValue::Null, |s| FieldValue::Text(s.to_string()))
    }

    /// Build a number value, mapping `None` to `Null`
    pub fn number(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Number)
    }

    /// Build a date value, mapping `None` to `Null`
    pub fn date(value: Option<NaiveDate>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Date)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value; text is parsed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Calendar-date view of the value; text is parsed
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Text(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Order two values of the same field. Nulls sort after everything else.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Greater,
            (_, FieldValue::Null) => Ordering::Less,
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (a, b) => a.sort_text().cmp(&b.sort_text()),
        }
    }

    fn sort_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.to_lowercase(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => String::new(),
        }
    }
}

/// Parse `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Display metadata for one queryable field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// API name (e.g. `AnnualRevenue`)
    pub name: String,

    /// Human-readable label shown in the filter bar and on chips
    pub label: String,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
        }
    }
}

/// Ordered catalog of the fields a list view can filter on
///
/// Declaration order is kept since it is the order of the field picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCatalog {
    fields: IndexMap<String, FieldDescriptor>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        catalog
    }

    /// Add or replace a field. Replacing keeps the original position.
    pub fn insert(&mut self, descriptor: FieldDescriptor) {
        self.fields.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared type of a field; unknown fields are strings
    pub fn type_of(&self, field: &str) -> FieldType {
        self.fields
            .get(field)
            .map(|d| d.field_type)
            .unwrap_or_default()
    }

    /// Display label of a field, falling back to the raw key
    pub fn label_of<'a>(&'a self, field: &'a str) -> &'a str {
        self.fields
            .get(field)
            .map(|d| d.label.as_str())
            .unwrap_or(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
