//! Strongly typed CRM records decoded at the network boundary
//!
//! Payloads use Salesforce API names (`Id`, `ParentId`, `AnnualRevenue`, ...).
//! They are decoded once into these structs and handled as typed values
//! from then on.

use crate::core::field::FieldValue;
use crate::core::grouping::AccountGroup;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Common view of a list record used for scope narrowing, filtering,
/// searching and sorting
pub trait Record: Clone + Send + Sync + 'static {
    /// Object type name used by metadata endpoints (e.g. `Account`)
    fn object_type() -> &'static str;

    fn id(&self) -> &str;

    fn owner_id(&self) -> Option<&str>;

    /// Value of a field by API name; unknown fields read as `Null`
    fn field_value(&self, field: &str) -> FieldValue;

    /// Attributes matched by free-text search
    fn search_terms(&self) -> Vec<&str>;

    /// Case-insensitive substring search over [`Record::search_terms`]
    fn matches_search(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_terms()
            .iter()
            .any(|term| term.to_lowercase().contains(&needle))
    }
}

/// Account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(rename = "Type", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub annual_revenue: Option<f64>,
    #[serde(default)]
    pub created_date: Option<NaiveDate>,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            owner_id: None,
            industry: None,
            account_type: None,
            annual_revenue: None,
            created_date: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_annual_revenue(mut self, revenue: f64) -> Self {
        self.annual_revenue = Some(revenue);
        self
    }
}

impl Record for Account {
    fn object_type() -> &'static str {
        "Account"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "Id" => FieldValue::Text(self.id.clone()),
            "Name" => FieldValue::Text(self.name.clone()),
            "ParentId" => FieldValue::text(self.parent_id.as_deref()),
            "OwnerId" => FieldValue::text(self.owner_id.as_deref()),
            "Industry" => FieldValue::text(self.industry.as_deref()),
            "Type" => FieldValue::text(self.account_type.as_deref()),
            "AnnualRevenue" => FieldValue::number(self.annual_revenue),
            "CreatedDate" => FieldValue::date(self.created_date),
            _ => FieldValue::Null,
        }
    }

    fn search_terms(&self) -> Vec<&str> {
        let mut terms = vec![self.name.as_str()];
        terms.extend(self.industry.as_deref());
        terms.extend(self.account_type.as_deref());
        terms
    }
}

/// Opportunity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Opportunity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub stage_name: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub close_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_closed: bool,
}

impl Opportunity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            account_id: None,
            account_name: None,
            owner_id: None,
            stage_name: None,
            amount: None,
            probability: None,
            close_date: None,
            is_closed: false,
        }
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>, is_closed: bool) -> Self {
        self.stage_name = Some(stage.into());
        self.is_closed = is_closed;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_close_date(mut self, close_date: NaiveDate) -> Self {
        self.close_date = Some(close_date);
        self
    }
}

impl Record for Opportunity {
    fn object_type() -> &'static str {
        "Opportunity"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "Id" => FieldValue::Text(self.id.clone()),
            "Name" => FieldValue::Text(self.name.clone()),
            "AccountId" => FieldValue::text(self.account_id.as_deref()),
            "AccountName" => FieldValue::text(self.account_name.as_deref()),
            "OwnerId" => FieldValue::text(self.owner_id.as_deref()),
            "StageName" => FieldValue::text(self.stage_name.as_deref()),
            "Amount" => FieldValue::number(self.amount),
            "Probability" => FieldValue::number(self.probability),
            "CloseDate" => FieldValue::date(self.close_date),
            "IsClosed" => FieldValue::Bool(self.is_closed),
            _ => FieldValue::Null,
        }
    }

    fn search_terms(&self) -> Vec<&str> {
        let mut terms = vec![self.name.as_str()];
        terms.extend(self.account_name.as_deref());
        terms.extend(self.stage_name.as_deref());
        terms
    }
}

/// The signed-in user as returned by `GET /api/user/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub team_member_ids: Vec<String>,
}

/// Body of a flat list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub records: Vec<T>,
    pub count: usize,
}

impl<T> ListResponse<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

/// Body of a grouped list response; `count` covers roots and children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedListResponse<T> {
    pub groups: Vec<AccountGroup<T>>,
    pub count: usize,
}

impl<T> GroupedListResponse<T> {
    pub fn new(groups: Vec<AccountGroup<T>>) -> Self {
        Self {
            count: groups.iter().map(AccountGroup::record_count).sum(),
            groups,
        }
    }
}
