//! Configuration loading and management
//!
//! ```yaml
//! objects:
//!   - object_type: Account
//!     resource: accounts
//!     default_sort: { field: Name, direction: ASC }
//!     fields:
//!       - { name: Name, label: Account Name, type: string }
//!       - { name: AnnualRevenue, label: Annual Revenue, type: number }
//! scope_defaults:
//!   ae: mine
//!   am: team
//! client:
//!   base_url: http://localhost:3000
//!   timeout_ms: 30000
//! ```

use crate::core::error::ConfigError;
use crate::core::field::{FieldCatalog, FieldDescriptor, FieldType};
use crate::core::query::{ListDefaults, SortDirection};
use crate::core::scope::{OwnershipScope, ScopeDefaults};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Default sort of a list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,

    #[serde(default)]
    pub direction: SortDirection,
}

/// One listable object type and its filterable fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Metadata name (e.g., "Account")
    pub object_type: String,

    /// Path segment under `/api` (e.g., "accounts")
    pub resource: String,

    /// Filterable fields in picker order
    pub fields: Vec<FieldDescriptor>,

    pub default_sort: SortConfig,
}

impl ObjectConfig {
    pub fn catalog(&self) -> FieldCatalog {
        FieldCatalog::from_descriptors(self.fields.iter().cloned())
    }

    /// List defaults for a session whose role resolved to `scope`
    pub fn list_defaults(&self, scope: OwnershipScope) -> ListDefaults {
        ListDefaults::new(
            scope,
            self.default_sort.field.clone(),
            self.default_sort.direction,
        )
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    200
}

fn default_search_debounce_ms() -> u64 {
    300
}

/// Transport policy of the REST client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Hard per-request timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts for idempotent GETs after the first one fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each further retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub objects: Vec<ObjectConfig>,

    /// Role to default scope; roles without an entry start on `mine`
    #[serde(default)]
    pub scope_defaults: ScopeDefaults,

    #[serde(default)]
    pub client: ClientConfig,
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError {
                message: e.to_string(),
            },
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that object types and resources are unique and every
    /// default sort field is declared
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut object_types = HashSet::new();
        let mut resources = HashSet::new();

        for object in &self.objects {
            if !object_types.insert(object.object_type.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "objects.object_type".to_string(),
                    value: object.object_type.clone(),
                    message: "declared more than once".to_string(),
                });
            }
            if object.resource.trim().is_empty() || !resources.insert(object.resource.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "objects.resource".to_string(),
                    value: object.resource.clone(),
                    message: "must be non-empty and unique".to_string(),
                });
            }
            if !object.fields.iter().any(|f| f.name == object.default_sort.field) {
                return Err(ConfigError::InvalidValue {
                    field: format!("objects.{}.default_sort.field", object.object_type),
                    value: object.default_sort.field.clone(),
                    message: "not a declared field".to_string(),
                });
            }
        }

        if self.client.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client.base_url".to_string(),
                value: String::new(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Find an object by metadata name (e.g., "Account")
    pub fn object(&self, object_type: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.object_type == object_type)
    }

    /// Find an object by resource path segment (e.g., "accounts")
    pub fn object_for_resource(&self, resource: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.resource == resource)
    }

    /// Create a default configuration with Salesforce-shaped accounts and
    /// opportunities
    pub fn default_config() -> Self {
        Self {
            objects: vec![
                ObjectConfig {
                    object_type: "Account".to_string(),
                    resource: "accounts".to_string(),
                    fields: vec![
                        FieldDescriptor::new("Name", "Account Name", FieldType::String),
                        FieldDescriptor::new("Industry", "Industry", FieldType::Picklist),
                        FieldDescriptor::new("Type", "Account Type", FieldType::Picklist),
                        FieldDescriptor::new("AnnualRevenue", "Annual Revenue", FieldType::Number),
                        FieldDescriptor::new("CreatedDate", "Created Date", FieldType::Date),
                    ],
                    default_sort: SortConfig {
                        field: "Name".to_string(),
                        direction: SortDirection::Asc,
                    },
                },
                ObjectConfig {
                    object_type: "Opportunity".to_string(),
                    resource: "opportunities".to_string(),
                    fields: vec![
                        FieldDescriptor::new("Name", "Opportunity Name", FieldType::String),
                        FieldDescriptor::new("AccountName", "Account Name", FieldType::String),
                        FieldDescriptor::new("StageName", "Stage", FieldType::Picklist),
                        FieldDescriptor::new("Amount", "Amount", FieldType::Number),
                        FieldDescriptor::new("Probability", "Probability (%)", FieldType::Number),
                        FieldDescriptor::new("CloseDate", "Close Date", FieldType::Date),
                    ],
                    default_sort: SortConfig {
                        field: "CloseDate".to_string(),
                        direction: SortDirection::Asc,
                    },
                },
            ],
            scope_defaults: ScopeDefaults::new()
                .with("ae", OwnershipScope::Mine)
                .with("am", OwnershipScope::Team)
                .with("csm", OwnershipScope::Team)
                .with("sales_leader", OwnershipScope::All)
                .with("admin", OwnershipScope::All),
            client: ClientConfig::default(),
        }
    }
}
