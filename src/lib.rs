//! # RevOps-RS
//!
//! List-view state and query plumbing for revenue-operations dashboards over
//! Salesforce-shaped CRM data.
//!
//! ## Features
//!
//! - **Typed Filters**: Operator compatibility per field type, validated before use
//! - **Ownership Scopes**: `mine` / `team` / `all` with per-role defaults
//! - **URL-Synchronised State**: Every list view round-trips through its query string
//! - **Stable Query Keys**: Cache keys derived from the full list state
//! - **Account Hierarchies**: One-level parent/child grouping that never drops a record
//! - **Field Permissions**: Read-through gate that fails open for reads and closed for writes
//! - **REST Client**: Timeouts, bounded retry, stale-response guard and debounced search
//! - **Reference Backend**: axum server that validates every list request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use revops::prelude::*;
//!
//! let context = AppContext::new(DashboardConfig::default_config())?;
//! let session = context.bootstrap().await?;
//!
//! // Seed the list view from the page URL
//! let mut accounts = context.list_controller("Account", "scope=team", &session)?;
//! accounts.add_filter(FilterCriteria::new("AnnualRevenue", FilterOperator::GreaterThan, 1_000_000.0));
//!
//! // The URL follows every change
//! assert!(accounts.url_query().contains("filters="));
//!
//! let records = context.load_accounts(&accounts).await?;
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Types ===
    pub use crate::core::{
        error::{
            ConfigError, ErrorResponse, RequestError, RevOpsError, RevOpsResult, TransportError,
            ValidationError,
        },
        field::{FieldCatalog, FieldDescriptor, FieldType, FieldValue},
        filter::{
            FilterCriteria, FilterDraft, FilterError, FilterOperator, FilterValue,
            decode_filters, decode_validated, encode_filters, operators_for,
            operators_for_declared,
        },
        grouping::{AccountGroup, Hierarchical, group_by_parent, group_refs},
        permission::{
            FieldPermission, FieldPermissionGate, FieldPermissions, ObjectFieldAccess,
            PermissionSource,
        },
        query::{
            ListDefaults, ListFilterController, ListQueryState, ListRequest, QueryKey,
            SortDirection,
        },
        record::{
            Account, CurrentUser, GroupedListResponse, ListResponse, Opportunity, Record,
        },
        scope::{OwnershipScope, ScopeDefaults, resolve_default_scope},
        search::{DEFAULT_SEARCH_DEBOUNCE, SearchDebouncer, SearchTicket},
        service::RecordStore,
        url_state::UrlParams,
    };

    // === Client ===
    pub use crate::client::{DashboardClient, QueryCache, RetryPolicy, USER_HEADER};
    pub use crate::context::{AppContext, Session};

    // === Storage ===
    pub use crate::storage::InMemoryRecordStore;

    // === Config ===
    pub use crate::config::{ClientConfig, DashboardConfig, ObjectConfig, SortConfig};

    // === Server ===
    pub use crate::server::{AuthenticatedUser, ListQuery, ServerBuilder, ServerState};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::NaiveDate;
    pub use serde::{Deserialize, Serialize};
}
