//! Core module containing the list-view domain types and traits

pub mod error;
pub mod field;
pub mod filter;
pub mod grouping;
pub mod permission;
pub mod query;
pub mod record;
pub mod scope;
pub mod search;
pub mod service;
pub mod url_state;

pub use error::{ErrorResponse, RevOpsError, RevOpsResult};
pub use field::{FieldCatalog, FieldDescriptor, FieldType, FieldValue};
pub use filter::{FilterCriteria, FilterDraft, FilterError, FilterOperator, FilterValue};
pub use grouping::{AccountGroup, Hierarchical, group_by_parent};
pub use permission::{FieldPermission, FieldPermissionGate, FieldPermissions, ObjectFieldAccess, PermissionSource};
pub use query::{ListDefaults, ListFilterController, ListQueryState, ListRequest, QueryKey, SortDirection};
pub use record::{Account, CurrentUser, Opportunity, Record};
pub use scope::{OwnershipScope, ScopeDefaults, resolve_default_scope};
pub use search::{SearchDebouncer, SearchTicket};
pub use service::RecordStore;
pub use url_state::UrlParams;
