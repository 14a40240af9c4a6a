//! Field-level permission gate
//!
//! A read-through cache of `GET /api/metadata/fields/{objectType}` shared by
//! every view that renders fields of the same object type. Each object
//! type's map is fetched wholesale and never patched in place.
//!
//! The defaults are asymmetric:
//!
//! - [`ObjectFieldAccess::is_accessible`] fails open. While loading, after a
//!   failed fetch, or for a field missing from the map, fields are shown.
//! - [`ObjectFieldAccess::is_updateable`] fails closed. Under the same
//!   conditions no edit affordance is offered.

use crate::core::error::RevOpsResult;
use crate::core::field::FieldType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Server-declared permissions and metadata for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPermission {
    pub accessible: bool,
    pub updateable: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
}

impl FieldPermission {
    pub fn read_only(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            accessible: true,
            updateable: false,
            label: Some(label.into()),
            field_type,
        }
    }

    pub fn editable(label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            updateable: true,
            ..Self::read_only(label, field_type)
        }
    }

    pub fn hidden(field_type: FieldType) -> Self {
        Self {
            accessible: false,
            updateable: false,
            label: None,
            field_type,
        }
    }
}

/// Field name to permission map of one object type
pub type FieldPermissions = HashMap<String, FieldPermission>;

/// Where field permissions come from
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn field_permissions(&self, object_type: &str) -> RevOpsResult<FieldPermissions>;
}

#[derive(Debug, Clone)]
enum LoadState {
    Loading,
    Loaded(Arc<FieldPermissions>),
    Unavailable,
}

/// Snapshot of one object type's permissions
#[derive(Debug, Clone, Default)]
pub struct ObjectFieldAccess {
    permissions: Option<Arc<FieldPermissions>>,
}

impl ObjectFieldAccess {
    /// Access with no permission data (loading or failed)
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn from_permissions(permissions: FieldPermissions) -> Self {
        Self {
            permissions: Some(Arc::new(permissions)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.permissions.is_some()
    }

    /// Whether the field may be shown; `true` unless the server says otherwise
    pub fn is_accessible(&self, field: &str) -> bool {
        self.get(field).is_none_or(|p| p.accessible)
    }

    /// Whether the field may be edited; `false` unless the server says otherwise
    pub fn is_updateable(&self, field: &str) -> bool {
        self.get(field).is_some_and(|p| p.updateable)
    }

    /// Server label for the field, if one was declared
    pub fn label(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|p| p.label.as_deref())
    }

    pub fn get(&self, field: &str) -> Option<&FieldPermission> {
        self.permissions.as_ref().and_then(|map| map.get(field))
    }
}

/// Read-through permission cache keyed by object type
pub struct FieldPermissionGate {
    source: Arc<dyn PermissionSource>,
    entries: RwLock<HashMap<String, LoadState>>,
}

impl FieldPermissionGate {
    pub fn new(source: Arc<dyn PermissionSource>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Current snapshot without fetching
    pub fn access(&self, object_type: &str) -> ObjectFieldAccess {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(object_type) {
            Some(LoadState::Loaded(map)) => ObjectFieldAccess {
                permissions: Some(Arc::clone(map)),
            },
            _ => ObjectFieldAccess::unknown(),
        }
    }

    pub fn is_loading(&self, object_type: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        matches!(entries.get(object_type), Some(LoadState::Loading))
    }

    /// Snapshot for `object_type`, fetching it on first use
    ///
    /// A failed fetch is logged and leaves the fail-open/fail-closed
    /// defaults in effect; a later call tries again.
    pub async fn load(&self, object_type: &str) -> ObjectFieldAccess {
        let cached = self.access(object_type);
        if cached.is_loaded() {
            return cached;
        }
        self.refresh(object_type).await
    }

    /// Refetch `object_type` and replace its cached map wholesale
    pub async fn refresh(&self, object_type: &str) -> ObjectFieldAccess {
        self.set_state(object_type, LoadState::Loading);

        match self.source.field_permissions(object_type).await {
            Ok(permissions) => {
                tracing::debug!(
                    object_type,
                    fields = permissions.len(),
                    "loaded field permissions"
                );
                let map = Arc::new(permissions);
                self.set_state(object_type, LoadState::Loaded(Arc::clone(&map)));
                ObjectFieldAccess {
                    permissions: Some(map),
                }
            }
            Err(e) => {
                tracing::warn!(
                    object_type,
                    error = %e,
                    "field permissions unavailable, using defaults"
                );
                self.set_state(object_type, LoadState::Unavailable);
                ObjectFieldAccess::unknown()
            }
        }
    }

    /// Drop the cached map so the next [`load`](Self::load) refetches
    pub fn invalidate(&self, object_type: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(object_type);
    }

    fn set_state(&self, object_type: &str, state: LoadState) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // A concurrent refresh that already finished wins over our "loading" mark
        if matches!(state, LoadState::Loading)
            && matches!(entries.get(object_type), Some(LoadState::Loaded(_)))
        {
            return;
        }
        entries.insert(object_type.to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{RevOpsError, TransportError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StaticSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl PermissionSource for StaticSource {
        async fn field_permissions(&self, object_type: &str) -> RevOpsResult<FieldPermissions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RevOpsError::Transport(TransportError::Timeout {
                    url: format!("/api/metadata/fields/{}", object_type),
                }));
            }
            let mut map = FieldPermissions::new();
            map.insert(
                "AnnualRevenue".to_string(),
                FieldPermission::hidden(FieldType::Number),
            );
            map.insert(
                "Name".to_string(),
                FieldPermission::editable("Account Name", FieldType::String),
            );
            map.insert(
                "Industry".to_string(),
                FieldPermission::read_only("Industry", FieldType::Picklist),
            );
            Ok(map)
        }
    }

    #[test]
    fn test_unknown_access_defaults() {
        let access = ObjectFieldAccess::unknown();
        assert!(access.is_accessible("AnyField"));
        assert!(!access.is_updateable("AnyField"));
    }

    #[tokio::test]
    async fn test_loaded_map_is_authoritative() {
        let gate = FieldPermissionGate::new(StaticSource::new(false));
        let access = gate.load("Account").await;

        assert!(access.is_loaded());
        assert!(!access.is_accessible("AnnualRevenue"));
        assert!(access.is_accessible("Industry"));
        assert!(!access.is_updateable("Industry"));
        assert!(access.is_updateable("Name"));
        assert_eq!(access.label("Name"), Some("Account Name"));
    }

    #[tokio::test]
    async fn test_absent_field_after_load() {
        let gate = FieldPermissionGate::new(StaticSource::new(false));
        let access = gate.load("Account").await;
        assert!(access.is_accessible("Rating"));
        assert!(!access.is_updateable("Rating"));
    }

    #[tokio::test]
    async fn test_load_is_read_through() {
        let source = StaticSource::new(false);
        let gate = FieldPermissionGate::new(source.clone());

        gate.load("Account").await;
        gate.load("Account").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        gate.refresh("Account").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        gate.invalidate("Account");
        assert!(!gate.access("Account").is_loaded());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_defaults() {
        let source = StaticSource::new(true);
        let gate = FieldPermissionGate::new(source.clone());

        let access = gate.load("Account").await;
        assert!(!access.is_loaded());
        assert!(access.is_accessible("AnnualRevenue"));
        assert!(!access.is_updateable("Name"));
        assert!(!gate.is_loading("Account"));

        gate.load("Account").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_permission_json_shape() {
        let parsed: FieldPermissions = serde_json::from_str(
            r#"{"Amount":{"accessible":true,"updateable":false,"label":"Amount","type":"currency"}}"#,
        )
        .unwrap();
        let amount = &parsed["Amount"];
        assert_eq!(amount.field_type, FieldType::String);
        assert_eq!(amount.label.as_deref(), Some("Amount"));
    }
}
