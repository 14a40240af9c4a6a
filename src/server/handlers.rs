//! HTTP handlers for the dashboard API
//!
//! Handlers are thin: they resolve the caller's defaults from the config,
//! validate the request into a [`ListQuery`] and run it over the store's
//! records.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;

use super::extractors::AuthenticatedUser;
use super::pipeline::ListQuery;
use crate::config::{DashboardConfig, ObjectConfig};
use crate::core::error::{RequestError, RevOpsResult};
use crate::core::grouping::group_by_parent;
use crate::core::permission::{FieldPermission, FieldPermissions};
use crate::core::query::ListRequest;
use crate::core::record::{
    Account, CurrentUser, GroupedListResponse, ListResponse, Opportunity, Record,
};
use crate::core::scope::ScopeDefaults;
use crate::core::service::RecordStore;

/// Fields maintained by the CRM itself; readable but never editable
const SYSTEM_FIELDS: &[&str] = &["Id", "CreatedDate", "LastModifiedDate"];

/// Application state shared across handlers
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<DashboardConfig>,
}

impl ServerState {
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<DashboardConfig>) -> Self {
        Self { store, config }
    }

    /// Object config for a record type, 404 when it is not configured
    fn object<T: Record>(&self) -> RevOpsResult<&ObjectConfig> {
        self.object_by_type(T::object_type())
    }

    fn object_by_type(&self, object_type: &str) -> RevOpsResult<&ObjectConfig> {
        self.config.object(object_type).ok_or_else(|| {
            RequestError::UnknownObjectType {
                object_type: object_type.to_string(),
            }
            .into()
        })
    }

    /// Validate `request` against `T`'s catalog with `user`'s role defaults
    fn list_query<T: Record>(
        &self,
        request: &ListRequest,
        user: &CurrentUser,
    ) -> RevOpsResult<(ListQuery, &ObjectConfig)> {
        let object = self.object::<T>()?;
        let scope = self.config.scope_defaults.resolve(&user.role);
        let query = ListQuery::from_request(request, &object.catalog(), &object.list_defaults(scope))?;
        Ok((query, object))
    }
}

/// `GET /api/accounts`
pub async fn list_accounts(
    State(state): State<ServerState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(request): Query<ListRequest>,
) -> RevOpsResult<Response> {
    let (query, object) = state.list_query::<Account>(&request, &user)?;
    let accounts = state.store.accounts().await?;
    let accounts = query.apply(accounts, &object.catalog(), &user);

    if request.grouped() {
        let groups = group_by_parent(accounts);
        Ok(Json(GroupedListResponse::new(groups)).into_response())
    } else {
        Ok(Json(ListResponse::new(accounts)).into_response())
    }
}

/// `GET /api/opportunities`
pub async fn list_opportunities(
    State(state): State<ServerState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(request): Query<ListRequest>,
) -> RevOpsResult<Json<ListResponse<Opportunity>>> {
    let (query, object) = state.list_query::<Opportunity>(&request, &user)?;
    let include_closed = request.include_closed();

    let opportunities: Vec<Opportunity> = state
        .store
        .opportunities()
        .await?
        .into_iter()
        .filter(|o| include_closed || !o.is_closed)
        .collect();

    Ok(Json(ListResponse::new(query.apply(
        opportunities,
        &object.catalog(),
        &user,
    ))))
}

/// `GET /api/metadata/scope-defaults`
pub async fn scope_defaults(
    State(state): State<ServerState>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Json<ScopeDefaults> {
    Json(state.config.scope_defaults.clone())
}

/// `GET /api/metadata/fields/{objectType}`
pub async fn field_metadata(
    State(state): State<ServerState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(object_type): Path<String>,
) -> RevOpsResult<Json<FieldPermissions>> {
    let object = state.object_by_type(&object_type)?;
    Ok(Json(field_permissions(object)))
}

/// `GET /api/user/me`
pub async fn current_user(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUser> {
    Json(user)
}

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "revops"
    }))
}

/// Permission map of a configured object type
pub fn field_permissions(object: &ObjectConfig) -> FieldPermissions {
    object
        .fields
        .iter()
        .map(|field| {
            let permission = if SYSTEM_FIELDS.contains(&field.name.as_str()) {
                FieldPermission::read_only(field.label.clone(), field.field_type)
            } else {
                FieldPermission::editable(field.label.clone(), field.field_type)
            };
            (field.name.clone(), permission)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_permissions_from_config() {
        let config = DashboardConfig::default_config();
        let permissions = field_permissions(config.object("Account").unwrap());

        assert_eq!(permissions.len(), 5);
        assert!(permissions["Name"].updateable);
        assert_eq!(permissions["Name"].label.as_deref(), Some("Account Name"));
        assert!(permissions["CreatedDate"].accessible);
        assert!(!permissions["CreatedDate"].updateable);
    }
}
