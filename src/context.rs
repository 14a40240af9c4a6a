//! Application root context
//!
//! [`AppContext`] owns everything a dashboard session shares: the REST
//! client, the field-permission gate, the per-resource query caches and the
//! search debouncer. It is built once at startup and dropped at the end of
//! the session. List views borrow it; none of its parts is a global.

use crate::client::{DashboardClient, QueryCache};
use crate::config::DashboardConfig;
use crate::core::error::{RequestError, RevOpsResult};
use crate::core::grouping::AccountGroup;
use crate::core::permission::{FieldPermissionGate, ObjectFieldAccess};
use crate::core::query::ListFilterController;
use crate::core::record::{Account, CurrentUser, Opportunity};
use crate::core::scope::{OwnershipScope, ScopeDefaults, resolve_default_scope};
use crate::core::search::SearchDebouncer;
use crate::core::url_state::UrlParams;
use std::sync::Arc;

/// Who is signed in and the scope their lists start on
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: CurrentUser,
    pub default_scope: OwnershipScope,
}

pub struct AppContext {
    config: DashboardConfig,
    client: Arc<DashboardClient>,
    permissions: FieldPermissionGate,
    accounts: QueryCache<Vec<Account>>,
    account_groups: QueryCache<Vec<AccountGroup<Account>>>,
    open_opportunities: QueryCache<Vec<Opportunity>>,
    all_opportunities: QueryCache<Vec<Opportunity>>,
    search: SearchDebouncer,
}

impl AppContext {
    /// Build a context with a client taken from the config
    pub fn new(config: DashboardConfig) -> RevOpsResult<Self> {
        let client = DashboardClient::new(&config.client)?;
        Ok(Self::with_client(config, client))
    }

    /// Build a context around an already configured client
    pub fn with_client(config: DashboardConfig, client: DashboardClient) -> Self {
        let client = Arc::new(client);
        let search = SearchDebouncer::new(config.client.search_debounce());

        Self {
            permissions: FieldPermissionGate::new(client.clone()),
            client,
            accounts: QueryCache::new(),
            account_groups: QueryCache::new(),
            open_opportunities: QueryCache::new(),
            all_opportunities: QueryCache::new(),
            search,
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn client(&self) -> &DashboardClient {
        &self.client
    }

    pub fn permissions(&self) -> &FieldPermissionGate {
        &self.permissions
    }

    pub fn search(&self) -> &SearchDebouncer {
        &self.search
    }

    pub fn accounts(&self) -> &QueryCache<Vec<Account>> {
        &self.accounts
    }

    pub fn account_groups(&self) -> &QueryCache<Vec<AccountGroup<Account>>> {
        &self.account_groups
    }

    /// Cache for opportunity lists, split by the `includeClosed` flag
    pub fn opportunities(&self, include_closed: bool) -> &QueryCache<Vec<Opportunity>> {
        if include_closed {
            &self.all_opportunities
        } else {
            &self.open_opportunities
        }
    }

    /// Resolve the signed-in user and their default scope
    ///
    /// A failure to fetch the role defaults is not fatal: the session
    /// starts on `mine`.
    pub async fn bootstrap(&self) -> RevOpsResult<Session> {
        let user = self.client.current_user().await?;

        let defaults = match self.client.scope_defaults().await {
            Ok(defaults) => defaults,
            Err(e) => {
                tracing::warn!(error = %e, "scope defaults unavailable, starting on 'mine'");
                ScopeDefaults::new()
            }
        };
        let default_scope = resolve_default_scope(&user.role, &defaults);

        tracing::info!(
            user = %user.id,
            role = %user.role,
            scope = %default_scope,
            "session started"
        );

        Ok(Session {
            user,
            default_scope,
        })
    }

    /// Controller for a list of `object_type`, seeded from the URL
    pub fn list_controller(
        &self,
        object_type: &str,
        url_query: &str,
        session: &Session,
    ) -> RevOpsResult<ListFilterController> {
        let object = self
            .config
            .object(object_type)
            .ok_or_else(|| RequestError::UnknownObjectType {
                object_type: object_type.to_string(),
            })?;

        Ok(ListFilterController::initialize(
            object.resource.clone(),
            object.catalog(),
            &UrlParams::parse(url_query),
            object.list_defaults(session.default_scope),
        ))
    }

    /// Field access for `object_type`, fetched on first use
    pub async fn field_access(&self, object_type: &str) -> ObjectFieldAccess {
        self.permissions.load(object_type).await
    }

    /// Accounts for the controller's current state
    ///
    /// `Ok(None)` means the state changed while the request was in flight
    /// and the response was not for the view anymore.
    pub async fn load_accounts(
        &self,
        controller: &ListFilterController,
    ) -> RevOpsResult<Option<Arc<Vec<Account>>>> {
        let params = controller.query_params();
        self.accounts
            .load(controller.query_key(), || self.client.list_accounts(&params))
            .await
    }

    pub async fn load_account_groups(
        &self,
        controller: &ListFilterController,
    ) -> RevOpsResult<Option<Arc<Vec<AccountGroup<Account>>>>> {
        let params = controller.query_params();
        self.account_groups
            .load(controller.query_key(), || {
                self.client.list_accounts_grouped(&params)
            })
            .await
    }

    pub async fn load_opportunities(
        &self,
        controller: &ListFilterController,
        include_closed: bool,
    ) -> RevOpsResult<Option<Arc<Vec<Opportunity>>>> {
        let params = controller.query_params();
        self.opportunities(include_closed)
            .load(controller.query_key(), || {
                self.client.list_opportunities(&params, include_closed)
            })
            .await
    }

    /// Debounced free-text search over accounts
    ///
    /// Returns `Ok(None)` when a newer keystroke superseded `text`, either
    /// before the request was sent or while it was in flight.
    pub async fn search_accounts(
        &self,
        controller: &mut ListFilterController,
        text: &str,
    ) -> RevOpsResult<Option<Arc<Vec<Account>>>> {
        let Some(ticket) = self.search.debounce(text).await else {
            return Ok(None);
        };

        controller.set_search(ticket.query());
        let accounts = self.load_accounts(controller).await?;

        if ticket.is_current() {
            Ok(accounts)
        } else {
            tracing::debug!(query = ticket.query(), "discarding superseded search results");
            Ok(None)
        }
    }
}
