//! REST client for the dashboard backend
//!
//! Every call is an idempotent GET with a hard timeout; timeouts,
//! connection failures and 5xx answers are retried under the configured
//! [`RetryPolicy`]. Payloads are decoded into typed records at this
//! boundary.

pub mod cache;
pub mod retry;

pub use cache::{DEFAULT_CACHE_CAPACITY, QueryCache};
pub use retry::RetryPolicy;

use crate::config::ClientConfig;
use crate::core::error::{ErrorResponse, RevOpsResult, TransportError};
use crate::core::grouping::AccountGroup;
use crate::core::permission::{FieldPermissions, PermissionSource};
use crate::core::record::{Account, CurrentUser, GroupedListResponse, ListResponse, Opportunity};
use crate::core::scope::ScopeDefaults;
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// Header identifying the caller to the backend
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: Client,
    base_url: Url,
    retry: RetryPolicy,
    user_id: Option<String>,
}

impl DashboardClient {
    /// Build a client from the transport section of the config
    pub fn new(config: &ClientConfig) -> RevOpsResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| TransportError::InvalidUrl {
            url: config.base_url.clone(),
            message: e.to_string(),
        })?;

        let http = Client::builder().timeout(config.timeout()).build()?;

        tracing::debug!(
            base_url = %base_url,
            timeout_ms = config.timeout_ms,
            max_retries = config.max_retries,
            "initialized dashboard client"
        );

        Ok(Self {
            http,
            base_url,
            retry: RetryPolicy::from_config(config),
            user_id: None,
        })
    }

    /// Send requests on behalf of `user_id`
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// `GET /api/accounts`
    pub async fn list_accounts(
        &self,
        params: &IndexMap<String, String>,
    ) -> RevOpsResult<Vec<Account>> {
        let body: ListResponse<Account> = self.get_json(&["api", "accounts"], params).await?;
        Ok(body.records)
    }

    /// `GET /api/accounts?grouped=true`
    pub async fn list_accounts_grouped(
        &self,
        params: &IndexMap<String, String>,
    ) -> RevOpsResult<Vec<AccountGroup<Account>>> {
        let mut params = params.clone();
        params.insert("grouped".to_string(), "true".to_string());
        let body: GroupedListResponse<Account> =
            self.get_json(&["api", "accounts"], &params).await?;
        Ok(body.groups)
    }

    /// `GET /api/opportunities`, optionally with closed ones
    pub async fn list_opportunities(
        &self,
        params: &IndexMap<String, String>,
        include_closed: bool,
    ) -> RevOpsResult<Vec<Opportunity>> {
        let mut params = params.clone();
        if include_closed {
            params.insert("includeClosed".to_string(), "true".to_string());
        }
        let body: ListResponse<Opportunity> =
            self.get_json(&["api", "opportunities"], &params).await?;
        Ok(body.records)
    }

    /// `GET /api/metadata/scope-defaults`
    pub async fn scope_defaults(&self) -> RevOpsResult<ScopeDefaults> {
        self.get_json(&["api", "metadata", "scope-defaults"], &IndexMap::new())
            .await
    }

    /// `GET /api/metadata/fields/{objectType}`
    pub async fn field_permissions(&self, object_type: &str) -> RevOpsResult<FieldPermissions> {
        self.get_json(&["api", "metadata", "fields", object_type], &IndexMap::new())
            .await
    }

    /// `GET /api/user/me`
    pub async fn current_user(&self) -> RevOpsResult<CurrentUser> {
        self.get_json(&["api", "user", "me"], &IndexMap::new()).await
    }

    fn endpoint(&self, segments: &[&str]) -> RevOpsResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &IndexMap<String, String>,
    ) -> RevOpsResult<T> {
        let url = self.endpoint(segments)?;
        let label = url.path().to_string();
        self.retry
            .run(&label, || self.get_once(&url, params))
            .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &IndexMap<String, String>,
    ) -> RevOpsResult<T> {
        let mut request = self.http.get(url.clone()).query(params);
        if let Some(user_id) = &self.user_id {
            request = request.header(USER_HEADER, user_id);
        }

        tracing::debug!(url = %url, params = params.len(), "GET");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl PermissionSource for DashboardClient {
    async fn field_permissions(&self, object_type: &str) -> RevOpsResult<FieldPermissions> {
        DashboardClient::field_permissions(self, object_type).await
    }
}
