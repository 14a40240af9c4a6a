//! Service trait for the record backend

use crate::core::record::{Account, CurrentUser, Opportunity};
use anyhow::Result;
use async_trait::async_trait;

/// Read access to the CRM records served by the list endpoints
///
/// Implementations return the full unnarrowed set; scope, filters, search
/// and sort are applied by the list pipeline on top.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All accounts
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// All opportunities, closed ones included
    async fn opportunities(&self) -> Result<Vec<Opportunity>>;

    /// Look up a user by id
    async fn user(&self, id: &str) -> Result<Option<CurrentUser>>;
}
