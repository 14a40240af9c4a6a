//! In-memory implementation of RecordStore for testing and development

use crate::core::RecordStore;
use crate::core::record::{Account, CurrentUser, Opportunity};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory record store
///
/// Records are kept in insertion order and replaced in place when a record
/// with the same id is inserted again. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    accounts: Arc<RwLock<IndexMap<String, Account>>>,
    opportunities: Arc<RwLock<IndexMap<String, Opportunity>>>,
    users: Arc<RwLock<HashMap<String, CurrentUser>>>,
}

impl InMemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, account: Account) -> Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        accounts.insert(account.id.clone(), account);

        Ok(())
    }

    pub fn insert_opportunity(&self, opportunity: Opportunity) -> Result<()> {
        let mut opportunities = self
            .opportunities
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        opportunities.insert(opportunity.id.clone(), opportunity);

        Ok(())
    }

    pub fn insert_user(&self, user: CurrentUser) -> Result<()> {
        let mut users = self
            .users
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        users.insert(user.id.clone(), user);

        Ok(())
    }

    /// Insert many records at once
    pub fn seed(
        &self,
        accounts: impl IntoIterator<Item = Account>,
        opportunities: impl IntoIterator<Item = Opportunity>,
        users: impl IntoIterator<Item = CurrentUser>,
    ) -> Result<()> {
        for account in accounts {
            self.insert_account(account)?;
        }
        for opportunity in opportunities {
            self.insert_opportunity(opportunity)?;
        }
        for user in users {
            self.insert_user(user)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn accounts(&self) -> Result<Vec<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(accounts.values().cloned().collect())
    }

    async fn opportunities(&self) -> Result<Vec<Opportunity>> {
        let opportunities = self
            .opportunities
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(opportunities.values().cloned().collect())
    }

    async fn user(&self, id: &str) -> Result<Option<CurrentUser>> {
        let users = self
            .users
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(users.get(id).cloned())
    }
}
