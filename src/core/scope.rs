//! Ownership scope (mine / team / all) and role-based defaults

use crate::core::record::CurrentUser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Ownership-based narrowing of a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipScope {
    /// Records owned by the current user
    #[default]
    Mine,
    /// Records owned by the current user or their team
    Team,
    /// No ownership narrowing
    All,
}

impl OwnershipScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnershipScope::Mine => "mine",
            OwnershipScope::Team => "team",
            OwnershipScope::All => "all",
        }
    }

    /// Whether a record owned by `owner_id` is visible to `user` under this scope
    pub fn admits(&self, owner_id: Option<&str>, user: &CurrentUser) -> bool {
        match self {
            OwnershipScope::All => true,
            OwnershipScope::Mine => owner_id == Some(user.id.as_str()),
            OwnershipScope::Team => owner_id.is_some_and(|owner| {
                owner == user.id || user.team_member_ids.iter().any(|m| m == owner)
            }),
        }
    }
}

impl fmt::Display for OwnershipScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnershipScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mine" => Ok(OwnershipScope::Mine),
            "team" => Ok(OwnershipScope::Team),
            "all" => Ok(OwnershipScope::All),
            other => Err(format!("unknown scope '{}'", other)),
        }
    }
}

/// Server-supplied mapping from role to its default scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeDefaults(HashMap<String, OwnershipScope>);

impl ScopeDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: impl Into<String>, scope: OwnershipScope) -> Self {
        self.0.insert(role.into(), scope);
        self
    }

    pub fn get(&self, role: &str) -> Option<OwnershipScope> {
        self.0.get(role).copied()
    }

    /// Default scope for a role; `mine` when the role has no entry
    pub fn resolve(&self, role: &str) -> OwnershipScope {
        resolve_default_scope(role, self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OwnershipScope)> for ScopeDefaults {
    fn from_iter<I: IntoIterator<Item = (String, OwnershipScope)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolve the initial scope shown to a user of `role`
pub fn resolve_default_scope(role: &str, defaults: &ScopeDefaults) -> OwnershipScope {
    defaults.get(role).unwrap_or(OwnershipScope::Mine)
}
