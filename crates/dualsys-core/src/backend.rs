//! Backend contracts
//!
//! The router sits between callers and two interchangeable stores. Neither
//! trait says anything about persistence; both are `Send + Sync` so one
//! instance can be shared behind an `Arc`.

use crate::error::BackendError;
use crate::types::{CreateOptions, LegacyPersonality, Personality};
use async_trait::async_trait;

/// The established personality store
///
/// `get` resolves a name first and falls back to alias lookup internally.
#[async_trait]
pub trait LegacyRegistry: Send + Sync + std::fmt::Debug {
    /// Look up by name, then by alias
    async fn get(&self, name: &str) -> Result<Option<LegacyPersonality>, BackendError>;

    /// All personalities, ordered by name
    async fn list(&self) -> Result<Vec<LegacyPersonality>, BackendError>;

    /// Register a new personality
    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<LegacyPersonality, BackendError>;

    /// Remove a personality owned by `requester`
    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError>;

    /// Attach an alias to a personality owned by `requester`
    async fn add_alias(&self, name: &str, alias: &str, requester: &str)
        -> Result<(), BackendError>;
}

/// The newer personality service
///
/// Name and alias resolution are separate calls.
#[async_trait]
pub trait TargetService: Send + Sync + std::fmt::Debug {
    /// Look up by exact name
    async fn find_by_name(&self, name: &str) -> Result<Option<Personality>, BackendError>;

    /// Look up by alias
    async fn find_by_alias(&self, alias: &str) -> Result<Option<Personality>, BackendError>;

    /// All personalities, ordered by name
    async fn list(&self) -> Result<Vec<Personality>, BackendError>;

    /// Register a new personality
    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<Personality, BackendError>;

    /// Remove a personality owned by `requester`
    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError>;

    /// Attach an alias to a personality owned by `requester`
    async fn add_alias(&self, name: &str, alias: &str, requester: &str)
        -> Result<(), BackendError>;
}
