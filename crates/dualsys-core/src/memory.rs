//! In-memory backends
//!
//! Reference implementations of [`LegacyRegistry`] and [`TargetService`]
//! over `DashMap`. They enforce the same rules a real store would: unique
//! names and aliases, ownership checks on mutation, sorted listing.

use crate::backend::{LegacyRegistry, TargetService};
use crate::error::BackendError;
use crate::types::{
    CreateOptions, LegacyPersonality, Personality, PersonalityAlias, PersonalityProfile,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

fn validate_name(name: &str) -> Result<(), BackendError> {
    if name.trim().is_empty() {
        return Err(BackendError::Invalid("name must not be empty".into()));
    }
    Ok(())
}

fn check_owner(owner: &str, name: &str, requester: &str) -> Result<(), BackendError> {
    if owner == requester {
        Ok(())
    } else {
        Err(BackendError::Unauthorized {
            name: name.to_string(),
            requester: requester.to_string(),
        })
    }
}

/// Alias index shared by both stores: alias -> owning name
#[derive(Debug, Default)]
struct AliasIndex {
    aliases: DashMap<String, String>,
}

impl AliasIndex {
    fn resolve(&self, alias: &str) -> Option<String> {
        self.aliases.get(alias).map(|r| r.value().clone())
    }

    fn reserve(&self, alias: &str, name: &str) -> Result<(), BackendError> {
        match self.aliases.entry(alias.to_string()) {
            Entry::Occupied(_) => Err(BackendError::AlreadyExists(alias.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(name.to_string());
                Ok(())
            }
        }
    }

    fn release(&self, alias: &str) {
        self.aliases.remove(alias);
    }

    fn release_all(&self, name: &str) {
        self.aliases.retain(|_, owner| owner.as_str() != name);
    }
}

/// Legacy store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryLegacyRegistry {
    entries: DashMap<String, LegacyPersonality>,
    aliases: AliasIndex,
}

impl InMemoryLegacyRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered personalities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LegacyRegistry for InMemoryLegacyRegistry {
    async fn get(&self, name: &str) -> Result<Option<LegacyPersonality>, BackendError> {
        if let Some(found) = self.entries.get(name) {
            return Ok(Some(found.value().clone()));
        }
        Ok(self
            .aliases
            .resolve(name)
            .and_then(|owner| self.entries.get(&owner).map(|r| r.value().clone())))
    }

    async fn list(&self) -> Result<Vec<LegacyPersonality>, BackendError> {
        let mut all: Vec<_> = self.entries.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(all)
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<LegacyPersonality, BackendError> {
        validate_name(name)?;
        if self.aliases.resolve(name).is_some() {
            return Err(BackendError::AlreadyExists(name.to_string()));
        }
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(BackendError::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                let personality = LegacyPersonality {
                    full_name: name.to_string(),
                    display_name: Some(
                        options.display_name.clone().unwrap_or_else(|| name.to_string()),
                    ),
                    owner: owner_id.to_string(),
                    aliases: Vec::new(),
                    avatar_url: options.avatar_url.clone(),
                    nsfw_content: options.nsfw_content,
                    temperature: options.temperature,
                    max_word_count: options.max_word_count,
                };
                slot.insert(personality.clone());
                tracing::debug!(name, owner = owner_id, "legacy personality registered");
                Ok(personality)
            }
        }
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        let owner = self
            .entries
            .get(name)
            .map(|r| r.value().owner.clone())
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        check_owner(&owner, name, requester)?;

        self.entries.remove(name);
        self.aliases.release_all(name);
        Ok(())
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        validate_name(alias)?;
        let owner = self
            .entries
            .get(name)
            .map(|r| r.value().owner.clone())
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        check_owner(&owner, name, requester)?;
        if self.entries.contains_key(alias) {
            return Err(BackendError::AlreadyExists(alias.to_string()));
        }

        self.aliases.reserve(alias, name)?;
        match self.entries.get_mut(name) {
            Some(mut entry) => {
                entry.aliases.push(alias.to_string());
                Ok(())
            }
            None => {
                self.aliases.release(alias);
                Err(BackendError::NotFound(name.to_string()))
            }
        }
    }
}

/// Target service kept in memory
#[derive(Debug, Default)]
pub struct InMemoryTargetService {
    entries: DashMap<String, Personality>,
    aliases: AliasIndex,
}

impl InMemoryTargetService {
    /// Create empty service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored personalities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TargetService for InMemoryTargetService {
    async fn find_by_name(&self, name: &str) -> Result<Option<Personality>, BackendError> {
        Ok(self.entries.get(name).map(|r| r.value().clone()))
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<Personality>, BackendError> {
        Ok(self
            .aliases
            .resolve(alias)
            .and_then(|owner| self.entries.get(&owner).map(|r| r.value().clone())))
    }

    async fn list(&self) -> Result<Vec<Personality>, BackendError> {
        let mut all: Vec<_> = self.entries.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<Personality, BackendError> {
        validate_name(name)?;
        if self.aliases.resolve(name).is_some() {
            return Err(BackendError::AlreadyExists(name.to_string()));
        }
        match self.entries.entry(name.to_string()) {
            Entry::Occupied(_) => Err(BackendError::AlreadyExists(name.to_string())),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let personality = Personality {
                    name: name.to_string(),
                    owner_id: owner_id.to_string(),
                    aliases: Vec::new(),
                    profile: Some(PersonalityProfile {
                        display_name: Some(
                            options.display_name.clone().unwrap_or_else(|| name.to_string()),
                        ),
                        avatar_url: options.avatar_url.clone(),
                        is_nsfw: Some(options.nsfw_content),
                        temperature: options.temperature,
                        max_word_count: options.max_word_count,
                    }),
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(personality.clone());
                tracing::debug!(name, owner = owner_id, "target personality registered");
                Ok(personality)
            }
        }
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        let owner = self
            .entries
            .get(name)
            .map(|r| r.value().owner_id.clone())
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        check_owner(&owner, name, requester)?;

        self.entries.remove(name);
        self.aliases.release_all(name);
        Ok(())
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        validate_name(alias)?;
        let owner = self
            .entries
            .get(name)
            .map(|r| r.value().owner_id.clone())
            .ok_or_else(|| BackendError::NotFound(name.to_string()))?;
        check_owner(&owner, name, requester)?;
        if self.entries.contains_key(alias) {
            return Err(BackendError::AlreadyExists(alias.to_string()));
        }

        self.aliases.reserve(alias, name)?;
        match self.entries.get_mut(name) {
            Some(mut entry) => {
                entry.aliases.push(PersonalityAlias::new(alias));
                entry.updated_at = Utc::now();
                Ok(())
            }
            None => {
                self.aliases.release(alias);
                Err(BackendError::NotFound(name.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::to_legacy;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn legacy_resolves_alias() {
        let reg = InMemoryLegacyRegistry::new();
        reg.register("albert", "u1", &CreateOptions::new()).await.unwrap();
        reg.add_alias("albert", "al", "u1").await.unwrap();

        let found = reg.get("al").await.unwrap().unwrap();
        assert_eq!(found.full_name, "albert");
        assert_eq!(found.display_name.as_deref(), Some("albert"));
        assert!(reg.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_names_rejected() {
        let reg = InMemoryLegacyRegistry::new();
        reg.register("albert", "u1", &CreateOptions::new()).await.unwrap();
        reg.add_alias("albert", "al", "u1").await.unwrap();

        let err = reg.register("albert", "u2", &CreateOptions::new()).await.unwrap_err();
        assert_eq!(err, BackendError::AlreadyExists("albert".into()));
        let err = reg.register("al", "u2", &CreateOptions::new()).await.unwrap_err();
        assert_eq!(err, BackendError::AlreadyExists("al".into()));
        let err = reg.register("  ", "u2", &CreateOptions::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Invalid(_)));
    }

    #[tokio::test]
    async fn ownership_enforced() {
        let svc = InMemoryTargetService::new();
        svc.register("albert", "u1", &CreateOptions::new()).await.unwrap();

        let err = svc.remove("albert", "u2").await.unwrap_err();
        assert!(err.is_unauthorized());
        let err = svc.add_alias("albert", "al", "u2").await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(svc.find_by_alias("al").await.unwrap().is_none());

        svc.remove("albert", "u1").await.unwrap();
        assert!(svc.is_empty());
        assert!(svc.remove("albert", "u1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn remove_releases_aliases() {
        let svc = InMemoryTargetService::new();
        svc.register("albert", "u1", &CreateOptions::new()).await.unwrap();
        svc.add_alias("albert", "al", "u1").await.unwrap();
        svc.remove("albert", "u1").await.unwrap();

        assert!(svc.find_by_alias("al").await.unwrap().is_none());
        svc.register("al", "u2", &CreateOptions::new()).await.unwrap();
    }

    #[tokio::test]
    async fn backends_agree_after_adaptation() {
        let reg = InMemoryLegacyRegistry::new();
        let svc = InMemoryTargetService::new();
        let opts = CreateOptions::new()
            .with_display_name("Albert")
            .with_avatar_url("https://img/a.png")
            .with_temperature(0.8);

        let legacy = reg.register("albert", "u1", &opts).await.unwrap();
        let target = svc.register("albert", "u1", &opts).await.unwrap();
        assert_eq!(to_legacy(&target), legacy);
    }

    #[tokio::test]
    async fn lists_sorted_by_name() {
        let svc = InMemoryTargetService::new();
        for name in ["zed", "amy", "mo"] {
            svc.register(name, "u1", &CreateOptions::new()).await.unwrap();
        }
        let names: Vec<_> = svc.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["amy", "mo", "zed"]);
    }
}
