//! Target-to-legacy shape adaptation
//!
//! Every legacy field has exactly one source in the target model. Fields the
//! target model lacks fall back to `None`, `false`, or an empty list.

use crate::types::{LegacyPersonality, Personality};

/// Map a target personality into the legacy shape
#[must_use]
pub fn to_legacy(personality: &Personality) -> LegacyPersonality {
    let profile = personality.profile.clone().unwrap_or_default();
    LegacyPersonality {
        full_name: personality.name.clone(),
        display_name: profile.display_name,
        owner: personality.owner_id.clone(),
        aliases: personality
            .aliases
            .iter()
            .map(|a| a.alias.clone())
            .collect(),
        avatar_url: profile.avatar_url,
        nsfw_content: profile.is_nsfw.unwrap_or(false),
        temperature: profile.temperature,
        max_word_count: profile.max_word_count,
    }
}

impl From<&Personality> for LegacyPersonality {
    fn from(personality: &Personality) -> Self {
        to_legacy(personality)
    }
}

impl From<Personality> for LegacyPersonality {
    fn from(personality: Personality) -> Self {
        to_legacy(&personality)
    }
}
