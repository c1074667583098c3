//! Domain shapes for both backends
//!
//! The legacy store and the target service describe the same personality
//! with different layouts. Callers of the router only ever see
//! [`LegacyPersonality`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Personality as the legacy store represents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPersonality {
    /// Unique personality name
    pub full_name: String,
    /// Name shown in chat
    pub display_name: Option<String>,
    /// Owning user id
    pub owner: String,
    /// Alternative lookup names
    pub aliases: Vec<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Whether the personality may produce NSFW content
    pub nsfw_content: bool,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Reply length cap
    pub max_word_count: Option<u32>,
}

/// Personality as the target service represents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    /// Unique personality name
    pub name: String,
    /// Owning user id
    pub owner_id: String,
    /// Alias records
    pub aliases: Vec<PersonalityAlias>,
    /// Presentation and generation settings
    pub profile: Option<PersonalityProfile>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Alias record in the target model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityAlias {
    /// Alias text
    pub alias: String,
}

impl PersonalityAlias {
    /// Create alias
    #[inline]
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }
}

/// Profile section of the target model
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityProfile {
    /// Name shown in chat
    pub display_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// NSFW flag
    #[serde(rename = "isNSFW")]
    pub is_nsfw: Option<bool>,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Reply length cap
    pub max_word_count: Option<u32>,
}

/// Optional settings supplied when registering a personality
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    /// Name shown in chat; defaults to the personality name
    pub display_name: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// NSFW flag
    pub nsfw_content: bool,
    /// Sampling temperature
    pub temperature: Option<f64>,
    /// Reply length cap
    pub max_word_count: Option<u32>,
}

impl CreateOptions {
    /// Create empty options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// With avatar URL
    #[inline]
    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// With NSFW flag
    #[inline]
    #[must_use]
    pub fn with_nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw_content = nsfw;
        self
    }

    /// With temperature
    #[inline]
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// With reply length cap
    #[inline]
    #[must_use]
    pub fn with_max_word_count(mut self, count: u32) -> Self {
        self.max_word_count = Some(count);
        self
    }
}

/// Result of `create`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOutcome {
    /// Whether the personality was created
    pub success: bool,
    /// The created personality, legacy-shaped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<LegacyPersonality>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateOutcome {
    /// Successful creation
    #[inline]
    #[must_use]
    pub fn created(entity: LegacyPersonality) -> Self {
        Self {
            success: true,
            entity: Some(entity),
            error: None,
        }
    }

    /// Failed creation
    #[inline]
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            entity: None,
            error: Some(error.into()),
        }
    }
}

/// Result of `remove` and `add_alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Whether the write took effect
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl WriteOutcome {
    /// Successful write
    #[inline]
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed write
    #[inline]
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
