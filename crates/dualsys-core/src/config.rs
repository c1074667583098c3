//! Migration configuration
//!
//! Loaded from TOML or YAML (chosen by file extension), then overlaid with
//! `FEATURE_FLAG_*` environment variables.
//!
//! ```toml
//! [flags]
//! "personality.target.read" = false
//! "personality.target.dual-write" = true
//!
//! [comparator]
//! log_discrepancies = true
//! ignore_fields = ["updatedAt"]
//! ```

use crate::error::ConfigError;
use crate::flags::FeatureFlags;
use dualsys_shadow::ComparatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix of flag override environment variables
pub const FLAG_ENV_PREFIX: &str = "FEATURE_FLAG_";

/// Router and comparator configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Initial flag values by key
    pub flags: BTreeMap<String, bool>,
    /// Shadow comparator settings
    pub comparator: ComparatorConfig,
}

impl MigrationConfig {
    /// Create default configuration (all flags off)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a flag value
    #[inline]
    #[must_use]
    pub fn with_flag(mut self, key: impl Into<String>, enabled: bool) -> Self {
        self.flags.insert(key.into(), enabled);
        self
    }

    /// With comparator settings
    #[inline]
    #[must_use]
    pub fn with_comparator(mut self, comparator: ComparatorConfig) -> Self {
        self.comparator = comparator;
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// `ConfigError::Toml` on syntax or schema errors
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse YAML
    ///
    /// # Errors
    /// `ConfigError::Yaml` on syntax or schema errors
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::UnsupportedFormat` for other extensions
    /// - Parse errors from the matching format
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let parse: fn(&str) -> Result<Self, ConfigError> = match ext.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("yaml" | "yml") => Self::from_yaml_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let source =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        let config = parse(&source)?;
        tracing::info!(path = %path.display(), flags = config.flags.len(), "loaded migration config");
        Ok(config)
    }

    /// Overlay flag values from `FEATURE_FLAG_*` variables
    ///
    /// Only keys already present in `flags` or among the routing flags are
    /// matched; see [`env_var_name`].
    pub fn apply_overrides<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut known: Vec<String> = self.flags.keys().cloned().collect();
        known.extend(crate::flags::ROUTING_FLAGS.iter().map(|k| (*k).to_string()));

        for (name, value) in vars {
            let name = name.as_ref();
            if !name.starts_with(FLAG_ENV_PREFIX) {
                continue;
            }
            let Some(key) = known.iter().find(|k| env_var_name(k) == name) else {
                tracing::debug!(var = name, "ignoring override for unknown flag");
                continue;
            };
            match parse_bool(value.as_ref()) {
                Some(enabled) => {
                    tracing::info!(flag = %key, enabled, "flag overridden from environment");
                    self.flags.insert(key.clone(), enabled);
                }
                None => {
                    tracing::warn!(var = name, value = value.as_ref(), "unrecognised flag value");
                }
            }
        }
    }

    /// Overlay flag values from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Build the in-memory flag table
    #[must_use]
    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags::from_config(self)
    }
}

/// Environment variable overriding flag `key`
///
/// `personality.target.dual-write` becomes
/// `FEATURE_FLAG_PERSONALITY_TARGET_DUAL_WRITE`.
#[must_use]
pub fn env_var_name(key: &str) -> String {
    let mut name = String::with_capacity(FLAG_ENV_PREFIX.len() + key.len());
    name.push_str(FLAG_ENV_PREFIX);
    name.extend(key.chars().map(|c| match c {
        '.' | '-' => '_',
        c => c.to_ascii_uppercase(),
    }));
    name
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{FlagSource, COMPARISON_TESTING, DUAL_WRITE, TARGET_READ};
    use std::io::Write;

    const TOML: &str = r#"
[flags]
"personality.target.read" = true
"personality.target.dual-write" = false

[comparator]
log_discrepancies = false
ignore_fields = ["updatedAt"]
"#;

    #[test]
    fn parses_toml() {
        let config = MigrationConfig::from_toml_str(TOML).unwrap();
        assert_eq!(config.flags.get(TARGET_READ), Some(&true));
        assert!(!config.comparator.log_discrepancies);
        assert!(!config.comparator.throw_on_mismatch);
        assert!(config.comparator.compare_timestamps);
        assert_eq!(config.comparator.ignore_fields, vec!["updatedAt".to_string()]);
    }

    #[test]
    fn parses_yaml() {
        let yaml = "flags:\n  personality.target.comparison-testing: true\ncomparator:\n  throw_on_mismatch: true\n";
        let config = MigrationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.flags.get(COMPARISON_TESTING), Some(&true));
        assert!(config.comparator.throw_on_mismatch);
        assert!(config.comparator.log_discrepancies);
    }

    #[test]
    fn empty_config_is_default() {
        let config = MigrationConfig::from_toml_str("").unwrap();
        assert_eq!(config, MigrationConfig::default());
    }

    #[test]
    fn rejects_bad_toml() {
        let err = MigrationConfig::from_toml_str("[flags\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn env_var_names() {
        assert_eq!(
            env_var_name(DUAL_WRITE),
            "FEATURE_FLAG_PERSONALITY_TARGET_DUAL_WRITE"
        );
    }

    #[test]
    fn overrides_apply_to_known_flags() {
        let mut config = MigrationConfig::new().with_flag(TARGET_READ, true);
        config.apply_overrides([
            ("FEATURE_FLAG_PERSONALITY_TARGET_READ", "off"),
            ("FEATURE_FLAG_PERSONALITY_TARGET_DUAL_WRITE", "yes"),
            ("FEATURE_FLAG_PERSONALITY_TARGET_WRITE", "maybe"),
            ("FEATURE_FLAG_SOMETHING_ELSE", "true"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(config.flags.get(TARGET_READ), Some(&false));
        assert_eq!(config.flags.get(DUAL_WRITE), Some(&true));
        assert_eq!(config.flags.len(), 2);
    }

    #[test]
    fn feature_flags_from_config() {
        let config = MigrationConfig::new().with_flag(COMPARISON_TESTING, true);
        let flags = config.feature_flags();
        assert!(flags.is_enabled(COMPARISON_TESTING));
        assert!(!flags.is_enabled(TARGET_READ));
    }

    #[test]
    fn load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("migration.toml");
        std::fs::File::create(&toml_path)
            .unwrap()
            .write_all(TOML.as_bytes())
            .unwrap();
        let config = MigrationConfig::load(&toml_path).unwrap();
        assert_eq!(config.flags.get(TARGET_READ), Some(&true));

        let other = dir.path().join("migration.ini");
        std::fs::write(&other, "x").unwrap();
        assert!(matches!(
            MigrationConfig::load(&other),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            MigrationConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
