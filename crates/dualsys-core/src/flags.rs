//! Feature flag evaluation
//!
//! The router asks one question per flag: "is capability X enabled". Flag
//! sources are synchronous and side-effect free; flag values may change at
//! runtime and are re-read on every routed call.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;

/// Route reads to the target service
pub const TARGET_READ: &str = "personality.target.read";
/// Route writes to the target service
pub const TARGET_WRITE: &str = "personality.target.write";
/// Mirror legacy writes into the target service
pub const DUAL_WRITE: &str = "personality.target.dual-write";
/// Shadow reads against the target service and diff the results
pub const COMPARISON_TESTING: &str = "personality.target.comparison-testing";

/// Every flag the router consults
pub const ROUTING_FLAGS: [&str; 4] = [TARGET_READ, TARGET_WRITE, DUAL_WRITE, COMPARISON_TESTING];

/// Boolean flag lookup
#[cfg_attr(test, mockall::automock)]
pub trait FlagSource: Send + Sync {
    /// Whether `key` is enabled; unknown keys are disabled
    fn is_enabled(&self, key: &str) -> bool;
}

/// Routing flags read at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlagSnapshot {
    /// `personality.target.read`
    pub target_read: bool,
    /// `personality.target.write`
    pub target_write: bool,
    /// `personality.target.dual-write`
    pub dual_write: bool,
    /// `personality.target.comparison-testing`
    pub comparison: bool,
}

impl FlagSnapshot {
    /// Read the routing flags from `source`
    #[must_use]
    pub fn capture(source: &dyn FlagSource) -> Self {
        Self {
            target_read: source.is_enabled(TARGET_READ),
            target_write: source.is_enabled(TARGET_WRITE),
            dual_write: source.is_enabled(DUAL_WRITE),
            comparison: source.is_enabled(COMPARISON_TESTING),
        }
    }

    /// Whether any traffic is served by the target service
    #[inline]
    #[must_use]
    pub fn target_active(&self) -> bool {
        self.target_read || self.target_write
    }
}

/// In-memory flag table
///
/// Runtime toggles through `enable`/`disable`/`set` are visible to the next
/// routed call.
#[derive(Debug, Default)]
pub struct FeatureFlags {
    values: RwLock<BTreeMap<String, bool>>,
}

impl FeatureFlags {
    /// Create table with every flag disabled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create table from initial values
    #[must_use]
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Create table from a loaded configuration
    #[must_use]
    pub fn from_config(config: &crate::config::MigrationConfig) -> Self {
        Self::from_values(config.flags.iter().map(|(k, v)| (k.clone(), *v)))
    }

    /// Set a flag
    pub fn set(&self, key: impl Into<String>, enabled: bool) {
        let key = key.into();
        tracing::info!(flag = %key, enabled, "feature flag updated");
        self.values.write().insert(key, enabled);
    }

    /// Enable a flag
    #[inline]
    pub fn enable(&self, key: impl Into<String>) {
        self.set(key, true);
    }

    /// Disable a flag
    #[inline]
    pub fn disable(&self, key: impl Into<String>) {
        self.set(key, false);
    }

    /// Current flag values
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.values.read().clone()
    }
}

impl FlagSource for FeatureFlags {
    fn is_enabled(&self, key: &str) -> bool {
        self.values.read().get(key).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_flags_are_disabled() {
        let flags = FeatureFlags::new();
        assert!(!flags.is_enabled("nope"));
    }

    #[test]
    fn runtime_toggle() {
        let flags = FeatureFlags::new();
        flags.enable(TARGET_READ);
        assert!(flags.is_enabled(TARGET_READ));

        flags.disable(TARGET_READ);
        assert!(!flags.is_enabled(TARGET_READ));
    }

    #[test]
    fn from_values_and_snapshot() {
        let flags = FeatureFlags::from_values([(DUAL_WRITE, true), (TARGET_WRITE, false)]);
        let snap = flags.snapshot();
        assert_eq!(snap.get(DUAL_WRITE), Some(&true));
        assert_eq!(snap.get(TARGET_WRITE), Some(&false));
    }

    #[test]
    fn capture_reads_each_flag_once() {
        let mut mock = MockFlagSource::new();
        mock.expect_is_enabled()
            .withf(|k| k == COMPARISON_TESTING || k == TARGET_READ)
            .times(2)
            .return_const(true);
        mock.expect_is_enabled()
            .withf(|k| k == TARGET_WRITE || k == DUAL_WRITE)
            .times(2)
            .return_const(false);

        let snap = FlagSnapshot::capture(&mock);
        assert!(snap.comparison);
        assert!(snap.target_read);
        assert!(!snap.dual_write);
        assert!(snap.target_active());
    }
}
