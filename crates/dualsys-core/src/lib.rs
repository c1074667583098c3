//! Dualsys Core - flag-driven dual-system routing
//!
//! Lets a legacy personality store and its replacement coexist while traffic
//! shifts from one to the other:
//! - Evaluates routing flags on every call and picks a dispatch mode
//! - Adapts target-shaped results into the legacy shape
//! - Shadow-compares reads without changing what callers see
//! - Mirrors writes into the target store without risking the primary write
//! - Counts every routed call
//!
//! # Example
//!
//! ```rust,ignore
//! use dualsys_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MigrationConfig::load("migration.toml")?;
//! let flags = Arc::new(config.feature_flags());
//! let router = build_router(
//!     &config,
//!     Arc::new(InMemoryLegacyRegistry::new()),
//!     Arc::new(InMemoryTargetService::new()),
//!     flags.clone(),
//! );
//!
//! flags.enable(flags::COMPARISON_TESTING);
//! let albert = router.get("albert").await?;
//! println!("{:?}", router.routing_statistics());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod backend;
pub mod config;
pub mod error;
pub mod flags;
pub mod memory;
pub mod mode;
pub mod router;
pub mod stats;
pub mod types;

pub use adapter::to_legacy;
pub use backend::{LegacyRegistry, TargetService};
pub use config::{env_var_name, MigrationConfig, FLAG_ENV_PREFIX};
pub use error::{Backend, BackendError, ConfigError, RouterError};
pub use flags::{FeatureFlags, FlagSnapshot, FlagSource};
pub use memory::{InMemoryLegacyRegistry, InMemoryTargetService};
pub use mode::{DispatchMode, OperationClass};
pub use router::MigrationRouter;
pub use stats::{RouteKind, RoutingCounters, RoutingStatistics};
pub use types::{
    CreateOptions, CreateOutcome, LegacyPersonality, Personality, PersonalityAlias,
    PersonalityProfile, WriteOutcome,
};

use dualsys_shadow::ShadowComparator;
use std::sync::Arc;

/// Wire one router and its comparator from configuration
///
/// The comparator is built from `config.comparator`; flag values are taken
/// from `flags`, not from `config.flags`, so callers can keep toggling them.
#[must_use]
pub fn build_router(
    config: &MigrationConfig,
    legacy: Arc<dyn LegacyRegistry>,
    target: Arc<dyn TargetService>,
    flags: Arc<dyn FlagSource>,
) -> MigrationRouter {
    let comparator = Arc::new(ShadowComparator::new(config.comparator.clone()));
    tracing::info!(
        log_discrepancies = config.comparator.log_discrepancies,
        throw_on_mismatch = config.comparator.throw_on_mismatch,
        "migration router ready"
    );
    MigrationRouter::new(legacy, target, flags).with_comparator(comparator)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the router
    pub use crate::flags;
    pub use crate::{
        build_router, CreateOptions, DispatchMode, FeatureFlags, FlagSource,
        InMemoryLegacyRegistry, InMemoryTargetService, LegacyPersonality, MigrationConfig,
        MigrationRouter, OperationClass, RoutingStatistics,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use dualsys_shadow::ComparatorConfig;

    #[tokio::test]
    async fn build_router_uses_configured_comparator() {
        let config = MigrationConfig::new()
            .with_flag(flags::COMPARISON_TESTING, true)
            .with_comparator(ComparatorConfig::new().with_throw_on_mismatch(true));
        let flags = Arc::new(config.feature_flags());
        let router = build_router(
            &config,
            Arc::new(InMemoryLegacyRegistry::new()),
            Arc::new(InMemoryTargetService::new()),
            flags,
        );

        assert!(router.comparator().config().throw_on_mismatch);
        // shadow reads never raise, even when the comparator gates
        assert!(router.get("missing").await.unwrap().is_none());
        assert_eq!(router.routing_statistics().comparison_tests, 1);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
