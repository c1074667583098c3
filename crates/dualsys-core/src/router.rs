//! Dual-system router
//!
//! Entry point for personality operations during the migration:
//! - Reads the routing flags on every call and selects a [`DispatchMode`]
//! - Invokes one or both backends, adapting target results to the legacy shape
//! - Shadow-compares reads through the shared [`ShadowComparator`]
//! - Mirrors legacy writes into the target service on a best-effort basis
//! - Counts every routed call
//!
//! Target failures during shadowing or mirroring are logged and swallowed.
//! Failures of the operative backend reach the caller: reads return
//! [`RouterError::Operative`], writes return a `success: false` outcome.

use crate::adapter::to_legacy;
use crate::backend::{LegacyRegistry, TargetService};
use crate::error::{Backend, BackendError, RouterError};
use crate::flags::{FlagSnapshot, FlagSource};
use crate::mode::{DispatchMode, OperationClass};
use crate::stats::{RouteKind, RoutingCounters, RoutingStatistics};
use crate::types::{CreateOptions, CreateOutcome, LegacyPersonality, Personality, WriteOutcome};
use dualsys_shadow::ShadowComparator;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Routes personality operations between the legacy store and the target service
pub struct MigrationRouter {
    legacy: Arc<dyn LegacyRegistry>,
    target: Arc<dyn TargetService>,
    flags: Arc<dyn FlagSource>,
    comparator: Arc<ShadowComparator>,
    counters: RoutingCounters,
}

impl MigrationRouter {
    /// Create router with a default comparator
    #[must_use]
    pub fn new(
        legacy: Arc<dyn LegacyRegistry>,
        target: Arc<dyn TargetService>,
        flags: Arc<dyn FlagSource>,
    ) -> Self {
        Self {
            legacy,
            target,
            flags,
            comparator: Arc::new(ShadowComparator::default()),
            counters: RoutingCounters::new(),
        }
    }

    /// With a shared comparator
    #[inline]
    #[must_use]
    pub fn with_comparator(mut self, comparator: Arc<ShadowComparator>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Comparator used for shadow reads
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> &Arc<ShadowComparator> {
        &self.comparator
    }

    /// Mode the next call of `class` would take
    #[must_use]
    pub fn dispatch_mode(&self, class: OperationClass) -> DispatchMode {
        DispatchMode::select(class, &self.flag_snapshot())
    }

    fn flag_snapshot(&self) -> FlagSnapshot {
        FlagSnapshot::capture(self.flags.as_ref())
    }

    /// Look up a personality by name, then by alias
    ///
    /// # Errors
    /// `RouterError::Operative` if the operative backend fails. "Not found"
    /// is `Ok(None)`.
    pub async fn get(&self, name: &str) -> Result<Option<LegacyPersonality>, RouterError> {
        const OP: &str = "get";
        let mode = self.dispatch_mode(OperationClass::Read);
        tracing::debug!(operation = OP, name, %mode, "routing read");

        match mode {
            DispatchMode::ShadowCompare => {
                let result = self
                    .comparator
                    .shadow(
                        OP,
                        || self.legacy_get(name),
                        || async move {
                            let found = self.target_get(name).await?;
                            Ok::<_, BackendError>(found.map(LegacyPersonality::from))
                        },
                        None,
                    )
                    .await;
                self.counters.record(RouteKind::ComparisonTest);
                result.map_err(|e| RouterError::operative(Backend::Legacy, OP, e))
            }
            DispatchMode::TargetOnly => {
                let result = self.target_get(name).await;
                self.counters.record(RouteKind::NewRead);
                result
                    .map(|found| found.map(LegacyPersonality::from))
                    .map_err(|e| RouterError::operative(Backend::Target, OP, e))
            }
            DispatchMode::LegacyOnly | DispatchMode::DualWrite => {
                let result = self.legacy_get(name).await;
                self.counters.record(RouteKind::LegacyRead);
                result.map_err(|e| RouterError::operative(Backend::Legacy, OP, e))
            }
        }
    }

    /// List every personality
    ///
    /// # Errors
    /// `RouterError::Operative` if the operative backend fails.
    pub async fn list(&self) -> Result<Vec<LegacyPersonality>, RouterError> {
        const OP: &str = "list";
        let mode = self.dispatch_mode(OperationClass::Read);
        tracing::debug!(operation = OP, %mode, "routing read");

        match mode {
            DispatchMode::ShadowCompare => {
                let result = self
                    .comparator
                    .shadow(
                        OP,
                        || self.legacy.list(),
                        || async move { Ok::<_, BackendError>(adapt_all(self.target.list().await?)) },
                        None,
                    )
                    .await;
                self.counters.record(RouteKind::ComparisonTest);
                result.map_err(|e| RouterError::operative(Backend::Legacy, OP, e))
            }
            DispatchMode::TargetOnly => {
                let result = self.target.list().await;
                self.counters.record(RouteKind::NewRead);
                result
                    .map(adapt_all)
                    .map_err(|e| RouterError::operative(Backend::Target, OP, e))
            }
            DispatchMode::LegacyOnly | DispatchMode::DualWrite => {
                let result = self.legacy.list().await;
                self.counters.record(RouteKind::LegacyRead);
                result.map_err(|e| RouterError::operative(Backend::Legacy, OP, e))
            }
        }
    }

    /// Register a personality
    pub async fn create(&self, name: &str, owner_id: &str, options: &CreateOptions) -> CreateOutcome {
        let result = self
            .route_write(
                "create",
                name,
                || self.legacy.register(name, owner_id, options),
                || async move {
                    let created = self.target.register(name, owner_id, options).await?;
                    Ok::<_, BackendError>(to_legacy(&created))
                },
            )
            .await;

        match result {
            Ok(entity) => CreateOutcome::created(entity),
            Err(e) => CreateOutcome::failed(e.backend_error().to_string()),
        }
    }

    /// Remove a personality owned by `requester`
    pub async fn remove(&self, name: &str, requester: &str) -> WriteOutcome {
        let result = self
            .route_write(
                "remove",
                name,
                || self.legacy.remove(name, requester),
                || self.target.remove(name, requester),
            )
            .await;

        match result {
            Ok(()) => WriteOutcome::ok(format!("Personality '{name}' removed")),
            Err(e) => WriteOutcome::failed(e.backend_error().to_string()),
        }
    }

    /// Attach `alias` to a personality owned by `requester`
    pub async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> WriteOutcome {
        let result = self
            .route_write(
                "add_alias",
                name,
                || self.legacy.add_alias(name, alias, requester),
                || self.target.add_alias(name, alias, requester),
            )
            .await;

        match result {
            Ok(()) => WriteOutcome::ok(format!("Alias '{alias}' added to '{name}'")),
            Err(e) => WriteOutcome::failed(e.backend_error().to_string()),
        }
    }

    /// Counters plus the current flag state
    #[must_use]
    pub fn routing_statistics(&self) -> RoutingStatistics {
        self.counters.snapshot(&self.flag_snapshot())
    }

    /// Zero the routing counters; comparator history is untouched
    pub fn reset_statistics(&self) {
        self.counters.reset();
    }

    async fn legacy_get(&self, name: &str) -> Result<Option<LegacyPersonality>, BackendError> {
        absent_as_none(self.legacy.get(name).await)
    }

    /// Name lookup with alias fallback, mirroring what the legacy store does internally
    async fn target_get(&self, name: &str) -> Result<Option<Personality>, BackendError> {
        if let Some(found) = absent_as_none(self.target.find_by_name(name).await)? {
            return Ok(Some(found));
        }
        absent_as_none(self.target.find_by_alias(name).await)
    }

    async fn route_write<T, FL, FutL, FT, FutT>(
        &self,
        operation: &'static str,
        name: &str,
        legacy: FL,
        target: FT,
    ) -> Result<T, RouterError>
    where
        FL: FnOnce() -> FutL,
        FutL: Future<Output = Result<T, BackendError>>,
        FT: FnOnce() -> FutT,
        FutT: Future<Output = Result<T, BackendError>>,
    {
        let mode = self.dispatch_mode(OperationClass::Write);
        tracing::debug!(operation, name, %mode, "routing write");

        let result = match mode {
            DispatchMode::TargetOnly => {
                let result = target().await;
                self.counters.record(RouteKind::NewWrite);
                result.map_err(|e| RouterError::operative(Backend::Target, operation, e))
            }
            DispatchMode::DualWrite => match legacy().await {
                Ok(value) => {
                    let kind = self.mirror(operation, name, target).await;
                    self.counters.record(kind);
                    Ok(value)
                }
                Err(e) => {
                    self.counters.record(RouteKind::LegacyWrite);
                    Err(RouterError::operative(Backend::Legacy, operation, e))
                }
            },
            DispatchMode::LegacyOnly | DispatchMode::ShadowCompare => {
                let result = legacy().await;
                self.counters.record(RouteKind::LegacyWrite);
                result.map_err(|e| RouterError::operative(Backend::Legacy, operation, e))
            }
        };

        if let Err(e) = &result {
            tracing::warn!(operation, name, error = %e, "write rejected");
        }
        result
    }

    /// Secondary target write after a successful legacy write
    async fn mirror<T, FT, FutT>(&self, operation: &'static str, name: &str, target: FT) -> RouteKind
    where
        FT: FnOnce() -> FutT,
        FutT: Future<Output = Result<T, BackendError>>,
    {
        match target().await {
            Ok(_) => {
                tracing::debug!(operation, name, "dual-write to target succeeded");
                RouteKind::DualWrite
            }
            Err(e) => {
                let err = RouterError::shadow(Backend::Target, operation, e);
                tracing::error!(operation, name, error = %err, "dual-write to target failed");
                RouteKind::LegacyWrite
            }
        }
    }
}

impl fmt::Debug for MigrationRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationRouter")
            .field("legacy", &self.legacy)
            .field("target", &self.target)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

fn absent_as_none<T>(result: Result<Option<T>, BackendError>) -> Result<Option<T>, BackendError> {
    match result {
        Err(BackendError::NotFound(_)) => Ok(None),
        other => other,
    }
}

fn adapt_all(personalities: Vec<Personality>) -> Vec<LegacyPersonality> {
    personalities.iter().map(to_legacy).collect()
}
