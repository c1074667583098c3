//! Shadow comparator
//!
//! Dispatches both sides of a comparison concurrently, classifies the settled
//! outcomes, and files the result in history. Bookkeeping happens only after
//! both sides have settled; the ledger lock is never held across an await.

use crate::error::MismatchError;
use crate::result::{capture, ComparisonResult, Outcome};
use crate::stats::{ComparatorStatistics, Ledger, OperationDiscrepancy};
use dualsys_diff::DiffOptions;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Comparator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Emit a warning with the discrepancy list on every mismatch
    pub log_discrepancies: bool,
    /// Make `compare()` fail with [`MismatchError`] on mismatch (CI gating)
    pub throw_on_mismatch: bool,
    /// Field names excluded from every comparison
    pub ignore_fields: Vec<String>,
    /// Whether timestamp-like fields are compared
    pub compare_timestamps: bool,
}

impl ComparatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With discrepancy logging
    #[inline]
    #[must_use]
    pub fn with_log_discrepancies(mut self, enabled: bool) -> Self {
        self.log_discrepancies = enabled;
        self
    }

    /// With mismatch gating
    #[inline]
    #[must_use]
    pub fn with_throw_on_mismatch(mut self, enabled: bool) -> Self {
        self.throw_on_mismatch = enabled;
        self
    }

    /// Diff options implied by this configuration
    #[must_use]
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions::new()
            .ignore_fields(self.ignore_fields.iter().cloned())
            .compare_timestamps(self.compare_timestamps)
    }
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            log_discrepancies: true,
            throw_on_mismatch: false,
            ignore_fields: Vec::new(),
            compare_timestamps: true,
        }
    }
}

type BoxedOp = Box<dyn FnOnce() -> BoxFuture<'static, Outcome> + Send>;

/// One entry for [`ShadowComparator::compare_multiple`]
pub struct ComparisonTask {
    name: String,
    legacy: BoxedOp,
    new: BoxedOp,
}

impl ComparisonTask {
    /// Create task from two thunks
    pub fn new<FL, FutL, L, EL, FN, FutN, N, EN>(name: impl Into<String>, legacy: FL, new: FN) -> Self
    where
        FL: FnOnce() -> FutL + Send + 'static,
        FutL: Future<Output = Result<L, EL>> + Send + 'static,
        L: Serialize + Send,
        EL: fmt::Display + Send,
        FN: FnOnce() -> FutN + Send + 'static,
        FutN: Future<Output = Result<N, EN>> + Send + 'static,
        N: Serialize + Send,
        EN: fmt::Display + Send,
    {
        Self {
            name: name.into(),
            legacy: Box::new(move || async move { capture(&legacy().await) }.boxed()),
            new: Box::new(move || async move { capture(&new().await) }.boxed()),
        }
    }

    /// Operation name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ComparisonTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Runs legacy and target operations side by side and records the verdicts
#[derive(Debug)]
pub struct ShadowComparator {
    config: ComparatorConfig,
    options: DiffOptions,
    ledger: Mutex<Ledger>,
}

impl ShadowComparator {
    /// Create comparator with empty history
    #[must_use]
    pub fn new(config: ComparatorConfig) -> Self {
        let options = config.diff_options();
        Self {
            config,
            options,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Replace the instance-wide diff options wholesale
    ///
    /// The `ignore_fields` and `compare_timestamps` derived from the config
    /// are dropped too; use [`Self::with_field_comparator`] to keep them.
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// Add custom equality for a field on top of the configured options
    #[must_use]
    pub fn with_field_comparator<F>(mut self, field: impl Into<String>, comparator: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.options = self.options.with_comparator(field, comparator);
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Compare a legacy and a target operation
    ///
    /// Both thunks are invoked before either is awaited. `options`, when
    /// given, replaces the instance options for this call only.
    ///
    /// # Errors
    /// `MismatchError` when the sides disagree and `throw_on_mismatch` is set.
    /// The comparison is recorded either way.
    pub async fn compare<FL, FutL, L, EL, FN, FutN, N, EN>(
        &self,
        operation: &str,
        legacy: FL,
        new: FN,
        options: Option<&DiffOptions>,
    ) -> Result<ComparisonResult, MismatchError>
    where
        FL: FnOnce() -> FutL,
        FutL: Future<Output = Result<L, EL>>,
        L: Serialize,
        EL: fmt::Display,
        FN: FnOnce() -> FutN,
        FutN: Future<Output = Result<N, EN>>,
        N: Serialize,
        EN: fmt::Display,
    {
        let (legacy_outcome, new_outcome) = futures::join!(legacy(), new());
        let result = self.record(
            operation,
            capture(&legacy_outcome),
            capture(&new_outcome),
            options,
        );
        self.gate(result)
    }

    /// Compare, then hand back the legacy outcome unchanged
    ///
    /// Used by routers in shadow mode: the legacy side is operative, the
    /// target side is observed only. A target failure is logged and recorded,
    /// never returned. `throw_on_mismatch` does not apply here.
    pub async fn shadow<FL, FutL, L, EL, FN, FutN, N, EN>(
        &self,
        operation: &str,
        legacy: FL,
        new: FN,
        options: Option<&DiffOptions>,
    ) -> Result<L, EL>
    where
        FL: FnOnce() -> FutL,
        FutL: Future<Output = Result<L, EL>>,
        L: Serialize,
        EL: fmt::Display,
        FN: FnOnce() -> FutN,
        FutN: Future<Output = Result<N, EN>>,
        N: Serialize,
        EN: fmt::Display,
    {
        let (legacy_outcome, new_outcome) = futures::join!(legacy(), new());

        if let Err(e) = &new_outcome {
            tracing::error!(operation, error = %e, "shadow call to target failed");
        }

        self.record(
            operation,
            capture(&legacy_outcome),
            capture(&new_outcome),
            options,
        );
        legacy_outcome
    }

    /// Run several comparisons independently
    ///
    /// Results come back in input order; a mismatch or failure in one entry
    /// never prevents the others from running or being recorded.
    pub async fn compare_multiple(
        &self,
        tasks: Vec<ComparisonTask>,
    ) -> Vec<Result<ComparisonResult, MismatchError>> {
        join_all(tasks.into_iter().map(|task| self.run_task(task))).await
    }

    async fn run_task(&self, task: ComparisonTask) -> Result<ComparisonResult, MismatchError> {
        let ComparisonTask { name, legacy, new } = task;
        let (legacy_outcome, new_outcome) = futures::join!(legacy(), new());
        let result = self.record(&name, legacy_outcome, new_outcome, None);
        self.gate(result)
    }

    fn record(
        &self,
        operation: &str,
        legacy: Outcome,
        new: Outcome,
        options: Option<&DiffOptions>,
    ) -> ComparisonResult {
        let options = options.unwrap_or(&self.options);
        let result = ComparisonResult::evaluate(operation, legacy, new, options);

        if result.is_match {
            tracing::debug!(operation, "shadow comparison matched");
        } else if self.config.log_discrepancies {
            tracing::warn!(
                operation,
                discrepancies = ?result.discrepancies,
                legacy_error = ?result.legacy_error,
                new_error = ?result.new_error,
                "shadow comparison mismatch"
            );
        }

        self.ledger.lock().record(result.clone());
        result
    }

    fn gate(&self, result: ComparisonResult) -> Result<ComparisonResult, MismatchError> {
        if self.config.throw_on_mismatch && !result.is_match {
            return Err(MismatchError::from_result(result));
        }
        Ok(result)
    }

    /// Aggregate statistics
    #[must_use]
    pub fn statistics(&self) -> ComparatorStatistics {
        self.ledger.lock().statistics()
    }

    /// Every recorded discrepancy, tagged with its operation, in call order
    #[must_use]
    pub fn discrepancies(&self) -> Vec<OperationDiscrepancy> {
        self.ledger.lock().discrepancies()
    }

    /// Snapshot of recorded comparisons
    #[must_use]
    pub fn history(&self) -> Vec<ComparisonResult> {
        self.ledger.lock().history().to_vec()
    }

    /// Drop all history and reset every counter
    pub fn clear(&self) {
        self.ledger.lock().clear();
    }
}

impl Default for ShadowComparator {
    fn default() -> Self {
        Self::new(ComparatorConfig::default())
    }
}
