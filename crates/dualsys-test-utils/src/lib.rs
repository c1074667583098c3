//! Testing utilities for the dualsys workspace
//!
//! Shared fixtures, fault-injecting backend wrappers, a router harness and
//! a log capture for asserting on emitted events.

#![allow(missing_docs)]

use async_trait::async_trait;
use dualsys_core::{
    BackendError, CreateOptions, FeatureFlags, InMemoryLegacyRegistry, InMemoryTargetService,
    LegacyPersonality, LegacyRegistry, MigrationRouter, Personality, TargetService,
};
use dualsys_shadow::{ComparatorConfig, ShadowComparator};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const OWNER: &str = "owner-1";
pub const INTRUDER: &str = "intruder";

pub fn albert_options() -> CreateOptions {
    CreateOptions::new()
        .with_display_name("Albert")
        .with_avatar_url("https://cdn.example/albert.png")
        .with_temperature(0.7)
        .with_max_word_count(250)
}

/// Register `names` in `legacy`, and in `target` too when given
pub async fn seed(
    legacy: &dyn LegacyRegistry,
    target: Option<&dyn TargetService>,
    names: &[&str],
) -> Result<(), BackendError> {
    for name in names {
        legacy.register(name, OWNER, &albert_options()).await?;
        if let Some(target) = target {
            target.register(name, OWNER, &albert_options()).await?;
        }
    }
    Ok(())
}

fn unavailable(operation: &str) -> BackendError {
    BackendError::Unavailable(format!("injected failure in {operation}"))
}

/// Target wrapper failing selected operations with `Unavailable`
#[derive(Debug)]
pub struct FaultyTarget {
    inner: Arc<dyn TargetService>,
    failing: HashSet<&'static str>,
    calls: AtomicUsize,
}

impl FaultyTarget {
    pub fn new(inner: Arc<dyn TargetService>) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call to the named trait method
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Total calls received, failing or not
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, operation: &'static str) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(operation) {
            Err(unavailable(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TargetService for FaultyTarget {
    async fn find_by_name(&self, name: &str) -> Result<Option<Personality>, BackendError> {
        self.enter("find_by_name")?;
        self.inner.find_by_name(name).await
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<Personality>, BackendError> {
        self.enter("find_by_alias")?;
        self.inner.find_by_alias(alias).await
    }

    async fn list(&self) -> Result<Vec<Personality>, BackendError> {
        self.enter("list")?;
        self.inner.list().await
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<Personality, BackendError> {
        self.enter("register")?;
        self.inner.register(name, owner_id, options).await
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        self.enter("remove")?;
        self.inner.remove(name, requester).await
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        self.enter("add_alias")?;
        self.inner.add_alias(name, alias, requester).await
    }
}

/// Legacy wrapper failing selected operations with `Unavailable`
#[derive(Debug)]
pub struct FaultyLegacy {
    inner: Arc<dyn LegacyRegistry>,
    failing: HashSet<&'static str>,
}

impl FaultyLegacy {
    pub fn new(inner: Arc<dyn LegacyRegistry>) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    fn enter(&self, operation: &'static str) -> Result<(), BackendError> {
        if self.failing.contains(operation) {
            Err(unavailable(operation))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LegacyRegistry for FaultyLegacy {
    async fn get(&self, name: &str) -> Result<Option<LegacyPersonality>, BackendError> {
        self.enter("get")?;
        self.inner.get(name).await
    }

    async fn list(&self) -> Result<Vec<LegacyPersonality>, BackendError> {
        self.enter("list")?;
        self.inner.list().await
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<LegacyPersonality, BackendError> {
        self.enter("register")?;
        self.inner.register(name, owner_id, options).await
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        self.enter("remove")?;
        self.inner.remove(name, requester).await
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        self.enter("add_alias")?;
        self.inner.add_alias(name, alias, requester).await
    }
}

/// Target wrapper sleeping before every read
#[derive(Debug)]
pub struct DelayedTarget {
    inner: Arc<dyn TargetService>,
    delay: Duration,
}

impl DelayedTarget {
    pub fn new(inner: Arc<dyn TargetService>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl TargetService for DelayedTarget {
    async fn find_by_name(&self, name: &str) -> Result<Option<Personality>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_name(name).await
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<Personality>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_alias(alias).await
    }

    async fn list(&self) -> Result<Vec<Personality>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list().await
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<Personality, BackendError> {
        self.inner.register(name, owner_id, options).await
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        self.inner.remove(name, requester).await
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        self.inner.add_alias(name, alias, requester).await
    }
}

/// Legacy wrapper sleeping before every read
#[derive(Debug)]
pub struct DelayedLegacy {
    inner: Arc<dyn LegacyRegistry>,
    delay: Duration,
}

impl DelayedLegacy {
    pub fn new(inner: Arc<dyn LegacyRegistry>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl LegacyRegistry for DelayedLegacy {
    async fn get(&self, name: &str) -> Result<Option<LegacyPersonality>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(name).await
    }

    async fn list(&self) -> Result<Vec<LegacyPersonality>, BackendError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list().await
    }

    async fn register(
        &self,
        name: &str,
        owner_id: &str,
        options: &CreateOptions,
    ) -> Result<LegacyPersonality, BackendError> {
        self.inner.register(name, owner_id, options).await
    }

    async fn remove(&self, name: &str, requester: &str) -> Result<(), BackendError> {
        self.inner.remove(name, requester).await
    }

    async fn add_alias(&self, name: &str, alias: &str, requester: &str) -> Result<(), BackendError> {
        self.inner.add_alias(name, alias, requester).await
    }
}

/// Router wired to in-memory backends, with handles on each part
pub struct Harness {
    pub legacy: Arc<InMemoryLegacyRegistry>,
    pub target: Arc<InMemoryTargetService>,
    pub flags: Arc<FeatureFlags>,
    pub comparator: Arc<ShadowComparator>,
    pub router: MigrationRouter,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ComparatorConfig::default())
    }

    pub fn with_config(config: ComparatorConfig) -> Self {
        let legacy = Arc::new(InMemoryLegacyRegistry::new());
        let target = Arc::new(InMemoryTargetService::new());
        let flags = Arc::new(FeatureFlags::new());
        let comparator = Arc::new(ShadowComparator::new(config));
        let router = MigrationRouter::new(legacy.clone(), target.clone(), flags.clone())
            .with_comparator(comparator.clone());
        Self {
            legacy,
            target,
            flags,
            comparator,
            router,
        }
    }

    /// Router whose target side goes through `wrap`
    pub fn wrapping_target<F>(wrap: F) -> Self
    where
        F: FnOnce(Arc<dyn TargetService>) -> Arc<dyn TargetService>,
    {
        let mut harness = Self::new();
        let target = wrap(harness.target.clone());
        harness.router = MigrationRouter::new(harness.legacy.clone(), target, harness.flags.clone())
            .with_comparator(harness.comparator.clone());
        harness
    }

    /// Router whose legacy side goes through `wrap`
    pub fn wrapping_legacy<F>(wrap: F) -> Self
    where
        F: FnOnce(Arc<dyn LegacyRegistry>) -> Arc<dyn LegacyRegistry>,
    {
        let mut harness = Self::new();
        let legacy = wrap(harness.legacy.clone());
        harness.router = MigrationRouter::new(legacy, harness.target.clone(), harness.flags.clone())
            .with_comparator(harness.comparator.clone());
        harness
    }

    /// Seed both backends with identical personalities
    pub async fn seed_both(&self, names: &[&str]) {
        seed(self.legacy.as_ref(), Some(self.target.as_ref()), names)
            .await
            .expect("seeding in-memory backends");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects formatted tracing events for the current thread
///
/// Install with [`LogCapture::install`]; events are captured until the guard
/// drops. Lines carry no timestamp or target: `" WARN message field=..."`.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Lines emitted at `level` (`"ERROR"`, `"WARN"`, ...)
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }

    /// Whether any line at `level` contains `fragment`
    pub fn logged(&self, level: &str, fragment: &str) -> bool {
        self.lines_at(level).iter().any(|line| line.contains(fragment))
    }
}

pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(Arc::clone(&self.buf))
    }
}
