//! Provider registry and cached framework detection.
//!
//! Detection walks the workspace and reads files, so every provider's
//! `detect` runs on tokio's blocking pool and the joined results are cached
//! as one immutable [`ProviderSelection`] together with the roots it was
//! computed for. The cache is reused until the workspace roots change, it is
//! invalidated explicitly, a provider is registered, or the active threshold
//! changes.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::config::StepbindConfig;
use crate::detection::DetectionResult;
use crate::providers::{BindingProvider, ProviderError};
use crate::selection::ProviderSelection;

/// Reason recorded for every provider when there is nothing to scan.
pub const NO_WORKSPACE_REASON: &str = "no workspace folder";

#[derive(Debug)]
struct CachedSelection {
    roots: Vec<PathBuf>,
    selection: Arc<ProviderSelection>,
}

/// Registry of binding providers with a cached detection result.
pub struct ProviderManager {
    providers: Vec<Arc<dyn BindingProvider>>,
    active_threshold: f64,
    cache: Mutex<Option<CachedSelection>>,
    generation: AtomicU64,
    detection: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("providers", &self.provider_ids())
            .field("active_threshold", &self.active_threshold)
            .finish_non_exhaustive()
    }
}

impl ProviderManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new(config: &StepbindConfig) -> Self {
        Self {
            providers: Vec::new(),
            active_threshold: config.active_threshold,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
            detection: tokio::sync::Mutex::new(()),
        }
    }

    /// Register `provider`.
    ///
    /// A provider whose id is already registered replaces the earlier one in
    /// place, keeping its position. Registration invalidates the cache.
    pub fn register(&mut self, provider: Arc<dyn BindingProvider>) {
        let id = provider.id();
        if let Some(slot) = self.providers.iter_mut().find(|p| p.id() == id) {
            *slot = provider;
        } else {
            self.providers.push(provider);
        }
        self.invalidate_cache();
    }

    /// Registered providers in registration order.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn BindingProvider>] {
        &self.providers
    }

    /// Registered provider identifiers in registration order.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    /// Look up a provider by id.
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&Arc<dyn BindingProvider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Threshold applied to the next detection run.
    #[must_use]
    pub fn active_threshold(&self) -> f64 {
        self.active_threshold
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedSelection>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The cached selection, if detection has run since the last
    /// invalidation.
    #[must_use]
    pub fn cached_selection(&self) -> Option<Arc<ProviderSelection>> {
        self.lock_cache()
            .as_ref()
            .map(|cached| Arc::clone(&cached.selection))
    }

    fn cached_for(&self, roots: &[PathBuf]) -> Option<Arc<ProviderSelection>> {
        let cache = self.lock_cache();
        let cached = cache.as_ref()?;
        if cached.roots == roots {
            Some(Arc::clone(&cached.selection))
        } else {
            debug!(
                previous = ?cached.roots,
                current = ?roots,
                "workspace roots changed; re-running detection"
            );
            None
        }
    }

    /// Drop the cached selection so the next call re-runs detection.
    pub fn invalidate_cache(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.lock_cache() = None;
    }

    /// Apply new configuration, invalidating the cache only when the active
    /// threshold changes.
    ///
    /// Returns whether the cache was invalidated.
    pub fn update_config(&mut self, config: &StepbindConfig) -> bool {
        if config.active_threshold.to_bits() == self.active_threshold.to_bits() {
            return false;
        }
        self.active_threshold = config.active_threshold;
        self.invalidate_cache();
        true
    }

    /// Detect which providers apply to `roots`.
    ///
    /// Returns the cached selection unchanged when it was computed for the
    /// same `roots`. Otherwise every
    /// provider's `detect` runs as an independent blocking task; failures
    /// and panics become zero-confidence results that carry the error.
    /// Concurrent callers wait for a single detection run.
    pub async fn detect_providers(&self, roots: &[PathBuf]) -> Arc<ProviderSelection> {
        if let Some(selection) = self.cached_for(roots) {
            return selection;
        }
        let _running = self.detection.lock().await;
        if let Some(selection) = self.cached_for(roots) {
            return selection;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let results = if roots.is_empty() {
            self.providers
                .iter()
                .map(|p| {
                    (
                        p.id(),
                        p.display_name(),
                        DetectionResult::none(NO_WORKSPACE_REASON),
                    )
                })
                .collect()
        } else {
            self.run_detection(roots).await
        };

        let selection = Arc::new(ProviderSelection::from_results(
            results,
            self.active_threshold,
        ));
        info!(
            primary = selection.primary().unwrap_or("none"),
            active = ?selection.active(),
            "provider detection complete"
        );

        let mut cache = self.lock_cache();
        if self.generation.load(Ordering::SeqCst) == generation {
            *cache = Some(CachedSelection {
                roots: roots.to_vec(),
                selection: Arc::clone(&selection),
            });
        }
        selection
    }

    async fn run_detection(
        &self,
        roots: &[PathBuf],
    ) -> Vec<(&'static str, &'static str, DetectionResult)> {
        let roots: Arc<[PathBuf]> = Arc::from(roots);
        let tasks: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let roots = Arc::clone(&roots);
                tokio::task::spawn_blocking(move || provider.detect(&roots))
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (provider, task) in self.providers.iter().zip(tasks) {
            let detection = match task.await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => {
                    warn!(provider = provider.id(), error = %err, "provider detection failed");
                    DetectionResult::failed(&err)
                }
                Err(join) => {
                    let err = ProviderError::TaskFailed(join.to_string());
                    warn!(provider = provider.id(), error = %err, "provider detection panicked");
                    DetectionResult::failed(&err)
                }
            };
            results.push((provider.id(), provider.display_name(), detection));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingProvider, StubProvider};

    fn manager(providers: Vec<Arc<dyn BindingProvider>>) -> ProviderManager {
        let mut manager = ProviderManager::new(&StepbindConfig::default());
        for provider in providers {
            manager.register(provider);
        }
        manager
    }

    #[test]
    fn registration_is_idempotent_by_id() {
        let mut manager = manager(vec![
            Arc::new(StubProvider::new("a", 0.1)),
            Arc::new(StubProvider::new("b", 0.2)),
        ]);
        manager.register(Arc::new(StubProvider::new("a", 0.9)));
        assert_eq!(manager.provider_ids(), vec!["a", "b"]);
        assert!(manager.provider("a").is_some());
        assert!(manager.provider("c").is_none());
    }

    #[tokio::test]
    async fn errors_become_zero_confidence_results() {
        let manager = manager(vec![
            Arc::new(FailingProvider::new("broken")),
            Arc::new(StubProvider::new("ok", 0.6)),
        ]);
        let selection = manager.detect_providers(&[PathBuf::from(".")]).await;
        let broken = selection
            .report()
            .iter()
            .find(|r| r.id == "broken")
            .map(|r| r.detection.clone());
        let Some(broken) = broken else {
            panic!("broken provider missing from report");
        };
        assert!(broken.confidence().total_cmp(&0.0).is_eq());
        assert!(
            broken
                .reasons
                .first()
                .is_some_and(|r| r.starts_with("detection failed:"))
        );
        assert_eq!(selection.primary(), Some("ok"));
    }

    #[tokio::test]
    async fn different_roots_miss_the_cache() {
        let stub = Arc::new(StubProvider::new("a", 0.4));
        let manager = manager(vec![Arc::clone(&stub) as Arc<dyn BindingProvider>]);
        let first = manager.detect_providers(&[PathBuf::from("one")]).await;
        let again = manager.detect_providers(&[PathBuf::from("one")]).await;
        let other = manager.detect_providers(&[PathBuf::from("two")]).await;
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(stub.detect_calls(), 2);
        let cached = manager.cached_selection();
        assert!(cached.is_some_and(|cached| Arc::ptr_eq(&cached, &other)));
    }

    #[tokio::test]
    async fn threshold_change_invalidates_but_other_settings_do_not() {
        let mut manager = manager(vec![Arc::new(StubProvider::new("a", 0.4))]);
        let first = manager.detect_providers(&[PathBuf::from(".")]).await;
        assert!(first.is_active("a"));

        let same_threshold = StepbindConfig::default().with_case_insensitive(true);
        assert!(!manager.update_config(&same_threshold));
        assert!(manager.cached_selection().is_some());

        let Ok(raised) = StepbindConfig::default().with_active_threshold(0.5) else {
            panic!("threshold in range");
        };
        assert!(manager.update_config(&raised));
        assert!(manager.cached_selection().is_none());
        let second = manager.detect_providers(&[PathBuf::from(".")]).await;
        assert!(!second.is_active("a"));
    }
}
