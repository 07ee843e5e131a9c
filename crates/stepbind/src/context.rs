//! Explicitly constructed state shared by detection, indexing and
//! resolution.
//!
//! A [`BindingContext`] owns one provider manager and one binding index.
//! Callers create as many contexts as they need (one per workspace, or one
//! per test) and pass them to whatever needs them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::binding::{Binding, ParseOptions};
use crate::config::StepbindConfig;
use crate::discovery::{find_files_with_extensions, is_pruned};
use crate::gherkin_model::{GherkinModel, GherkinStep};
use crate::index::BindingIndex;
use crate::manager::ProviderManager;
use crate::providers::{BindingProvider, default_providers};
use crate::resolver::{self, ResolutionResult, StepResolution};
use crate::selection::ProviderSelection;

/// Kind of change reported for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// The file was created.
    Created,
    /// The file's contents changed.
    Changed,
    /// The file was deleted.
    Deleted,
}

/// A file-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Path of the affected file.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: FileEventKind,
}

impl FileEvent {
    /// Create an event for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

type ProviderFiles = BTreeMap<PathBuf, Vec<Binding>>;

/// Provider registry, detection cache and binding index for one workspace.
#[derive(Debug)]
pub struct BindingContext {
    config: StepbindConfig,
    manager: ProviderManager,
    index: BindingIndex,
    roots: RwLock<Vec<PathBuf>>,
}

impl BindingContext {
    /// Create a context with no providers registered.
    #[must_use]
    pub fn new(config: StepbindConfig) -> Self {
        Self {
            manager: ProviderManager::new(&config),
            index: BindingIndex::new(),
            roots: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Create a context with the built-in providers registered.
    #[must_use]
    pub fn with_default_providers(config: StepbindConfig) -> Self {
        let mut context = Self::new(config);
        for provider in default_providers() {
            context.register_provider(provider);
        }
        context
    }

    /// Register `provider`, replacing any provider with the same id.
    pub fn register_provider(&mut self, provider: Arc<dyn BindingProvider>) {
        self.manager.register(provider);
        self.index.set_provider_order(self.manager.provider_ids());
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &StepbindConfig {
        &self.config
    }

    /// The provider manager.
    #[must_use]
    pub fn manager(&self) -> &ProviderManager {
        &self.manager
    }

    /// The binding index.
    #[must_use]
    pub fn index(&self) -> &BindingIndex {
        &self.index
    }

    /// The cached provider selection, if detection has run.
    #[must_use]
    pub fn selection(&self) -> Option<Arc<ProviderSelection>> {
        self.manager.cached_selection()
    }

    /// Detect providers for `roots` and index every active provider's
    /// bindings.
    ///
    /// Each active provider indexes on tokio's blocking pool. A provider
    /// whose workspace walk fails keeps its previous bindings; inactive
    /// providers lose theirs. Refreshing with different roots re-runs
    /// detection.
    pub async fn refresh(&self, roots: &[PathBuf]) -> Arc<ProviderSelection> {
        *self.write_roots() = roots.to_vec();
        let selection = self.manager.detect_providers(roots).await;
        self.index.set_active(selection.active().iter().copied());

        let options = ParseOptions::from(&self.config);
        let revision = self.index.begin_update();
        for provider in self.manager.providers() {
            if !selection.is_active(provider.id()) {
                self.index
                    .replace_provider(provider.id(), revision, BTreeMap::new());
            }
        }
        let roots: Arc<[PathBuf]> = Arc::from(roots);
        let active: Vec<_> = self
            .manager
            .providers()
            .iter()
            .filter(|provider| selection.is_active(provider.id()))
            .cloned()
            .collect();

        let tasks: Vec<_> = active
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let roots = Arc::clone(&roots);
                tokio::task::spawn_blocking(move || {
                    index_provider(provider.as_ref(), &roots, &options)
                })
            })
            .collect();

        for (provider, task) in active.iter().zip(tasks) {
            match task.await {
                Ok(Ok(files)) => {
                    let count: usize = files.values().map(Vec::len).sum();
                    info!(
                        provider = provider.id(),
                        files = files.len(),
                        bindings = count,
                        "indexed bindings"
                    );
                    self.index.replace_provider(provider.id(), revision, files);
                }
                Ok(Err(err)) => {
                    warn!(
                        provider = provider.id(),
                        error = %err,
                        "workspace walk failed during indexing"
                    );
                }
                Err(join) => {
                    warn!(
                        provider = provider.id(),
                        error = %join,
                        "indexing task panicked"
                    );
                }
            }
        }
        selection
    }

    /// Apply a file-change notification to the index.
    ///
    /// Created and changed files are re-parsed by every active provider that
    /// handles them, unless a workspace walk would skip them; deleted files
    /// lose all their bindings. Reading and parsing happen on the calling
    /// thread. Returns whether the index changed.
    pub fn on_file_event(&self, event: &FileEvent) -> bool {
        let revision = self.index.begin_update();
        match event.kind {
            FileEventKind::Deleted => self.index.remove_file(&event.path, revision),
            FileEventKind::Created | FileEventKind::Changed => {
                if self.is_pruned(&event.path) {
                    if self.config.debug {
                        debug!(
                            path = %event.path.display(),
                            "ignoring file under a pruned directory"
                        );
                    }
                    return false;
                }
                let options = ParseOptions::from(&self.config);
                let files = [event.path.clone()];
                let mut applied = false;
                for provider in self.manager.providers() {
                    if !provider.handles(&event.path) || !self.index.is_active(provider.id()) {
                        continue;
                    }
                    let bindings = provider.index_bindings(&files, &options);
                    if self.config.debug {
                        debug!(
                            provider = provider.id(),
                            path = %event.path.display(),
                            bindings = bindings.len(),
                            "re-parsed file"
                        );
                    }
                    applied |= self
                        .index
                        .replace_file(provider.id(), &event.path, revision, bindings);
                }
                applied
            }
        }
    }

    fn read_roots(&self) -> RwLockReadGuard<'_, Vec<PathBuf>> {
        match self.roots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_roots(&self) -> RwLockWriteGuard<'_, Vec<PathBuf>> {
        match self.roots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn is_pruned(&self, path: &Path) -> bool {
        is_pruned(path, &self.read_roots())
    }

    /// Resolve one step against the active bindings.
    #[must_use]
    pub fn resolve(&self, step: &GherkinStep) -> ResolutionResult {
        resolver::resolve(step, &self.index)
    }

    /// Resolve every step of a feature file.
    #[must_use]
    pub fn resolve_model(&self, model: &GherkinModel) -> Vec<StepResolution> {
        resolver::resolve_model(model, &self.index)
    }

    /// Bindings of every active provider, in index order.
    #[must_use]
    pub fn bindings(&self) -> Vec<Arc<Binding>> {
        self.index.active_bindings()
    }

    /// Bindings declared in `path`.
    #[must_use]
    pub fn bindings_for_file(&self, path: &Path) -> Vec<Arc<Binding>> {
        self.index.bindings_for_file(path)
    }

    /// Drop the cached selection and every indexed binding, keeping the
    /// registered providers and the configuration.
    pub fn reset(&self) {
        self.manager.invalidate_cache();
        self.index.clear();
    }

    /// Replace the configuration.
    ///
    /// A changed active threshold invalidates the detection cache; a changed
    /// case sensitivity also drops the index, since every matcher must be
    /// recompiled. Returns whether a [`Self::refresh`] is needed.
    pub fn update_config(&mut self, config: StepbindConfig) -> bool {
        let mut stale = self.manager.update_config(&config);
        if config.case_insensitive != self.config.case_insensitive {
            self.reset();
            stale = true;
        }
        self.config = config;
        stale
    }
}

fn index_provider(
    provider: &dyn BindingProvider,
    roots: &[PathBuf],
    options: &ParseOptions,
) -> Result<ProviderFiles, walkdir::Error> {
    let files = find_files_with_extensions(roots, provider.source_extensions())?;
    let mut grouped: ProviderFiles = files
        .iter()
        .map(|path| (path.clone(), Vec::new()))
        .collect();
    for binding in provider.index_bindings(&files, options) {
        grouped
            .entry(binding.location.path.clone())
            .or_default()
            .push(binding);
    }
    Ok(grouped)
}
