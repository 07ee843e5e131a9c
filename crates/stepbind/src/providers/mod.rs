//! Binding providers: one per BDD framework.
//!
//! A provider answers two questions about a workspace: how confident it is
//! that its framework is in use ([`BindingProvider::detect`]), and which step
//! definitions a given source file declares
//! ([`BindingProvider::parse_file`]). Providers are stateless and shared
//! between threads behind an `Arc`.

mod behave;
mod cucumber_js;
mod reqnroll;
pub(crate) mod scan;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::binding::{Binding, ParseOptions};
use crate::detection::{DetectionResult, SAMPLE_CAP};
use crate::discovery::has_extension;

pub use behave::BehaveProvider;
pub use cucumber_js::CucumberJsProvider;
pub use reqnroll::ReqnrollProvider;

/// Errors a provider may raise while scanning a workspace.
///
/// The provider manager converts every error into a zero-confidence result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking a workspace root failed.
    #[error("workspace walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// The detection task panicked or was cancelled.
    #[error("detection task failed: {0}")]
    TaskFailed(String),
}

/// Discovers and compiles the step definitions of one BDD framework.
pub trait BindingProvider: Send + Sync {
    /// Stable identifier, such as `reqnroll`.
    fn id(&self) -> &'static str;

    /// Human-readable name used in reports.
    fn display_name(&self) -> &'static str;

    /// Extensions (without the dot) of files that may declare bindings.
    fn source_extensions(&self) -> &'static [&'static str];

    /// Estimate how likely it is that the framework is used under `roots`.
    ///
    /// Implementations read at most [`SAMPLE_CAP`] files per signal
    /// category and skip files they cannot read.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the workspace cannot be scanned at all.
    fn detect(&self, roots: &[PathBuf]) -> Result<DetectionResult, ProviderError>;

    /// Extract the bindings declared in one source file.
    ///
    /// Literals that fail to compile are dropped.
    fn parse_file(&self, path: &Path, source: &str, options: &ParseOptions) -> Vec<Binding>;

    /// Whether `path` is a candidate source file for this provider.
    fn handles(&self, path: &Path) -> bool {
        has_extension(path, self.source_extensions())
    }

    /// Read and parse every file in `files`, each independently.
    ///
    /// Unreadable files contribute no bindings.
    fn index_bindings(&self, files: &[PathBuf], options: &ParseOptions) -> Vec<Binding> {
        files
            .iter()
            .filter_map(|path| read_source(self.id(), path, options))
            .flat_map(|(path, source)| self.parse_file(path, &source, options))
            .collect()
    }
}

/// Read a candidate source file, logging the failure when `options.debug` is
/// set.
pub(crate) fn read_source<'p>(
    provider: &'static str,
    path: &'p Path,
    options: &ParseOptions,
) -> Option<(&'p Path, String)> {
    match fs::read_to_string(path) {
        Ok(source) => Some((path, source)),
        Err(err) => {
            if options.debug {
                debug!(provider, path = %path.display(), error = %err, "skipping unreadable file");
            }
            None
        }
    }
}

/// Read up to [`SAMPLE_CAP`] of `files`, skipping unreadable ones.
pub(crate) fn read_sample(files: &[PathBuf]) -> impl Iterator<Item = (&Path, String)> {
    files
        .iter()
        .take(SAMPLE_CAP)
        .filter_map(|path| fs::read_to_string(path).ok().map(|text| (path.as_path(), text)))
}

/// File name of `path` for use in reasons and signals.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// The built-in providers in their default registration order.
#[must_use]
pub fn default_providers() -> Vec<Arc<dyn BindingProvider>> {
    vec![
        Arc::new(ReqnrollProvider),
        Arc::new(CucumberJsProvider),
        Arc::new(BehaveProvider),
    ]
}
