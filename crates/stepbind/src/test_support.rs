//! Shared test support utilities for stepbind tests.
//!
//! This module provides common infrastructure for both unit and integration
//! tests, including:
//! - Temporary workspace creation
//! - Stub providers that count detection calls, fail, or panic
//! - Newtype wrappers for improved type safety

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use stepbind_patterns::{BindingKeyword, PatternSyntax};
use tempfile::TempDir;

use crate::binding::{Binding, BindingSite, ParseOptions, PatternText};
use crate::detection::DetectionResult;
use crate::providers::scan::LineIndex;
use crate::providers::{BindingProvider, ProviderError};

/// Newtype wrapper for test file names to improve type safety.
#[derive(Debug, Clone)]
pub struct Filename(pub(crate) String);

impl From<&str> for Filename {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Newtype wrapper for file contents to improve type safety.
#[derive(Debug, Clone)]
pub struct FileContent(pub(crate) String);

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for FileContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A temporary workspace on disk.
pub struct TestWorkspace {
    /// Temporary directory holding the workspace files.
    pub dir: TempDir,
}

impl TestWorkspace {
    /// The workspace root as a single-element root list.
    #[must_use]
    pub fn roots(&self) -> Vec<PathBuf> {
        vec![self.dir.path().to_path_buf()]
    }

    /// Absolute path of a workspace-relative file.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write (or overwrite) a workspace-relative file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[expect(clippy::expect_used, reason = "test helper panics on write failure")]
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(&path, content).expect("write workspace file");
        path
    }
}

/// Builder for temporary workspaces.
pub struct WorkspaceBuilder {
    files: Vec<(Filename, FileContent)>,
}

impl WorkspaceBuilder {
    /// Start an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a file to be written when the workspace is built.
    #[must_use]
    pub fn with_file(
        mut self,
        filename: impl Into<Filename>,
        content: impl Into<FileContent>,
    ) -> Self {
        self.files.push((filename.into(), content.into()));
        self
    }

    /// Write every file into a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or any file cannot be created.
    #[expect(clippy::expect_used, reason = "builder panics on temp dir failure")]
    #[must_use]
    pub fn build(self) -> TestWorkspace {
        let workspace = TestWorkspace {
            dir: TempDir::new().expect("temp dir"),
        };
        for (filename, content) in &self.files {
            workspace.write(filename.as_ref(), content.as_ref());
        }
        workspace
    }
}

impl Default for WorkspaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Provider reporting a fixed confidence and counting `detect` calls.
///
/// Files with the `steps` extension declare one binding per line in the
/// form `<Given|When|Then|Any> <regex>`.
#[derive(Debug)]
pub struct StubProvider {
    id: &'static str,
    confidence: f64,
    calls: AtomicUsize,
}

impl StubProvider {
    /// Create a stub with the given id and confidence.
    #[must_use]
    pub fn new(id: &'static str, confidence: f64) -> Self {
        Self {
            id,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `detect` ran.
    #[must_use]
    pub fn detect_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn stub_keyword(word: &str) -> Option<BindingKeyword> {
    match word {
        "Given" => Some(BindingKeyword::Given),
        "When" => Some(BindingKeyword::When),
        "Then" => Some(BindingKeyword::Then),
        "Any" => Some(BindingKeyword::Any),
        _ => None,
    }
}

impl BindingProvider for StubProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.id
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["steps"]
    }

    fn detect(&self, _roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DetectionResult::new(
            self.confidence,
            vec![format!("{} stub", self.id)],
            vec![format!("stub:{}", self.id)],
            Vec::new(),
        ))
    }

    fn parse_file(&self, path: &Path, source: &str, options: &ParseOptions) -> Vec<Binding> {
        let lines = LineIndex::new(source);
        let mut offset = 0usize;
        let mut bindings = Vec::new();
        for (number, line) in source.split_inclusive('\n').enumerate() {
            let start = offset;
            offset = offset.saturating_add(line.len());
            let Some((word, pattern)) = line.trim_end().split_once(' ') else {
                continue;
            };
            let Some(keyword) = stub_keyword(word) else {
                continue;
            };
            let site = BindingSite {
                keyword,
                pattern: PatternText::Unescaped(pattern),
                syntax: PatternSyntax::Regex,
                case_insensitive: false,
                declaring_symbol: format!("{}.line{number}", self.id),
                location: lines.location(path, start, offset),
                provider: self.id,
            };
            bindings.extend(Binding::from_site(site, options));
        }
        bindings
    }
}

/// Provider whose detection always fails.
#[derive(Debug)]
pub struct FailingProvider {
    id: &'static str,
}

impl FailingProvider {
    /// Create a failing provider with the given id.
    #[must_use]
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

impl BindingProvider for FailingProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.id
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn detect(&self, _roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        Err(ProviderError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "workspace is unreadable",
        )))
    }

    fn parse_file(&self, _path: &Path, _source: &str, _options: &ParseOptions) -> Vec<Binding> {
        Vec::new()
    }
}

/// Provider whose detection panics.
#[derive(Debug)]
pub struct PanickingProvider {
    id: &'static str,
}

impl PanickingProvider {
    /// Create a panicking provider with the given id.
    #[must_use]
    pub fn new(id: &'static str) -> Self {
        Self { id }
    }
}

impl BindingProvider for PanickingProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn display_name(&self) -> &'static str {
        self.id
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn detect(&self, _roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        panic!("{} detection exploded", self.id);
    }

    fn parse_file(&self, _path: &Path, _source: &str, _options: &ParseOptions) -> Vec<Binding> {
        Vec::new()
    }
}
