//! In-memory index of step bindings contributed by providers.
//!
//! Bindings are stored per provider and per source file. Re-parsing a file
//! replaces every binding previously contributed for that file in a single
//! write, so readers never observe a file half-updated and stale entries do
//! not survive an edit.
//!
//! Writers for the same file are ordered by revision. A revision is taken
//! from [`BindingIndex::begin_update`] before the file is read; when the
//! parse finishes, [`BindingIndex::replace_file`] applies it only if no newer
//! revision has landed for that file in the meantime. A superseded re-parse
//! is therefore discarded rather than applied out of order.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::binding::Binding;

#[derive(Debug)]
struct FileEntry {
    revision: u64,
    bindings: Vec<Arc<Binding>>,
}

#[derive(Debug, Default)]
struct IndexState {
    order: Vec<&'static str>,
    active: HashSet<&'static str>,
    files: HashMap<&'static str, BTreeMap<PathBuf, FileEntry>>,
    removed: HashMap<PathBuf, u64>,
}

impl IndexState {
    fn is_superseded(&self, provider: &str, path: &Path, revision: u64) -> bool {
        let removed_later = self
            .removed
            .get(path)
            .is_some_and(|removed| *removed > revision);
        let replaced_later = self
            .files
            .get(provider)
            .and_then(|files| files.get(path))
            .is_some_and(|entry| entry.revision > revision);
        removed_later || replaced_later
    }
}

fn into_entry(revision: u64, bindings: Vec<Binding>) -> FileEntry {
    let mut bindings: Vec<_> = bindings.into_iter().map(Arc::new).collect();
    bindings.sort_by_key(|b| (b.location.line, b.location.column));
    FileEntry { revision, bindings }
}

/// Shared, incrementally updated collection of bindings.
#[derive(Debug, Default)]
pub struct BindingIndex {
    state: RwLock<IndexState>,
    revision: AtomicU64,
}

impl BindingIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Allocate the revision for an update that is about to start.
    ///
    /// Revisions increase monotonically for the lifetime of the index.
    pub fn begin_update(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// Set the provider registration order used for the flattened view.
    pub fn set_provider_order(&self, order: Vec<&'static str>) {
        self.write().order = order;
    }

    /// Set which providers' bindings are trusted by [`Self::active_bindings`].
    pub fn set_active<I>(&self, providers: I)
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.write().active = providers.into_iter().collect();
    }

    /// Whether bindings from `provider` are currently trusted.
    #[must_use]
    pub fn is_active(&self, provider: &str) -> bool {
        self.read().active.contains(provider)
    }

    /// Replace every binding `provider` contributed for `path`.
    ///
    /// Returns `false`, leaving the index untouched, when a newer revision
    /// has already been applied to or removed `path`.
    pub fn replace_file(
        &self,
        provider: &'static str,
        path: &Path,
        revision: u64,
        bindings: Vec<Binding>,
    ) -> bool {
        let mut state = self.write();
        if state.is_superseded(provider, path, revision) {
            return false;
        }
        state
            .files
            .entry(provider)
            .or_default()
            .insert(path.to_path_buf(), into_entry(revision, bindings));
        true
    }

    /// Replace everything `provider` contributed with a full re-index.
    ///
    /// Files absent from `files` are dropped unless they were updated at a
    /// revision newer than `revision`, which survives as the fresher state.
    pub fn replace_provider(
        &self,
        provider: &'static str,
        revision: u64,
        files: BTreeMap<PathBuf, Vec<Binding>>,
    ) {
        let mut state = self.write();
        let previous = state.files.remove(provider).unwrap_or_default();
        let mut next: BTreeMap<PathBuf, FileEntry> = previous
            .into_iter()
            .filter(|(_, entry)| entry.revision > revision)
            .collect();
        for (path, bindings) in files {
            let removed_later = state
                .removed
                .get(&path)
                .is_some_and(|removed| *removed > revision);
            if removed_later || next.contains_key(&path) {
                continue;
            }
            next.insert(path, into_entry(revision, bindings));
        }
        state.files.insert(provider, next);
    }

    /// Drop every binding declared in `path`, across all providers.
    ///
    /// Returns `false` when a newer revision already superseded this
    /// removal. A removal also fences off older in-flight re-parses of the
    /// same file.
    pub fn remove_file(&self, path: &Path, revision: u64) -> bool {
        let mut state = self.write();
        let newer = state.files.values().any(|files| {
            files
                .get(path)
                .is_some_and(|entry| entry.revision > revision)
        });
        if newer {
            return false;
        }
        for files in state.files.values_mut() {
            files.remove(path);
        }
        let fence = state.removed.entry(path.to_path_buf()).or_default();
        *fence = (*fence).max(revision);
        true
    }

    /// Bindings of every active provider.
    ///
    /// Ordered by provider registration, then file path, then position in
    /// the file.
    #[must_use]
    pub fn active_bindings(&self) -> Vec<Arc<Binding>> {
        let state = self.read();
        state
            .order
            .iter()
            .filter(|provider| state.active.contains(*provider))
            .filter_map(|provider| state.files.get(provider))
            .flat_map(BTreeMap::values)
            .flat_map(|entry| entry.bindings.iter().cloned())
            .collect()
    }

    /// Bindings contributed by `provider`, whether or not it is active.
    #[must_use]
    pub fn provider_bindings(&self, provider: &str) -> Vec<Arc<Binding>> {
        self.read()
            .files
            .get(provider)
            .map(|files| {
                files
                    .values()
                    .flat_map(|entry| entry.bindings.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bindings declared in `path`, in provider registration order.
    #[must_use]
    pub fn bindings_for_file(&self, path: &Path) -> Vec<Arc<Binding>> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|provider| state.files.get(provider)?.get(path))
            .flat_map(|entry| entry.bindings.iter().cloned())
            .collect()
    }

    /// Total number of stored bindings, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read()
            .files
            .values()
            .flat_map(BTreeMap::values)
            .map(|entry| entry.bindings.len())
            .sum()
    }

    /// Whether no bindings are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every binding and the active set, keeping the provider order.
    ///
    /// The revision counter keeps counting so updates started before the
    /// clear cannot land afterwards.
    pub fn clear(&self) {
        let fence = self.begin_update();
        let mut state = self.write();
        let paths: Vec<PathBuf> = state
            .files
            .values()
            .flat_map(BTreeMap::keys)
            .cloned()
            .collect();
        state.files.clear();
        state.active.clear();
        state.removed.clear();
        for path in paths {
            state.removed.insert(path, fence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::SourceLocation;
    use stepbind_patterns::{BindingKeyword, PatternSyntax, compile_pattern};

    fn binding(provider: &'static str, path: &str, line: usize, pattern: &str) -> Binding {
        let Ok(matcher) = compile_pattern(pattern, PatternSyntax::Regex, false) else {
            panic!("pattern {pattern} compiles");
        };
        Binding {
            keyword: BindingKeyword::Given,
            pattern_raw: pattern.to_string(),
            matcher,
            declaring_symbol: format!("Steps.Line{line}"),
            location: SourceLocation {
                path: PathBuf::from(path),
                line,
                column: 4,
                end_line: line,
                end_column: 20,
            },
            provider,
        }
    }

    fn patterns(bindings: &[Arc<Binding>]) -> Vec<&str> {
        bindings.iter().map(|b| b.pattern_raw.as_str()).collect()
    }

    fn replace_a(index: &BindingIndex, revision: u64, pattern: &str) -> bool {
        index.replace_file(
            "p",
            Path::new("a.cs"),
            revision,
            vec![binding("p", "a.cs", 1, pattern)],
        )
    }

    fn index_with(providers: &[&'static str]) -> BindingIndex {
        let index = BindingIndex::new();
        index.set_provider_order(providers.to_vec());
        index.set_active(providers.iter().copied());
        index
    }

    #[test]
    fn replacing_a_file_drops_its_previous_bindings() {
        let index = index_with(&["p"]);
        let rev = index.begin_update();
        index.replace_file(
            "p",
            Path::new("a.cs"),
            rev,
            vec![
                binding("p", "a.cs", 1, "one"),
                binding("p", "a.cs", 2, "two"),
                binding("p", "a.cs", 3, "three"),
            ],
        );
        index.replace_file("p", Path::new("b.cs"), rev, vec![binding("p", "b.cs", 1, "other")]);

        let rev = index.begin_update();
        assert!(index.replace_file(
            "p",
            Path::new("a.cs"),
            rev,
            vec![binding("p", "a.cs", 5, "only")]
        ));
        assert_eq!(patterns(&index.bindings_for_file(Path::new("a.cs"))), ["only"]);
        assert_eq!(patterns(&index.bindings_for_file(Path::new("b.cs"))), ["other"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn stale_revisions_are_discarded() {
        let index = index_with(&["p"]);
        let older = index.begin_update();
        let newer = index.begin_update();
        assert!(replace_a(&index, newer, "new"));
        assert!(!replace_a(&index, older, "old"));
        assert_eq!(patterns(&index.active_bindings()), ["new"]);
    }

    #[test]
    fn removal_fences_off_older_reparses() {
        let index = index_with(&["p"]);
        let reparse = index.begin_update();
        let delete = index.begin_update();
        assert!(index.remove_file(Path::new("a.cs"), delete));
        assert!(!replace_a(&index, reparse, "late"));
        assert!(index.is_empty());

        let recreate = index.begin_update();
        assert!(replace_a(&index, recreate, "back"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn flattened_view_follows_registration_then_path_then_line() {
        let index = index_with(&["second", "first"]);
        let rev = index.begin_update();
        index.replace_file(
            "first",
            Path::new("a.py"),
            rev,
            vec![binding("first", "a.py", 1, "f-a")],
        );
        index.replace_file(
            "second",
            Path::new("z.cs"),
            rev,
            vec![binding("second", "z.cs", 9, "s-z9"), binding("second", "z.cs", 2, "s-z2")],
        );
        index.replace_file(
            "second",
            Path::new("b.cs"),
            rev,
            vec![binding("second", "b.cs", 1, "s-b")],
        );
        assert_eq!(
            patterns(&index.active_bindings()),
            ["s-b", "s-z2", "s-z9", "f-a"]
        );
    }

    #[test]
    fn inactive_providers_are_excluded_from_the_flattened_view() {
        let index = index_with(&["a", "b"]);
        index.set_active(["b"]);
        let rev = index.begin_update();
        index.replace_file("a", Path::new("a.cs"), rev, vec![binding("a", "a.cs", 1, "from-a")]);
        index.replace_file("b", Path::new("b.py"), rev, vec![binding("b", "b.py", 1, "from-b")]);
        assert_eq!(patterns(&index.active_bindings()), ["from-b"]);
        assert_eq!(patterns(&index.provider_bindings("a")), ["from-a"]);
        assert!(!index.is_active("a"));
    }

    #[test]
    fn provider_reindex_keeps_newer_single_file_updates() {
        let index = index_with(&["p"]);
        let full = index.begin_update();
        let edit = index.begin_update();
        replace_a(&index, edit, "edited");
        index.replace_file("p", Path::new("gone.cs"), 0, vec![binding("p", "gone.cs", 1, "gone")]);

        let mut files = BTreeMap::new();
        files.insert(PathBuf::from("a.cs"), vec![binding("p", "a.cs", 1, "scanned")]);
        files.insert(PathBuf::from("b.cs"), vec![binding("p", "b.cs", 1, "b")]);
        index.replace_provider("p", full, files);

        assert_eq!(patterns(&index.active_bindings()), ["edited", "b"]);
    }

    #[test]
    fn clear_fences_in_flight_updates() {
        let index = index_with(&["p"]);
        let in_flight = index.begin_update();
        replace_a(&index, in_flight, "x");
        index.clear();
        assert!(!replace_a(&index, in_flight, "x"));
        assert!(index.is_empty());
        assert!(index.active_bindings().is_empty());
    }
}
