//! Workspace file discovery.
//!
//! Providers never walk the file system themselves; they ask this module for
//! candidate files and directories under the workspace roots. Dependency,
//! build-output and VCS directories are pruned from every walk, and results
//! are returned sorted so that sampling is deterministic.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vs",
    ".vscode",
    "node_modules",
    "bin",
    "obj",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
];

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn walk_root(
    root: &Path,
    mut keep: impl FnMut(&DirEntry) -> bool,
) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(err),
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if keep(&entry) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Walk every root, skipping roots that cannot be read.
///
/// Fails only when at least one root was given and none could be walked.
fn walk_roots(
    roots: &[PathBuf],
    mut keep: impl FnMut(&DirEntry) -> bool,
) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut found = BTreeSet::new();
    let mut walked = false;
    let mut last_error = None;
    for root in roots {
        match walk_root(root, &mut keep) {
            Ok(files) => {
                walked = true;
                found.extend(files);
            }
            Err(err) => {
                debug!(root = %root.display(), error = %err, "skipping unreadable workspace root");
                last_error = Some(err);
            }
        }
    }
    match last_error {
        Some(err) if !walked => Err(err),
        _ => Ok(found.into_iter().collect()),
    }
}

/// Find regular files whose extension is one of `extensions`.
///
/// Extensions are compared case-insensitively and given without the leading
/// dot.
///
/// # Errors
///
/// Returns the walk error when no root can be read. Unreadable roots are
/// skipped while another root can be walked, and so are unreadable entries
/// below a root.
pub fn find_files_with_extensions(
    roots: &[PathBuf],
    extensions: &[&str],
) -> Result<Vec<PathBuf>, walkdir::Error> {
    walk_roots(roots, |entry| {
        entry.file_type().is_file() && has_extension(entry.path(), extensions)
    })
}

/// Find regular files accepted by `predicate`, which receives the file name.
///
/// # Errors
///
/// Returns the walk error when no root can be read.
pub fn find_files_named(
    roots: &[PathBuf],
    predicate: impl Fn(&str) -> bool,
) -> Result<Vec<PathBuf>, walkdir::Error> {
    walk_roots(roots, |entry| {
        entry.file_type().is_file() && entry.file_name().to_str().is_some_and(&predicate)
    })
}

/// Find directories whose trailing components equal `suffix`, for example
/// `["features", "steps"]`.
///
/// # Errors
///
/// Returns the walk error when no root can be read.
pub fn find_dirs_ending_with(
    roots: &[PathBuf],
    suffix: &[&str],
) -> Result<Vec<PathBuf>, walkdir::Error> {
    walk_roots(roots, |entry| {
        entry.file_type().is_dir() && ends_with_components(entry.path(), suffix)
    })
}

/// Whether a walk of `roots` never reaches `path` because it sits under an
/// ignored directory.
///
/// Only directories below a root containing `path` count. When no root
/// contains `path`, every parent directory is checked.
#[must_use]
pub fn is_pruned(path: &Path, roots: &[PathBuf]) -> bool {
    let Some(dir) = path.parent() else {
        return false;
    };
    let mut relative = roots
        .iter()
        .filter_map(|root| dir.strip_prefix(root).ok())
        .peekable();
    if relative.peek().is_none() {
        return has_ignored_component(dir);
    }
    relative.all(has_ignored_component)
}

fn has_ignored_component(dir: &Path) -> bool {
    dir.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
    })
}

/// Whether `path` carries one of `extensions`.
#[must_use]
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn ends_with_components(path: &Path, suffix: &[&str]) -> bool {
    let mut components = path.components().rev();
    suffix.iter().rev().all(|expected| {
        components
            .next()
            .is_some_and(|c| c.as_os_str() == OsStr::new(expected))
    })
}

/// Order `files` so paths mentioning any of `hints` come first, keeping the
/// relative order within each group, then keep at most `cap` of them.
#[must_use]
pub fn prioritised_sample(mut files: Vec<PathBuf>, hints: &[&str], cap: usize) -> Vec<PathBuf> {
    files.sort_by_key(|path| {
        let lowered = path.to_string_lossy().to_lowercase();
        !hints.iter().any(|hint| lowered.contains(hint))
    });
    files.truncate(cap);
    files
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require explicit failures")]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(files: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, "").expect("write file");
        }
        dir
    }

    #[test]
    fn finds_files_by_extension_and_prunes_ignored_dirs() {
        let dir = workspace(&[
            "Steps/LoginSteps.cs",
            "Steps/Other.CS",
            "bin/Debug/Generated.cs",
            "node_modules/pkg/index.cs",
            "README.md",
        ]);
        let roots = vec![dir.path().to_path_buf()];
        let files = find_files_with_extensions(&roots, &["cs"]).expect("walk");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).expect("under root").to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("Steps/LoginSteps.cs"),
                PathBuf::from("Steps/Other.CS"),
            ]
        );
    }

    #[test]
    fn overlapping_roots_do_not_duplicate_files() {
        let dir = workspace(&["a/one.py"]);
        let roots = vec![dir.path().to_path_buf(), dir.path().join("a")];
        let files = find_files_with_extensions(&roots, &["py"]).expect("walk");
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn missing_root_is_skipped_when_another_root_is_readable() {
        let dir = workspace(&["Steps/LoginSteps.cs"]);
        let roots = vec![dir.path().join("absent"), dir.path().to_path_buf()];
        let files = find_files_with_extensions(&roots, &["cs"]).expect("walk");
        assert_eq!(files, vec![dir.path().join("Steps").join("LoginSteps.cs")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = workspace(&[]);
        let roots = vec![dir.path().join("absent")];
        assert!(find_files_with_extensions(&roots, &["cs"]).is_err());
    }

    #[rstest]
    #[case::plain("Steps/LoginSteps.cs", false)]
    #[case::build_output("bin/Debug/Generated.cs", true)]
    #[case::dependency("web/node_modules/pkg/steps.js", true)]
    #[case::file_named_like_a_dir("Steps/bin", false)]
    fn pruning_matches_the_walk(#[case] relative: &str, #[case] pruned: bool) {
        let roots = vec![PathBuf::from("/work/build")];
        assert_eq!(is_pruned(&Path::new("/work/build").join(relative), &roots), pruned);
    }

    #[test]
    fn pruning_without_a_containing_root_checks_every_parent() {
        let roots = vec![PathBuf::from("/elsewhere")];
        assert!(is_pruned(Path::new("/work/obj/a.cs"), &roots));
        assert!(!is_pruned(Path::new("/work/src/a.cs"), &roots));
    }

    #[test]
    fn finds_directories_by_suffix() {
        let dir = workspace(&["features/steps/login.py", "other/steps/x.py"]);
        let roots = vec![dir.path().to_path_buf()];
        let dirs = find_dirs_ending_with(&roots, &["features", "steps"]).expect("walk");
        assert_eq!(dirs, vec![dir.path().join("features").join("steps")]);
    }

    #[test]
    fn finds_files_by_name() {
        let dir = workspace(&["package.json", "web/package.json", "node_modules/x/package.json"]);
        let roots = vec![dir.path().to_path_buf()];
        let files = find_files_named(&roots, |name| name == "package.json").expect("walk");
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn sample_prefers_hinted_paths_and_caps() {
        let files = vec![
            PathBuf::from("a/Program.cs"),
            PathBuf::from("b/LoginSteps.cs"),
            PathBuf::from("c/Util.cs"),
        ];
        let sample = prioritised_sample(files, &["steps"], 2);
        assert_eq!(
            sample,
            vec![PathBuf::from("b/LoginSteps.cs"), PathBuf::from("a/Program.cs")]
        );
    }
}
