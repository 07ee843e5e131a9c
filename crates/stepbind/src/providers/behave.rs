//! Behave step definitions in Python.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use stepbind_patterns::{BindingKeyword, PatternSyntax};

use super::scan::{LineIndex, file_stem, scan_python_literal};
use super::{BindingProvider, ProviderError, display_name, read_sample};
use crate::binding::{Binding, BindingSite, ParseOptions, PatternText};
use crate::detection::{DetectionBuilder, DetectionResult, SAMPLE_CAP, SignalCategory};
use crate::discovery::{
    find_dirs_ending_with, find_files_named, find_files_with_extensions, prioritised_sample,
};

const ID: &str = "behave";

const MANIFEST: SignalCategory = SignalCategory {
    name: "manifest",
    weight: 0.5,
};
const IMPORT: SignalCategory = SignalCategory {
    name: "import",
    weight: 0.3,
};
const STEPS_DIR: SignalCategory = SignalCategory {
    name: "steps-dir",
    weight: 0.2,
};

static MANIFEST_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[^#\n]*\bbehave\b").unwrap_or_else(|_| unreachable!())
});

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+behave(?:\.\w+)*\s+import\b|import\s+behave\b)")
        .unwrap_or_else(|_| unreachable!())
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@(?:behave\.)?(given|when|then|step|Given|When|Then|Step)\s*\(\s*")
        .unwrap_or_else(|_| unreachable!())
});

static STEP_MATCHER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:behave\.)?use_step_matcher\(\s*["'](\w+)["']\s*\)"#)
        .unwrap_or_else(|_| unreachable!())
});

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:async\s+)?def\s+(\w+)").unwrap_or_else(|_| unreachable!())
});

fn is_manifest(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    (lowered.starts_with("requirements") && lowered.ends_with(".txt"))
        || matches!(
            lowered.as_str(),
            "pyproject.toml" | "setup.py" | "setup.cfg" | "pipfile" | "tox.ini" | "environment.yml"
        )
}

fn keyword_for(marker: &str) -> BindingKeyword {
    match marker.to_ascii_lowercase().as_str() {
        "given" => BindingKeyword::Given,
        "when" => BindingKeyword::When,
        "then" => BindingKeyword::Then,
        _ => BindingKeyword::Any,
    }
}

fn syntax_for_matcher(name: &str) -> PatternSyntax {
    if name == "re" {
        PatternSyntax::Regex
    } else {
        PatternSyntax::Template
    }
}

/// Step-matcher switches in source order, as `(offset, syntax)`.
fn matcher_switches(source: &str) -> Vec<(usize, PatternSyntax)> {
    STEP_MATCHER_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some((whole.start(), syntax_for_matcher(name.as_str())))
        })
        .collect()
}

fn syntax_at(switches: &[(usize, PatternSyntax)], offset: usize) -> PatternSyntax {
    switches
        .iter()
        .take_while(|(start, _)| *start < offset)
        .last()
        .map_or(PatternSyntax::Template, |(_, syntax)| *syntax)
}

/// Provider for Python step definitions registered with Behave's
/// decorators.
///
/// Patterns use `parse` templates until the module switches to regular
/// expressions with `use_step_matcher("re")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaveProvider;

impl BindingProvider for BehaveProvider {
    fn id(&self) -> &'static str {
        ID
    }

    fn display_name(&self) -> &'static str {
        "Behave"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn detect(&self, roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        let mut builder = DetectionBuilder::new(&["Python"]);

        let manifests = find_files_named(roots, is_manifest)?;
        if let Some((path, _)) =
            read_sample(&manifests).find(|(_, text)| MANIFEST_REFERENCE_RE.is_match(text))
        {
            let name = display_name(path);
            builder.record(
                MANIFEST,
                format!("{name} depends on behave"),
                format!("manifest:{name}"),
            );
        }

        let sources = prioritised_sample(
            find_files_with_extensions(roots, self.source_extensions())?,
            &["steps", "environment"],
            SAMPLE_CAP,
        );
        if let Some((path, _)) = read_sample(&sources).find(|(_, text)| IMPORT_RE.is_match(text)) {
            let name = display_name(path);
            builder.record(
                IMPORT,
                format!("{name} imports behave"),
                format!("import:{name}"),
            );
        }

        if let Some(dir) = find_dirs_ending_with(roots, &["features", "steps"])?.first() {
            builder.record(
                STEPS_DIR,
                format!("found step directory {}", dir.display()),
                "steps-dir:features/steps",
            );
        }

        Ok(builder.finish("no behave signals found"))
    }

    fn parse_file(&self, path: &Path, source: &str, options: &ParseOptions) -> Vec<Binding> {
        let lines = LineIndex::new(source);
        let switches = matcher_switches(source);
        let module = file_stem(path);
        let mut bindings = Vec::new();
        for caps in MARKER_RE.captures_iter(source) {
            let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Some(literal) = scan_python_literal(source, whole.end()) else {
                continue;
            };
            let decorator = whole
                .start()
                .saturating_add(whole.as_str().find('@').unwrap_or(0));
            let function = source
                .get(literal.end..)
                .and_then(|tail| FUNCTION_RE.captures(tail))
                .and_then(|caps| caps.get(1))
                .map_or("<unknown>", |m| m.as_str());
            let site = BindingSite {
                keyword: keyword_for(marker.as_str()),
                pattern: PatternText::Literal {
                    text: literal.text,
                    dialect: literal.dialect,
                },
                syntax: syntax_at(&switches, marker.start()),
                case_insensitive: false,
                declaring_symbol: format!("{module}.{function}"),
                location: lines.location(path, decorator, literal.end),
                provider: ID,
            };
            bindings.extend(Binding::from_site(site, options));
        }
        bindings
    }
}
