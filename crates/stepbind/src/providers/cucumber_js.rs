//! Cucumber step definitions in JavaScript and TypeScript.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use stepbind_patterns::{BindingKeyword, PatternSyntax};

use super::scan::{CFamily, CodeMap, LineIndex, file_stem, scan_js_regex, scan_js_string};
use super::{BindingProvider, ProviderError, display_name, read_sample};
use crate::binding::{Binding, BindingSite, ParseOptions, PatternText};
use crate::detection::{DetectionBuilder, DetectionResult, SAMPLE_CAP, SignalCategory};
use crate::discovery::{find_files_named, find_files_with_extensions, prioritised_sample};

const ID: &str = "cucumber-js";

const PACKAGE_NAMES: &[&str] = &["@cucumber/cucumber", "cucumber"];
const DEPENDENCY_TABLES: &[&str] = &[
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];
const CONFIG_FILES: &[&str] = &[
    "cucumber.js",
    "cucumber.cjs",
    "cucumber.mjs",
    "cucumber.json",
    "cucumber.yaml",
    "cucumber.yml",
    "cucumber.ts",
];

const MANIFEST: SignalCategory = SignalCategory {
    name: "manifest",
    weight: 0.5,
};
const IMPORT: SignalCategory = SignalCategory {
    name: "import",
    weight: 0.3,
};
const CONFIG: SignalCategory = SignalCategory {
    name: "config",
    weight: 0.2,
};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bfrom\s+|\brequire\s*\(\s*|\bimport\s+)['"](?:@cucumber/cucumber|cucumber)['"]"#)
        .unwrap_or_else(|_| unreachable!())
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(Given|When|Then|defineStep)\s*\(\s*").unwrap_or_else(|_| unreachable!())
});

static HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*,\s*(?:\{[^{}]*\}\s*,\s*)?(?:(?:async\s+)?function\s*\*?\s*(\w+)|(\w+)\s*\))",
    )
    .unwrap_or_else(|_| unreachable!())
});

fn declares_cucumber(manifest: &str) -> bool {
    let Ok(json) = serde_json::from_str::<Value>(manifest) else {
        return false;
    };
    DEPENDENCY_TABLES.iter().any(|table| {
        json.get(table)
            .and_then(Value::as_object)
            .is_some_and(|deps| PACKAGE_NAMES.iter().any(|name| deps.contains_key(*name)))
    })
}

fn keyword_for(marker: &str) -> BindingKeyword {
    match marker {
        "Given" => BindingKeyword::Given,
        "When" => BindingKeyword::When,
        "Then" => BindingKeyword::Then,
        _ => BindingKeyword::Any,
    }
}

fn handler_name(source: &str, pattern_end: usize) -> Option<&str> {
    let caps = HANDLER_RE.captures(source.get(pattern_end..)?)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Provider for `@cucumber/cucumber` step definitions.
///
/// String patterns are Cucumber expressions; `/.../` literals are regular
/// expressions whose `i` flag folds case.
#[derive(Debug, Clone, Copy, Default)]
pub struct CucumberJsProvider;

impl BindingProvider for CucumberJsProvider {
    fn id(&self) -> &'static str {
        ID
    }

    fn display_name(&self) -> &'static str {
        "Cucumber.js"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["js", "mjs", "cjs", "ts", "mts", "cts", "jsx", "tsx"]
    }

    fn detect(&self, roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        let mut builder = DetectionBuilder::new(&["JavaScript", "TypeScript"]);

        let manifests = find_files_named(roots, |name| name == "package.json")?;
        if let Some((path, _)) = read_sample(&manifests).find(|(_, text)| declares_cucumber(text)) {
            let name = display_name(path);
            builder.record(
                MANIFEST,
                format!("{name} depends on @cucumber/cucumber"),
                format!("manifest:{name}"),
            );
        }

        let sources = prioritised_sample(
            find_files_with_extensions(roots, self.source_extensions())?,
            &["step", "support", "world", "hook"],
            SAMPLE_CAP,
        );
        if let Some((path, _)) = read_sample(&sources).find(|(_, text)| IMPORT_RE.is_match(text)) {
            let name = display_name(path);
            builder.record(
                IMPORT,
                format!("{name} imports @cucumber/cucumber"),
                format!("import:{name}"),
            );
        }

        if let Some(config) = find_files_named(roots, |name| CONFIG_FILES.contains(&name))?.first()
        {
            let name = display_name(config);
            builder.record(
                CONFIG,
                format!("found cucumber configuration {name}"),
                format!("config:{name}"),
            );
        }

        Ok(builder.finish("no Cucumber.js signals found"))
    }

    fn parse_file(&self, path: &Path, source: &str, options: &ParseOptions) -> Vec<Binding> {
        let lines = LineIndex::new(source);
        let code = CodeMap::new(source, CFamily::JavaScript);
        let module = file_stem(path);
        let mut bindings = Vec::new();
        for caps in MARKER_RE.captures_iter(source) {
            let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !code.is_code(marker.start()) {
                continue;
            }
            let keyword = keyword_for(marker.as_str());
            let site = if let Some(regex) = scan_js_regex(source, whole.end()) {
                let symbol = handler_name(source, regex.end).unwrap_or("<anonymous>");
                let site = BindingSite {
                    keyword,
                    pattern: PatternText::Unescaped(&regex.body),
                    syntax: PatternSyntax::Regex,
                    case_insensitive: regex.flags.contains('i'),
                    declaring_symbol: format!("{module}.{symbol}"),
                    location: lines.location(path, marker.start(), regex.end),
                    provider: ID,
                };
                Binding::from_site(site, options)
            } else if let Some(literal) = scan_js_string(source, whole.end()) {
                let symbol = handler_name(source, literal.end).unwrap_or("<anonymous>");
                let site = BindingSite {
                    keyword,
                    pattern: PatternText::Literal {
                        text: literal.text,
                        dialect: literal.dialect,
                    },
                    syntax: PatternSyntax::CucumberExpression,
                    case_insensitive: false,
                    declaring_symbol: format!("{module}.{symbol}"),
                    location: lines.location(path, marker.start(), literal.end),
                    provider: ID,
                };
                Binding::from_site(site, options)
            } else {
                None
            };
            bindings.extend(site);
        }
        bindings
    }
}
