//! Reqnroll and SpecFlow step definitions in C#.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use stepbind_patterns::{BindingKeyword, PatternSyntax};

use super::scan::{CFamily, CodeMap, LineIndex, scan_csharp_literal};
use super::{BindingProvider, ProviderError, display_name, read_sample};
use crate::binding::{Binding, BindingSite, ParseOptions, PatternText};
use crate::detection::{DetectionBuilder, DetectionResult, SAMPLE_CAP, SignalCategory};
use crate::discovery::{find_files_named, find_files_with_extensions, prioritised_sample};

const ID: &str = "reqnroll";

const MANIFEST: SignalCategory = SignalCategory {
    name: "manifest",
    weight: 0.5,
};
const BINDING_ATTRIBUTE: SignalCategory = SignalCategory {
    name: "binding-attribute",
    weight: 0.3,
};
const USING_DIRECTIVE: SignalCategory = SignalCategory {
    name: "using",
    weight: 0.2,
};

static MANIFEST_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Reqnroll|SpecFlow)\b").unwrap_or_else(|_| unreachable!())
});

static BINDING_ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(?:(?:Reqnroll|TechTalk\.SpecFlow)\.)?Binding(?:Attribute)?\s*(?:\(\s*\))?\s*\]")
        .unwrap_or_else(|_| unreachable!())
});

static USING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:global\s+)?using\s+(Reqnroll|TechTalk\.SpecFlow)\s*;")
        .unwrap_or_else(|_| unreachable!())
});

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\[|,)\s*(?:(?:global::)?(?:Reqnroll|TechTalk\.SpecFlow)\.)?(Given|When|Then|StepDefinition)(?:Attribute)?\s*\(\s*",
    )
    .unwrap_or_else(|_| unreachable!())
});

static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:class|record|struct)\s+(\w+)").unwrap_or_else(|_| unreachable!())
});

static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\w.<>\[\]?,]+\s+)*?(\w+)\s*(?:<[^<>()]*>)?\s*\(")
        .unwrap_or_else(|_| unreachable!())
});

fn is_manifest(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    lowered.ends_with(".csproj")
        || matches!(
            lowered.as_str(),
            "packages.config" | "directory.packages.props" | "directory.build.props"
        )
}

fn keyword_for(marker: &str) -> BindingKeyword {
    match marker {
        "Given" => BindingKeyword::Given,
        "When" => BindingKeyword::When,
        "Then" => BindingKeyword::Then,
        _ => BindingKeyword::Any,
    }
}

/// Skip the rest of the attribute list closing at the first `]`, any further
/// attribute lists, and line comments.
fn member_declaration(source: &str, literal_end: usize) -> Option<&str> {
    let tail = source.get(literal_end..)?;
    let mut rest = tail.get(tail.find(']')?.saturating_add(1)..)?;
    loop {
        rest = rest.trim_start();
        if rest.starts_with('[') {
            rest = skip_bracketed(rest)?;
        } else if rest.starts_with("//") {
            rest = rest.get(rest.find('\n')?..)?;
        } else {
            return Some(rest);
        }
    }
}

fn skip_bracketed(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth = depth.saturating_add(1),
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text.get(idx.saturating_add(1)..);
                }
            }
            _ => {}
        }
    }
    None
}

fn method_name(source: &str, literal_end: usize) -> Option<&str> {
    let declaration = member_declaration(source, literal_end)?;
    METHOD_RE
        .captures(declaration)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The `{` opening the body of a type declared before `from`, or `None` for
/// a body-less declaration such as `record Point(int X, int Y);`.
fn body_open(source: &str, code: &CodeMap, from: usize) -> Option<usize> {
    source
        .bytes()
        .enumerate()
        .skip(from)
        .filter(|(idx, _)| code.is_code(*idx))
        .find(|(_, byte)| matches!(*byte, b'{' | b';'))
        .filter(|(_, byte)| *byte == b'{')
        .map(|(idx, _)| idx)
}

/// Name of the innermost type whose body contains `offset`.
fn enclosing_type<'s>(source: &'s str, code: &CodeMap, offset: usize) -> Option<&'s str> {
    let head = source.get(..offset)?;
    TYPE_RE
        .captures_iter(head)
        .filter(|caps| caps.get(0).is_some_and(|kw| code.is_code(kw.start())))
        .filter_map(|caps| caps.get(1))
        .filter(|name| {
            body_open(source, code, name.end()).is_some_and(|open| {
                open < offset
                    && code
                        .block_end(source, open)
                        .is_none_or(|close| close > offset)
            })
        })
        .last()
        .map(|m| m.as_str())
}

fn declaring_symbol(type_name: Option<&str>, method: Option<&str>) -> String {
    match (type_name, method) {
        (Some(type_name), Some(method)) => format!("{type_name}.{method}"),
        (None, Some(name)) | (Some(name), None) => name.to_owned(),
        (None, None) => "<unknown>".to_owned(),
    }
}

/// Reference provider for C# step definitions declared with Reqnroll or
/// SpecFlow attributes.
///
/// Patterns use Reqnroll's rule for telling regular expressions and Cucumber
/// expressions apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqnrollProvider;

impl BindingProvider for ReqnrollProvider {
    fn id(&self) -> &'static str {
        ID
    }

    fn display_name(&self) -> &'static str {
        "Reqnroll / SpecFlow"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }

    fn detect(&self, roots: &[PathBuf]) -> Result<DetectionResult, ProviderError> {
        let mut builder = DetectionBuilder::new(&["C#"]);

        let manifests = find_files_named(roots, is_manifest)?;
        if let Some((path, _)) =
            read_sample(&manifests).find(|(_, text)| MANIFEST_REFERENCE_RE.is_match(text))
        {
            let name = display_name(path);
            builder.record(
                MANIFEST,
                format!("{name} references Reqnroll or SpecFlow"),
                format!("manifest:{name}"),
            );
        }

        let sources = prioritised_sample(
            find_files_with_extensions(roots, self.source_extensions())?,
            &["step", "binding", "hook"],
            SAMPLE_CAP,
        );
        for (path, text) in read_sample(&sources) {
            let name = display_name(path);
            if !builder.has(BINDING_ATTRIBUTE) && BINDING_ATTRIBUTE_RE.is_match(&text) {
                builder.record(
                    BINDING_ATTRIBUTE,
                    format!("{name} declares a [Binding] class"),
                    format!("binding-attribute:{name}"),
                );
            }
            if !builder.has(USING_DIRECTIVE) {
                if let Some(namespace) = USING_RE.captures(&text).and_then(|caps| caps.get(1)) {
                    builder.record(
                        USING_DIRECTIVE,
                        format!("{name} imports {}", namespace.as_str()),
                        format!("using:{name}"),
                    );
                }
            }
            if builder.has(BINDING_ATTRIBUTE) && builder.has(USING_DIRECTIVE) {
                break;
            }
        }

        Ok(builder.finish("no Reqnroll or SpecFlow signals found"))
    }

    fn parse_file(&self, path: &Path, source: &str, options: &ParseOptions) -> Vec<Binding> {
        let lines = LineIndex::new(source);
        let code = CodeMap::new(source, CFamily::CSharp);
        let mut bindings = Vec::new();
        for caps in MARKER_RE.captures_iter(source) {
            let (Some(whole), Some(marker)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if !code.is_code(marker.start()) {
                continue;
            }
            let Some(literal) = scan_csharp_literal(source, whole.end()) else {
                continue;
            };
            let site = BindingSite {
                keyword: keyword_for(marker.as_str()),
                pattern: PatternText::Literal {
                    text: literal.text,
                    dialect: literal.dialect,
                },
                syntax: PatternSyntax::Auto,
                case_insensitive: false,
                declaring_symbol: declaring_symbol(
                    enclosing_type(source, &code, marker.start()),
                    method_name(source, literal.end),
                ),
                location: lines.location(path, marker.start(), literal.end),
                provider: ID,
            };
            bindings.extend(Binding::from_site(site, options));
        }
        bindings
    }
}
