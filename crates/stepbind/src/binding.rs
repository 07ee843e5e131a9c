//! Step-definition records produced by binding providers.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stepbind_patterns::{
    BindingKeyword, CompiledMatcher, LiteralDialect, PatternError, PatternSyntax, compile_pattern,
    try_compile,
};
use tracing::debug;

use crate::config::StepbindConfig;

/// Options shared by every provider when parsing source files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Compile matchers case-insensitively.
    pub case_insensitive: bool,
    /// Log skipped files and dropped literals at debug level.
    pub debug: bool,
}

impl From<&StepbindConfig> for ParseOptions {
    fn from(config: &StepbindConfig) -> Self {
        Self {
            case_insensitive: config.case_insensitive,
            debug: config.debug,
        }
    }
}

/// Zero-based position of a step definition in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    /// Path of the source file.
    pub path: PathBuf,
    /// Zero-based line of the step marker.
    pub line: usize,
    /// Zero-based column (in characters) of the step marker.
    pub column: usize,
    /// Zero-based line where the pattern literal ends.
    pub end_line: usize,
    /// Zero-based column where the pattern literal ends.
    pub end_column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path.display(),
            self.line.saturating_add(1),
            self.column.saturating_add(1)
        )
    }
}

/// One step-definition occurrence with its compiled matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    /// Keyword the definition was declared with.
    pub keyword: BindingKeyword,
    /// Pattern text after literal unescaping.
    pub pattern_raw: String,
    /// Anchored matcher compiled from `pattern_raw`.
    #[serde(skip)]
    pub matcher: CompiledMatcher,
    /// Composite identifier of the implementing member.
    pub declaring_symbol: String,
    /// Where the definition is declared.
    pub location: SourceLocation,
    /// Identifier of the provider that found the definition.
    pub provider: &'static str,
}

impl Binding {
    /// Compile a step definition found by a provider into a binding.
    ///
    /// Returns `None` when the pattern cannot be unescaped or compiled; the
    /// failure is logged when `options.debug` is set.
    #[must_use]
    pub fn from_site(site: BindingSite<'_>, options: &ParseOptions) -> Option<Self> {
        let case_insensitive = options.case_insensitive || site.case_insensitive;
        match site.pattern.compile(site.syntax, case_insensitive) {
            Ok(matcher) => Some(Self {
                keyword: site.keyword,
                pattern_raw: matcher.pattern().to_owned(),
                matcher,
                declaring_symbol: site.declaring_symbol,
                location: site.location,
                provider: site.provider,
            }),
            Err(err) => {
                if options.debug {
                    debug!(
                        provider = site.provider,
                        location = %site.location,
                        pattern = site.pattern.as_written(),
                        error = %err,
                        "dropping step definition with an unusable pattern"
                    );
                }
                None
            }
        }
    }

    /// The file that declares this binding.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.location.path
    }

    /// Number of arguments the step pattern captures.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.matcher.arity()
    }

    /// Whether `text` matches this binding's pattern in full.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// The concrete syntax the pattern was interpreted with.
    #[must_use]
    pub fn syntax(&self) -> PatternSyntax {
        self.matcher.syntax()
    }
}

/// Pattern text as handed over by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternText<'a> {
    /// A host-language string literal as written, delimiters included.
    Literal {
        /// The literal text.
        text: &'a str,
        /// Escape rules of the literal.
        dialect: LiteralDialect,
    },
    /// Text that needs no unescaping, such as the body of a `/.../` literal.
    Unescaped(&'a str),
}

impl PatternText<'_> {
    fn compile(
        self,
        syntax: PatternSyntax,
        case_insensitive: bool,
    ) -> Result<CompiledMatcher, PatternError> {
        match self {
            Self::Literal { text, dialect } => try_compile(text, dialect, syntax, case_insensitive),
            Self::Unescaped(text) => compile_pattern(text, syntax, case_insensitive),
        }
    }

    fn as_written(&self) -> &str {
        match self {
            Self::Literal { text, .. } | Self::Unescaped(text) => text,
        }
    }
}

/// A step definition located by a provider, before compilation.
#[derive(Debug, Clone)]
pub struct BindingSite<'a> {
    /// Declared keyword.
    pub keyword: BindingKeyword,
    /// The pattern as found in source.
    pub pattern: PatternText<'a>,
    /// How the unescaped text is interpreted.
    pub syntax: PatternSyntax,
    /// Extra case folding requested in source, such as a `/i` flag.
    pub case_insensitive: bool,
    /// Composite identifier of the implementing member.
    pub declaring_symbol: String,
    /// Where the definition is declared.
    pub location: SourceLocation,
    /// Identifier of the contributing provider.
    pub provider: &'static str,
}
