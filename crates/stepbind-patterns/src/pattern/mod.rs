//! Step-pattern interpretation and anchored matcher compilation.

mod compiler;
mod expression;
mod lexer;
mod placeholder;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::capture::extract_slotted_values;
use crate::errors::PatternError;
use crate::literal::{LiteralDialect, unescape_literal};

use compiler::build_template_regex;
use expression::{build_expression_regex, has_cucumber_parameter};

/// How the unescaped text of a step literal is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternSyntax {
    /// A regular expression (Reqnroll, Cucumber-JVM, `/.../` literals).
    Regex,
    /// A Cucumber expression such as `I have {int} cucumber(s)`.
    CucumberExpression,
    /// A `parse`-style template such as `I have {count:d} cukes` (Behave).
    Template,
    /// Reqnroll's rule: anchored text or text without a recognised Cucumber
    /// parameter is a regex; anything else is a Cucumber expression.
    Auto,
}

impl PatternSyntax {
    /// Resolve [`PatternSyntax::Auto`] against a concrete pattern.
    ///
    /// Other variants are returned unchanged.
    ///
    /// # Examples
    /// ```
    /// use stepbind_patterns::PatternSyntax;
    ///
    /// assert_eq!(PatternSyntax::Auto.resolve("^I have (\\d+)$"), PatternSyntax::Regex);
    /// assert_eq!(
    ///     PatternSyntax::Auto.resolve("a user named {string}"),
    ///     PatternSyntax::CucumberExpression
    /// );
    /// assert_eq!(PatternSyntax::Auto.resolve("I log in"), PatternSyntax::Regex);
    /// ```
    #[must_use]
    pub fn resolve(self, pattern: &str) -> Self {
        match self {
            Self::Auto if pattern.starts_with('^') || pattern.ends_with('$') => Self::Regex,
            Self::Auto if has_cucumber_parameter(pattern) => Self::CucumberExpression,
            Self::Auto => Self::Regex,
            other => other,
        }
    }
}

/// Unanchored regex body plus the number of groups each parameter spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegexSource {
    pub body: String,
    pub slots: Vec<usize>,
}

/// An anchored matcher compiled from one step pattern.
///
/// The matcher only accepts text matching the pattern in full; it is cheap to
/// clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    pattern: String,
    syntax: PatternSyntax,
    regex: Regex,
    slots: Vec<usize>,
}

impl CompiledMatcher {
    /// The unescaped pattern text the matcher was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The concrete syntax used to interpret the pattern.
    #[must_use]
    pub fn syntax(&self) -> PatternSyntax {
        self.syntax
    }

    /// The anchored regular expression backing the matcher.
    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Number of arguments the pattern captures.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `text` matches the pattern in full.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Argument values captured from `text`, or `None` when it does not match.
    ///
    /// # Examples
    /// ```
    /// use stepbind_patterns::{PatternSyntax, compile_pattern};
    ///
    /// let matcher = compile_pattern(
    ///     "a user named {string}",
    ///     PatternSyntax::CucumberExpression,
    ///     false,
    /// )
    /// .expect("valid expression");
    /// assert_eq!(matcher.captures("a user named \"Alice\""), Some(vec!["Alice".to_string()]));
    /// ```
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        extract_slotted_values(&self.regex, &self.slots, text)
    }
}

impl PartialEq for CompiledMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.slots == other.slots
    }
}

impl Eq for CompiledMatcher {}

fn build_source(
    pattern: &str,
    syntax: PatternSyntax,
) -> Result<(PatternSyntax, RegexSource), PatternError> {
    let syntax = syntax.resolve(pattern);
    let source = match syntax {
        PatternSyntax::CucumberExpression => build_expression_regex(pattern)?,
        PatternSyntax::Template => build_template_regex(pattern)?,
        PatternSyntax::Regex | PatternSyntax::Auto => RegexSource {
            body: pattern.to_owned(),
            slots: Vec::new(),
        },
    };
    Ok((syntax, source))
}

fn anchor(body: &str) -> String {
    format!("^(?:{body})$")
}

/// Build the anchored regular-expression source for a pattern.
///
/// # Errors
/// Returns [`PatternError`] when a placeholder or parameter is malformed.
///
/// # Examples
/// ```
/// use stepbind_patterns::{PatternSyntax, build_regex_source};
///
/// let source = build_regex_source("I have {count:d} cukes", PatternSyntax::Template)
///     .expect("valid template");
/// assert_eq!(source, r"^(?:I have ([+-]?\d+) cukes)$");
/// ```
pub fn build_regex_source(pattern: &str, syntax: PatternSyntax) -> Result<String, PatternError> {
    let (_, source) = build_source(pattern, syntax)?;
    Ok(anchor(&source.body))
}

/// Compile an already unescaped pattern into an anchored matcher.
///
/// # Errors
/// Returns [`PatternError`] when the pattern is malformed for its syntax or
/// the resulting regex fails to compile.
pub fn compile_pattern(
    pattern: &str,
    syntax: PatternSyntax,
    case_insensitive: bool,
) -> Result<CompiledMatcher, PatternError> {
    let (syntax, source) = build_source(pattern, syntax)?;
    let regex = RegexBuilder::new(&anchor(&source.body))
        .case_insensitive(case_insensitive)
        .build()?;
    let slots = match syntax {
        PatternSyntax::Regex | PatternSyntax::Auto => {
            vec![1; regex.captures_len().saturating_sub(1)]
        }
        PatternSyntax::CucumberExpression | PatternSyntax::Template => source.slots,
    };
    Ok(CompiledMatcher {
        pattern: pattern.to_owned(),
        syntax,
        regex,
        slots,
    })
}

/// Unescape an as-written literal and compile it into an anchored matcher.
///
/// # Errors
/// Returns [`PatternError`] when the literal cannot be unescaped or the
/// pattern cannot be compiled.
pub fn try_compile(
    raw_literal: &str,
    dialect: LiteralDialect,
    syntax: PatternSyntax,
    case_insensitive: bool,
) -> Result<CompiledMatcher, PatternError> {
    let pattern = unescape_literal(raw_literal, dialect)?;
    compile_pattern(&pattern, syntax, case_insensitive)
}

/// Unescape and compile a literal, returning `None` when either stage fails.
///
/// This is the entry point providers use: a literal that cannot be compiled
/// yields no binding rather than an error.
///
/// # Examples
/// ```
/// use stepbind_patterns::{LiteralDialect, PatternSyntax, compile};
///
/// let matcher = compile(r#""a user logs in""#, LiteralDialect::Standard, PatternSyntax::Regex, false)
///     .expect("valid literal");
/// assert!(matcher.is_match("a user logs in"));
/// assert!(!matcher.is_match("a user logs in successfully"));
///
/// assert!(compile(r#""unclosed (group""#, LiteralDialect::Standard, PatternSyntax::Regex, false).is_none());
/// ```
#[must_use]
pub fn compile(
    raw_literal: &str,
    dialect: LiteralDialect,
    syntax: PatternSyntax,
    case_insensitive: bool,
) -> Option<CompiledMatcher> {
    try_compile(raw_literal, dialect, syntax, case_insensitive).ok()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise compilation fallibility")]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn literal_patterns_are_anchored() {
        let matcher = compile_pattern("a user logs in", PatternSyntax::Regex, false).unwrap();
        assert!(matcher.is_match("a user logs in"));
        assert!(!matcher.is_match("a user logs in successfully"));
        assert!(!matcher.is_match("then a user logs in"));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let matcher = compile_pattern("yes|no", PatternSyntax::Regex, false).unwrap();
        assert!(matcher.is_match("no"));
        assert!(!matcher.is_match("yes please"));
    }

    #[test]
    fn explicit_anchors_are_tolerated() {
        let matcher = compile_pattern(r"^I have (\d+) items$", PatternSyntax::Regex, false).unwrap();
        assert!(matcher.is_match("I have 3 items"));
        assert_eq!(matcher.arity(), 1);
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn case_sensitivity_follows_configuration(#[case] insensitive: bool, #[case] expected: bool) {
        let matcher = compile_pattern("A User", PatternSyntax::Regex, insensitive).unwrap();
        assert_eq!(matcher.is_match("a user"), expected);
    }

    #[test]
    fn unsupported_regex_features_do_not_compile() {
        assert!(compile_pattern(r"(?<=x)y", PatternSyntax::Regex, false).is_err());
        assert!(
            compile(r#""(?<=x)y""#, LiteralDialect::Standard, PatternSyntax::Regex, false)
                .is_none()
        );
    }

    #[test]
    fn auto_syntax_picks_cucumber_expressions() {
        let matcher = compile(
            r#""a user with name {string}""#,
            LiteralDialect::Standard,
            PatternSyntax::Auto,
            false,
        )
        .unwrap();
        assert_eq!(matcher.syntax(), PatternSyntax::CucumberExpression);
        assert!(matcher.is_match(r#"a user with name "Alice""#));
        assert_eq!(matcher.arity(), 1);
        assert_eq!(
            matcher.captures(r#"a user with name "Alice""#),
            Some(vec!["Alice".to_string()])
        );
    }

    #[test]
    fn verbatim_regex_literals_keep_backslashes() {
        let matcher = compile(
            r#"@"I have (\d+) ""items""""#,
            LiteralDialect::Verbatim,
            PatternSyntax::Regex,
            false,
        )
        .unwrap();
        assert_eq!(matcher.pattern(), r#"I have (\d+) "items""#);
        assert!(matcher.is_match(r#"I have 12 "items""#));
    }

    #[test]
    fn template_patterns_capture_typed_values() {
        let matcher =
            compile_pattern("I eat {count:d} cukes", PatternSyntax::Template, false).unwrap();
        assert_eq!(matcher.captures("I eat 12 cukes"), Some(vec!["12".to_string()]));
        assert!(!matcher.is_match("I eat many cukes"));
    }

    #[test]
    fn identical_patterns_compare_equal() {
        let a = compile_pattern("same", PatternSyntax::Regex, false).unwrap();
        let b = compile_pattern("same", PatternSyntax::Auto, false).unwrap();
        assert_eq!(a, b);
    }
}
