//! Step-pattern compilation shared by every stepbind binding provider.
//!
//! Step definitions arrive as quoted literals written in a host language (C#,
//! JavaScript, Python, ...). Compiling one is a two-stage affair:
//!
//! 1. [`unescape_literal`] strips the delimiters and resolves the escape
//!    sequences of the literal's [`LiteralDialect`].
//! 2. The unescaped text is interpreted according to its [`PatternSyntax`]
//!    (a regular expression, a Cucumber expression, or a `parse`-style
//!    template) and compiled into an anchored [`CompiledMatcher`].
//!
//! [`compile`] never fails loudly: an unusable literal yields `None` so the
//! caller can drop that binding and carry on with the rest of the file.

mod capture;
mod errors;
mod hint;
mod keyword;
mod literal;
mod pattern;

pub use capture::extract_captured_values;
pub use errors::{LiteralErrorInfo, PatternError, PlaceholderErrorInfo};
pub use hint::{ParameterPattern, cucumber_parameter, get_type_pattern};
pub use keyword::{BindingKeyword, StepKeyword, StepKeywordParseError, UnsupportedStepType};
pub use literal::{LiteralDialect, escape_literal, unescape_literal};
pub use pattern::{
    CompiledMatcher, PatternSyntax, build_regex_source, compile, compile_pattern, try_compile,
};
