//! Error types shared by the literal and pattern modules.

use std::fmt;
use thiserror::Error;

/// Context for a literal that cannot be unescaped.
///
/// # Examples
/// ```
/// use stepbind_patterns::LiteralErrorInfo;
/// let info = LiteralErrorInfo::new("dangling escape", 4);
/// assert_eq!(info.to_string(), "dangling escape at byte 4 (zero-based)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralErrorInfo {
    /// Human-readable description of the problem.
    pub message: &'static str,
    /// Byte offset into the as-written literal.
    pub position: usize,
}

impl LiteralErrorInfo {
    /// Create a new literal error description.
    #[must_use]
    pub fn new(message: &'static str, position: usize) -> Self {
        Self { message, position }
    }
}

impl fmt::Display for LiteralErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {} (zero-based)", self.message, self.position)
    }
}

/// Additional context for placeholder-related parsing errors.
///
/// # Examples
/// ```
/// use stepbind_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("invalid placeholder", 3, Some("value".into()));
/// assert_eq!(info.placeholder.as_deref(), Some("value"));
/// assert_eq!(info.position, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Human-readable description of the problem.
    pub message: &'static str,
    /// Byte offset into the unescaped pattern.
    pub position: usize,
    /// Placeholder name, when one was read before the failure.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Create a new error description for a placeholder failure.
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.placeholder {
            Some(name) => write!(
                f,
                "{} for placeholder `{}` at byte {} (zero-based)",
                self.message, name, self.position
            ),
            None => write!(f, "{} at byte {} (zero-based)", self.message, self.position),
        }
    }
}

/// Errors surfaced while turning a step literal into a matcher.
///
/// # Examples
/// ```
/// use stepbind_patterns::{PatternError, PlaceholderErrorInfo};
/// let info = PlaceholderErrorInfo::new("invalid", 2, Some("count".into()));
/// let err = PatternError::Placeholder(info.clone());
/// assert_eq!(err.to_string(), info.to_string());
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The as-written literal is malformed for its dialect.
    #[error("{0}")]
    Literal(LiteralErrorInfo),
    /// A placeholder or parameter in the unescaped pattern is malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// The generated regular expression failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn literal_error(message: &'static str, position: usize) -> PatternError {
    PatternError::Literal(LiteralErrorInfo::new(message, position))
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_placeholder_with_name() {
        let info = PlaceholderErrorInfo::new("invalid", 4, Some("count".into()));
        assert_eq!(
            info.to_string(),
            "invalid for placeholder `count` at byte 4 (zero-based)"
        );
    }

    #[test]
    fn formats_placeholder_without_name() {
        let info = PlaceholderErrorInfo::new("oops", 1, None);
        assert_eq!(info.to_string(), "oops at byte 1 (zero-based)");
    }

    #[test]
    fn literal_errors_display_their_position() {
        let err = literal_error("unterminated literal", 7);
        assert_eq!(err.to_string(), "unterminated literal at byte 7 (zero-based)");
    }

    #[test]
    fn forwards_regex_error_display() {
        let err = PatternError::Regex(regex::Error::Syntax("bad".into()));
        assert_eq!(
            err.to_string(),
            regex::Error::Syntax("bad".into()).to_string()
        );
    }
}
