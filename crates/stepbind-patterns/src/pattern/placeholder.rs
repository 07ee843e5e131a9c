//! `parse`-style placeholder parsing used by the template lexer.
//!
//! Placeholders take the forms `{}`, `{name}`, `{:spec}` and `{name:spec}`.

use crate::errors::{PatternError, placeholder_error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaceholderSpec {
    pub name: Option<String>,
    pub hint: Option<String>,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn parse_placeholder(
    bytes: &[u8],
    start: usize,
) -> Result<(usize, PlaceholderSpec), PatternError> {
    let mut index = start + 1;
    let mut name = String::new();
    while let Some(&b) = bytes.get(index) {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
            name.push(char::from(b));
            index += 1;
        } else {
            break;
        }
    }
    let name = (!name.is_empty()).then_some(name);

    let mut hint = None;
    if bytes.get(index) == Some(&b':') {
        index += 1;
        let hint_start = index;
        while let Some(&b) = bytes.get(index) {
            if b == b'}' {
                break;
            }
            index += 1;
        }
        let raw = bytes
            .get(hint_start..index)
            .and_then(|raw| std::str::from_utf8(raw).ok())
            .ok_or_else(|| {
                placeholder_error("invalid placeholder in step pattern", start, name.clone())
            })?;
        if raw.is_empty() || raw.chars().any(|c| c.is_whitespace() || c == '{') {
            return Err(placeholder_error(
                "invalid placeholder in step pattern",
                start,
                name,
            ));
        }
        hint = Some(raw.to_string());
    }

    if bytes.get(index) != Some(&b'}') {
        return Err(placeholder_error(
            "missing closing '}' for placeholder",
            start,
            name,
        ));
    }
    index += 1;

    Ok((
        index,
        PlaceholderSpec {
            name,
            hint,
            start,
            end: index,
        },
    ))
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests exercise placeholder parser fallibility"
)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_placeholder() {
        let pattern = "{value}";
        let (next, spec) = parse_placeholder(pattern.as_bytes(), 0).unwrap();
        assert_eq!(next, pattern.len());
        assert_eq!(spec.name.as_deref(), Some("value"));
        assert_eq!(spec.hint, None);
    }

    #[test]
    fn parses_placeholder_with_format_spec() {
        let pattern = "{count:d}";
        let (next, spec) = parse_placeholder(pattern.as_bytes(), 0).unwrap();
        assert_eq!(next, pattern.len());
        assert_eq!(spec.name.as_deref(), Some("count"));
        assert_eq!(spec.hint.as_deref(), Some("d"));
    }

    #[test]
    fn parses_anonymous_placeholders() {
        let (_, spec) = parse_placeholder(b"{}", 0).unwrap();
        assert_eq!(spec.name, None);
        let (_, spec) = parse_placeholder(b"{:w}", 0).unwrap();
        assert_eq!(spec.hint.as_deref(), Some("w"));
    }

    #[test]
    fn errors_on_missing_closing_brace() {
        let err = parse_placeholder(b"{value", 0).unwrap_err();
        assert!(err.to_string().contains("missing closing"));
    }

    #[test]
    fn errors_on_empty_format_spec() {
        let err = parse_placeholder(b"{value:}", 0).unwrap_err();
        assert!(
            err.to_string()
                .contains("invalid placeholder in step pattern")
        );
    }
}
