//! Host-language string literal dialects.
//!
//! Providers hand over the literal exactly as written in source, delimiters
//! included. Unescaping happens in a single left-to-right pass so an escaped
//! backslash is never reinterpreted by a later rule.

use serde::{Deserialize, Serialize};

use crate::errors::{PatternError, literal_error};

/// The escaping convention of an as-written string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiteralDialect {
    /// C# verbatim strings (`@"..."`): a doubled quote stands for one quote
    /// and backslashes are literal.
    Verbatim,
    /// Interpreted strings: backslash escapes for the quote characters,
    /// backslash, `n`, `r` and `t`. Other escapes keep their backslash so
    /// regex classes such as `\d` survive.
    Standard,
    /// Raw strings (Python `r"..."`, Go back-quoted): no escape processing.
    Raw,
}

impl LiteralDialect {
    fn prefix_chars(self) -> &'static [char] {
        match self {
            Self::Verbatim => &['@'],
            Self::Standard => &['u', 'U'],
            Self::Raw => &['r', 'R', 'u', 'U'],
        }
    }

    fn accepts_delimiter(self, ch: char) -> bool {
        match self {
            Self::Verbatim => ch == '"',
            Self::Standard | Self::Raw => matches!(ch, '"' | '\'' | '`'),
        }
    }
}

/// Strip the delimiters of `raw` and resolve its escape sequences.
///
/// # Errors
/// Returns [`PatternError::Literal`] when the delimiters are missing or
/// mismatched, a verbatim literal contains a lone quote, or a standard
/// literal ends in a dangling backslash or contains an unescaped delimiter.
///
/// # Examples
/// ```
/// use stepbind_patterns::{LiteralDialect, unescape_literal};
///
/// let text = unescape_literal(r#"@"say ""hi""""#, LiteralDialect::Verbatim)
///     .expect("valid verbatim literal");
/// assert_eq!(text, r#"say "hi""#);
///
/// let text = unescape_literal(r#""I have (\\d+) \"cukes\"""#, LiteralDialect::Standard)
///     .expect("valid standard literal");
/// assert_eq!(text, r#"I have (\d+) "cukes""#);
/// ```
pub fn unescape_literal(raw: &str, dialect: LiteralDialect) -> Result<String, PatternError> {
    let unprefixed = raw.trim_start_matches(dialect.prefix_chars());
    let prefix_len = raw.len() - unprefixed.len();

    let mut chars = unprefixed.chars();
    let open = chars
        .next()
        .filter(|ch| dialect.accepts_delimiter(*ch))
        .ok_or_else(|| literal_error("missing opening delimiter", prefix_len))?;
    let close = chars
        .next_back()
        .ok_or_else(|| literal_error("unterminated literal", raw.len()))?;
    if close != open {
        return Err(literal_error("unterminated literal", raw.len()));
    }

    let body = chars.as_str();
    let offset = prefix_len + open.len_utf8();
    match dialect {
        LiteralDialect::Verbatim => unescape_verbatim(body, offset),
        LiteralDialect::Standard => unescape_standard(body, open, offset),
        LiteralDialect::Raw => Ok(body.to_owned()),
    }
}

fn unescape_verbatim(body: &str, offset: usize) -> Result<String, PatternError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch == '"' && chars.next_if(|(_, next)| *next == '"').is_none() {
            return Err(literal_error(
                "unescaped quote in verbatim literal",
                offset + index,
            ));
        }
        out.push(ch);
    }
    Ok(out)
}

fn unescape_standard(body: &str, delimiter: char, offset: usize) -> Result<String, PatternError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();
    while let Some((index, ch)) = chars.next() {
        if ch == delimiter {
            return Err(literal_error("unescaped delimiter in literal", offset + index));
        }
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some((_, quote @ ('"' | '\'' | '`'))) => out.push(quote),
            Some((_, '\\')) => out.push('\\'),
            Some((_, 'n')) => out.push('\n'),
            Some((_, 'r')) => out.push('\r'),
            Some((_, 't')) => out.push('\t'),
            Some((_, other)) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(literal_error("dangling escape", offset + index)),
        }
    }
    Ok(out)
}

/// Render `text` as a literal of the given dialect.
///
/// This is the inverse of [`unescape_literal`] for the verbatim and standard
/// dialects: unescaping the result reproduces `text`. Raw literals cannot
/// represent their own delimiter, so the raw rendering is only faithful for
/// text without a double quote.
///
/// # Examples
/// ```
/// use stepbind_patterns::{LiteralDialect, escape_literal};
///
/// assert_eq!(escape_literal("a \"b\"", LiteralDialect::Verbatim), r#"@"a ""b""""#);
/// assert_eq!(escape_literal("a\\b", LiteralDialect::Standard), r#""a\\b""#);
/// ```
#[must_use]
pub fn escape_literal(text: &str, dialect: LiteralDialect) -> String {
    match dialect {
        LiteralDialect::Verbatim => format!("@\"{}\"", text.replace('"', "\"\"")),
        LiteralDialect::Raw => format!("r\"{text}\""),
        LiteralDialect::Standard => {
            let mut out = String::with_capacity(text.len() + 2);
            out.push('"');
            for ch in text.chars() {
                match ch {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
            out
        }
    }
}
