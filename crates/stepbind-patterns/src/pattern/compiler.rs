//! Convert lexed `parse`-style templates into regular-expression sources.

use crate::errors::{PatternError, placeholder_error};
use crate::hint::get_type_pattern;

use super::RegexSource;
use super::lexer::{Token, lex_template};

/// Build an unanchored regular expression from a `parse`-style template.
///
/// Every placeholder contributes exactly one capture group.
pub(crate) fn build_template_regex(pat: &str) -> Result<RegexSource, PatternError> {
    let tokens = lex_template(pat)?;
    let mut regex = String::with_capacity(pat.len().saturating_mul(2));
    let mut slots = Vec::new();
    let mut stray_depth = 0usize;

    for token in tokens {
        match token {
            Token::Literal(text) => regex.push_str(&regex::escape(&text)),
            Token::Placeholder { hint, .. } => {
                regex.push('(');
                regex.push_str(get_type_pattern(hint.as_deref()));
                regex.push(')');
                slots.push(1);
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                regex.push_str(&regex::escape("{"));
            }
            Token::CloseBrace { index } => {
                if stray_depth == 0 {
                    return Err(placeholder_error(
                        "unmatched closing brace '}' in step pattern",
                        index,
                        None,
                    ));
                }
                stray_depth -= 1;
                regex.push_str(&regex::escape("}"));
            }
        }
    }

    if stray_depth != 0 {
        return Err(placeholder_error(
            "unbalanced braces in step pattern",
            pat.len(),
            None,
        ));
    }

    Ok(RegexSource { body: regex, slots })
}
