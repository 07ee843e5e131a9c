//! Translate Cucumber expressions into regular-expression sources.
//!
//! Supported syntax: built-in parameter types (`{int}`, `{string}`, `{}`,
//! ...), optional text (`cucumber(s)`), alternation between whitespace
//! boundaries (`belly/stomach`) and backslash escapes for the special
//! characters.

use crate::errors::{PatternError, placeholder_error};
use crate::hint::{ParameterPattern, cucumber_parameter};

use super::RegexSource;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Space(char),
    Parameter(ParameterPattern),
    Optional(String),
    Alternation { index: usize },
}

fn push_text(tokens: &mut Vec<Token>, ch: char) {
    if let Some(Token::Text(text)) = tokens.last_mut() {
        text.push(ch);
    } else {
        tokens.push(Token::Text(ch.to_string()));
    }
}

fn lex_expression(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut chars = pattern.char_indices();

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                let (_, escaped) = chars.next().ok_or_else(|| {
                    placeholder_error("dangling escape in cucumber expression", index, None)
                })?;
                push_text(&mut tokens, escaped);
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(placeholder_error(
                        "missing closing '}' for parameter",
                        index,
                        Some(name),
                    ));
                }
                let parameter = cucumber_parameter(&name).ok_or_else(|| {
                    placeholder_error("undefined parameter type", index, Some(name.clone()))
                })?;
                tokens.push(Token::Parameter(parameter));
            }
            '(' => {
                let mut text = String::new();
                let mut closed = false;
                while let Some((inner_index, inner)) = chars.next() {
                    match inner {
                        ')' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let (_, escaped) = chars.next().ok_or_else(|| {
                                placeholder_error(
                                    "dangling escape in cucumber expression",
                                    inner_index,
                                    None,
                                )
                            })?;
                            text.push(escaped);
                        }
                        '{' | '(' => {
                            return Err(placeholder_error(
                                "optional text may not contain parameters or nested optionals",
                                inner_index,
                                None,
                            ));
                        }
                        other => text.push(other),
                    }
                }
                if !closed || text.is_empty() {
                    return Err(placeholder_error(
                        "optional text must be non-empty and closed with ')'",
                        index,
                        None,
                    ));
                }
                tokens.push(Token::Optional(text));
            }
            '/' => tokens.push(Token::Alternation { index }),
            ws if ws.is_whitespace() => tokens.push(Token::Space(ws)),
            other => push_text(&mut tokens, other),
        }
    }

    Ok(tokens)
}

fn push_token(regex: &mut String, slots: &mut Vec<usize>, token: &Token) {
    match token {
        Token::Text(text) => regex.push_str(&regex::escape(text)),
        Token::Space(ch) => regex.push_str(&regex::escape(&ch.to_string())),
        Token::Optional(text) => {
            regex.push_str("(?:");
            regex.push_str(&regex::escape(text));
            regex.push_str(")?");
        }
        Token::Parameter(parameter) => {
            regex.push_str(parameter.source);
            slots.push(parameter.groups);
        }
        Token::Alternation { .. } => {}
    }
}

fn push_alternation(regex: &mut String, word: &[Token]) -> Result<(), PatternError> {
    let mut alternatives: Vec<String> = vec![String::new()];
    let mut ignored_slots = Vec::new();
    for token in word {
        match token {
            Token::Alternation { index } => {
                if alternatives.last().is_some_and(String::is_empty) {
                    return Err(placeholder_error("empty alternative", *index, None));
                }
                alternatives.push(String::new());
            }
            Token::Parameter(_) => {
                return Err(placeholder_error(
                    "alternatives may not contain parameters",
                    0,
                    None,
                ));
            }
            other => {
                if let Some(current) = alternatives.last_mut() {
                    push_token(current, &mut ignored_slots, other);
                }
            }
        }
    }
    if alternatives.iter().any(String::is_empty) {
        return Err(placeholder_error("empty alternative", 0, None));
    }
    regex.push_str("(?:");
    regex.push_str(&alternatives.join("|"));
    regex.push(')');
    Ok(())
}

/// Build an unanchored regular expression from a Cucumber expression.
pub(crate) fn build_expression_regex(pattern: &str) -> Result<RegexSource, PatternError> {
    let tokens = lex_expression(pattern)?;
    let mut regex = String::with_capacity(pattern.len().saturating_mul(2));
    let mut slots = Vec::new();

    // Alternation binds between whitespace boundaries, so work word by word.
    for word in tokens.split_inclusive(|token| matches!(token, Token::Space(_))) {
        let (space, body) = match word.split_last() {
            Some((last @ Token::Space(_), body)) => (Some(last), body),
            _ => (None, word),
        };
        if body
            .iter()
            .any(|token| matches!(token, Token::Alternation { .. }))
        {
            push_alternation(&mut regex, body)?;
        } else {
            for token in body {
                push_token(&mut regex, &mut slots, token);
            }
        }
        if let Some(space) = space {
            push_token(&mut regex, &mut slots, space);
        }
    }

    Ok(RegexSource { body: regex, slots })
}

/// Whether `pattern` contains at least one recognised Cucumber parameter.
pub(crate) fn has_cucumber_parameter(pattern: &str) -> bool {
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let Some(after) = rest.get(open + 1..) else {
            return false;
        };
        let Some(close) = after.find('}') else {
            return false;
        };
        let escaped = open > 0 && rest.get(open - 1..open) == Some("\\");
        if !escaped
            && after
                .get(..close)
                .is_some_and(|name| cucumber_parameter(name).is_some())
        {
            return true;
        }
        rest = after.get(close + 1..).unwrap_or_default();
    }
    false
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise expression fallibility")]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn translates_parameters_into_groups() {
        let source = build_expression_regex("I have {int} cukes").unwrap();
        assert_eq!(source.body, r"I have ([-+]?\d+) cukes");
        assert_eq!(source.slots, vec![1]);
    }

    #[test]
    fn string_parameter_spans_two_groups() {
        let source = build_expression_regex("a user named {string}").unwrap();
        assert_eq!(source.slots, vec![2]);
    }

    #[test]
    fn translates_optional_text() {
        let source = build_expression_regex("I have {int} cucumber(s)").unwrap();
        assert!(source.body.ends_with("cucumber(?:s)?"), "{}", source.body);
    }

    #[test]
    fn translates_alternation_within_a_word() {
        let source = build_expression_regex("in my belly/stomach now").unwrap();
        assert_eq!(source.body, r"in my (?:belly|stomach) now");
    }

    #[test]
    fn escaped_specials_are_literal() {
        let source = build_expression_regex(r"a \{literal\} and \(text\)").unwrap();
        assert_eq!(source.body, r"a \{literal\} and \(text\)");
        assert!(source.slots.is_empty());
    }

    #[rstest]
    #[case("a {colour} car", "undefined parameter type")]
    #[case("a {int car", "missing closing")]
    #[case("a (broken", "optional text")]
    #[case("a /b", "empty alternative")]
    #[case("a {int}/b", "alternatives may not contain parameters")]
    fn rejects_malformed_expressions(#[case] pattern: &str, #[case] message: &str) {
        let err = build_expression_regex(pattern).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }

    #[rstest]
    #[case("a user named {string}", true)]
    #[case("I have {} items", true)]
    #[case(r"(\d{2}) items", false)]
    #[case(r"escaped \{int} braces", false)]
    #[case("plain text", false)]
    fn detects_cucumber_parameters(#[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(has_cucumber_parameter(pattern), expected);
    }
}
