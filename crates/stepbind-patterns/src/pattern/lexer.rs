//! Lexer for `parse`-style step templates (`I have {count:d} cukes`).

use crate::errors::PatternError;

use super::placeholder::{PlaceholderSpec, parse_placeholder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        start: usize,
        name: Option<String>,
        hint: Option<String>,
    },
    OpenBrace {
        index: usize,
    },
    CloseBrace {
        index: usize,
    },
}

fn starts_placeholder(next: Option<&u8>) -> bool {
    next.is_some_and(|&b| b.is_ascii_alphabetic() || matches!(b, b'_' | b':' | b'}'))
}

pub(crate) fn lex_template(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let bytes = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    let flush_literal = |literal: &mut String, tokens: &mut Vec<Token>| {
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(literal)));
        }
    };

    while let Some(&b) = bytes.get(pos) {
        match b {
            b'{' if bytes.get(pos + 1) == Some(&b'{') => {
                literal.push('{');
                pos += 2;
            }
            b'{' if starts_placeholder(bytes.get(pos + 1)) => {
                flush_literal(&mut literal, &mut tokens);
                let (_, PlaceholderSpec {
                    start,
                    name,
                    hint,
                    end,
                }) = parse_placeholder(bytes, pos)?;
                tokens.push(Token::Placeholder { start, name, hint });
                pos = end;
            }
            b'{' => {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::OpenBrace { index: pos });
                pos += 1;
            }
            b'}' if bytes.get(pos + 1) == Some(&b'}') => {
                literal.push('}');
                pos += 2;
            }
            b'}' => {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::CloseBrace { index: pos });
                pos += 1;
            }
            _ => {
                let Some(ch) = pattern.get(pos..).and_then(|rest| rest.chars().next()) else {
                    break;
                };
                literal.push(ch);
                pos += ch.len_utf8();
            }
        }
    }

    flush_literal(&mut literal, &mut tokens);
    Ok(tokens)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise lexing fallibility")]
mod tests {
    use super::*;

    #[test]
    fn tokenises_literals_and_placeholders() {
        let tokens = lex_template("Given {value:d}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Given ".into()),
                Token::Placeholder {
                    start: 6,
                    name: Some("value".into()),
                    hint: Some("d".into()),
                },
            ]
        );
    }

    #[test]
    fn recognises_doubled_braces_as_literals() {
        let tokens = lex_template("{{outer}} {inner}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("{outer} ".into()),
                Token::Placeholder {
                    start: 10,
                    name: Some("inner".into()),
                    hint: None,
                },
            ]
        );
    }

    #[test]
    fn keeps_multibyte_literals_intact() {
        let tokens = lex_template("café {}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("café ".into()),
                Token::Placeholder {
                    start: 6,
                    name: None,
                    hint: None,
                },
            ]
        );
    }

    #[test]
    fn records_stray_braces() {
        let tokens = lex_template("{ literal }").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenBrace { index: 0 },
                Token::Literal(" literal ".into()),
                Token::CloseBrace { index: 10 },
            ]
        );
    }
}
