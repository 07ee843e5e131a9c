//! Source-text scanning helpers shared by the providers.
//!
//! Providers locate step markers with regular expressions and then hand the
//! byte offset just after the marker to one of the literal scanners here. The
//! scanners only find where a literal ends; unescaping is left to
//! `stepbind_patterns`.

use std::ops::Range;
use std::path::{Path, PathBuf};

use stepbind_patterns::LiteralDialect;

use crate::binding::SourceLocation;

/// Maps byte offsets to zero-based line and column positions.
#[derive(Debug)]
pub(crate) struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx.saturating_add(1)),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Zero-based `(line, column)` of `offset`, with the column counted in
    /// characters.
    pub(crate) fn position(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = self
            .source
            .get(line_start..offset)
            .map_or(0, |text| text.chars().count());
        (line, column)
    }

    /// Build the location of a definition whose marker starts at `start` and
    /// whose literal ends at `end`.
    pub(crate) fn location(&self, path: &Path, start: usize, end: usize) -> SourceLocation {
        let (line, column) = self.position(start);
        let (end_line, end_column) = self.position(end);
        SourceLocation {
            path: PathBuf::from(path),
            line,
            column,
            end_line,
            end_column,
        }
    }
}

/// A literal located in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScannedLiteral<'a> {
    /// The literal exactly as written, prefix and delimiters included.
    pub text: &'a str,
    pub dialect: LiteralDialect,
    /// Byte offset just past the closing delimiter.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escapes {
    Backslash,
    DoubledQuote,
}

/// Find the end (exclusive) of a quoted run opened at `open`.
///
/// Only back-quoted runs may span lines.
fn scan_quoted(bytes: &[u8], open: usize, escapes: Escapes) -> Option<usize> {
    let delimiter = *bytes.get(open)?;
    let mut idx = open.saturating_add(1);
    loop {
        let byte = *bytes.get(idx)?;
        match (byte, escapes) {
            (b'\\', Escapes::Backslash) => idx = idx.saturating_add(2),
            (b'\n', _) if delimiter != b'`' && escapes == Escapes::Backslash => return None,
            (b, Escapes::DoubledQuote) if b == delimiter => {
                if bytes.get(idx.saturating_add(1)) == Some(&delimiter) {
                    idx = idx.saturating_add(2);
                } else {
                    return Some(idx.saturating_add(1));
                }
            }
            (b, _) if b == delimiter => return Some(idx.saturating_add(1)),
            _ => idx = idx.saturating_add(1),
        }
    }
}

fn literal_at(
    source: &str,
    start: usize,
    open: usize,
    escapes: Escapes,
    dialect: LiteralDialect,
) -> Option<ScannedLiteral<'_>> {
    let end = scan_quoted(source.as_bytes(), open, escapes)?;
    Some(ScannedLiteral {
        text: source.get(start..end)?,
        dialect,
        end,
    })
}

/// Scan a C# string literal (`"..."` or `@"..."`) starting at `start`.
///
/// Interpolated and raw string literals are not step patterns and yield
/// `None`.
pub(crate) fn scan_csharp_literal(source: &str, start: usize) -> Option<ScannedLiteral<'_>> {
    let rest = source.get(start..)?;
    if rest.starts_with("@\"") {
        literal_at(
            source,
            start,
            start.saturating_add(1),
            Escapes::DoubledQuote,
            LiteralDialect::Verbatim,
        )
    } else if rest.starts_with("\"\"\"") {
        None
    } else if rest.starts_with('"') {
        literal_at(
            source,
            start,
            start,
            Escapes::Backslash,
            LiteralDialect::Standard,
        )
    } else {
        None
    }
}

/// Scan a Python string literal with an optional `r`/`u` prefix.
///
/// Byte strings, f-strings and triple-quoted strings yield `None`.
pub(crate) fn scan_python_literal(source: &str, start: usize) -> Option<ScannedLiteral<'_>> {
    let rest = source.get(start..)?;
    let (dialect, open) = match rest.as_bytes() {
        [b'r' | b'R', b'"' | b'\'', ..] => (LiteralDialect::Raw, start.saturating_add(1)),
        [b'u' | b'U', b'"' | b'\'', ..] => (LiteralDialect::Standard, start.saturating_add(1)),
        [b'"' | b'\'', ..] => (LiteralDialect::Standard, start),
        _ => return None,
    };
    let quoted = source.get(open..)?;
    if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        return None;
    }
    literal_at(source, start, open, Escapes::Backslash, dialect)
}

/// Scan a JavaScript or TypeScript string literal, including template
/// literals without substitutions.
pub(crate) fn scan_js_string(source: &str, start: usize) -> Option<ScannedLiteral<'_>> {
    match source.as_bytes().get(start)? {
        b'"' | b'\'' | b'`' => {}
        _ => return None,
    }
    let literal = literal_at(
        source,
        start,
        start,
        Escapes::Backslash,
        LiteralDialect::Standard,
    )?;
    if literal.text.starts_with('`') && literal.text.contains("${") {
        return None;
    }
    Some(literal)
}

/// A JavaScript regular-expression literal such as `/^I have (\d+)$/i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegexLiteral {
    /// The expression body with `\/` unescaped.
    pub body: String,
    /// Trailing flags.
    pub flags: String,
    /// Byte offset just past the flags.
    pub end: usize,
}

/// Scan a JavaScript regular-expression literal starting at `start`.
pub(crate) fn scan_js_regex(source: &str, start: usize) -> Option<RegexLiteral> {
    let bytes = source.as_bytes();
    if bytes.get(start) != Some(&b'/') {
        return None;
    }
    let body_start = start.saturating_add(1);
    let mut idx = body_start;
    let mut in_class = false;
    let body_end = loop {
        match *bytes.get(idx)? {
            b'\\' => idx = idx.saturating_add(2),
            b'\n' => return None,
            b'[' => {
                in_class = true;
                idx = idx.saturating_add(1);
            }
            b']' => {
                in_class = false;
                idx = idx.saturating_add(1);
            }
            b'/' if !in_class => break idx,
            _ => idx = idx.saturating_add(1),
        }
    };
    let flags_start = body_end.saturating_add(1);
    let flags_len = source
        .get(flags_start..)?
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    let end = flags_start.saturating_add(flags_len);
    Some(RegexLiteral {
        body: source.get(body_start..body_end)?.replace("\\/", "/"),
        flags: source.get(flags_start..end)?.to_owned(),
        end,
    })
}

/// C-family languages understood by [`CodeMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CFamily {
    CSharp,
    JavaScript,
}

/// Comment and string-literal ranges of a C-family source file.
///
/// Both range lists are sorted and non-overlapping. Offsets outside them are
/// code.
#[derive(Debug, Default)]
pub(crate) struct CodeMap {
    comments: Vec<Range<usize>>,
    literals: Vec<Range<usize>>,
}

impl CodeMap {
    pub(crate) fn new(source: &str, language: CFamily) -> Self {
        let bytes = source.as_bytes();
        let mut map = Self::default();
        let mut last_code = None;
        let mut idx = 0;
        while let Some(&byte) = bytes.get(idx) {
            let next = bytes.get(idx.saturating_add(1)).copied();
            let skipped = match (byte, next) {
                (b'/', Some(b'/')) => Some((Skipped::Comment, line_end(bytes, idx))),
                (b'/', Some(b'*')) => {
                    let end = find_from(bytes, idx.saturating_add(2), b"*/")
                        .map_or(bytes.len(), |close| close.saturating_add(2));
                    Some((Skipped::Comment, end))
                }
                (b'/', _) if language == CFamily::JavaScript && regex_may_start(last_code) => {
                    scan_js_regex(source, idx).map(|regex| (Skipped::Literal, regex.end))
                }
                (b'@' | b'$', _) if language == CFamily::CSharp => {
                    csharp_prefixed_end(bytes, idx).map(|end| (Skipped::Literal, end))
                }
                (b'"', Some(b'"'))
                    if language == CFamily::CSharp
                        && bytes.get(idx.saturating_add(2)) == Some(&b'"') =>
                {
                    let end = find_from(bytes, idx.saturating_add(3), b"\"\"\"")
                        .map_or(bytes.len(), |close| close.saturating_add(3));
                    Some((Skipped::Literal, end))
                }
                (b'"' | b'\'' | b'`', _) if byte != b'`' || language == CFamily::JavaScript => {
                    scan_quoted(bytes, idx, Escapes::Backslash).map(|end| (Skipped::Literal, end))
                }
                _ => None,
            };
            match skipped {
                Some((kind, end)) => {
                    let end = end.max(idx.saturating_add(1));
                    match kind {
                        Skipped::Comment => map.comments.push(idx..end),
                        Skipped::Literal => {
                            map.literals.push(idx..end);
                            last_code = Some(b'"');
                        }
                    }
                    idx = end;
                }
                None => {
                    if !byte.is_ascii_whitespace() {
                        last_code = Some(byte);
                    }
                    idx = idx.saturating_add(1);
                }
            }
        }
        map
    }

    /// Whether `offset` lies inside a comment.
    pub(crate) fn in_comment(&self, offset: usize) -> bool {
        contains(&self.comments, offset)
    }

    /// Whether `offset` lies outside every comment and string literal.
    pub(crate) fn is_code(&self, offset: usize) -> bool {
        !self.in_comment(offset) && !contains(&self.literals, offset)
    }

    /// Offset of the `}` closing the block opened by the `{` at `open`.
    pub(crate) fn block_end(&self, source: &str, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, byte) in source.bytes().enumerate().skip(open) {
            if !self.is_code(idx) {
                continue;
            }
            match byte {
                b'{' => depth = depth.saturating_add(1),
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy)]
enum Skipped {
    Comment,
    Literal,
}

fn contains(ranges: &[Range<usize>], offset: usize) -> bool {
    let idx = ranges.partition_point(|range| range.end <= offset);
    ranges.get(idx).is_some_and(|range| range.start <= offset)
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes
        .iter()
        .skip(from)
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |len| from.saturating_add(len))
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from.saturating_add(pos))
}

/// A `/` after one of these starts a regular expression rather than a
/// division.
fn regex_may_start(last_code: Option<u8>) -> bool {
    last_code.is_none_or(|byte| b"(,=:[!&|?{};+-*%<>~^".contains(&byte))
}

/// End of a C# `@"..."`, `$"..."`, `$@"..."` or `@$"..."` literal at `start`.
fn csharp_prefixed_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut verbatim = false;
    let mut idx = start;
    loop {
        match *bytes.get(idx)? {
            b'@' => verbatim = true,
            b'$' => {}
            b'"' if idx > start => break,
            _ => return None,
        }
        idx = idx.saturating_add(1);
    }
    let escapes = if verbatim {
        Escapes::DoubledQuote
    } else {
        Escapes::Backslash
    };
    scan_quoted(bytes, idx, escapes)
}

/// Stem of `path` used as a module or file name in declaring symbols.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests require explicit failures")]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn positions_are_zero_based() {
        let source = "first\nsecond line\n  third";
        let lines = LineIndex::new(source);
        assert_eq!(lines.position(0), (0, 0));
        assert_eq!(lines.position(6), (1, 0));
        assert_eq!(lines.position(13), (1, 7));
        assert_eq!(lines.position(21), (2, 3));
    }

    #[test]
    fn columns_count_characters() {
        let source = "é = \"x\"";
        let lines = LineIndex::new(source);
        let offset = source.find('"').expect("quote present");
        assert_eq!(lines.position(offset), (0, 4));
    }

    #[rstest]
    #[case(r#""plain" rest"#, r#""plain""#, LiteralDialect::Standard)]
    #[case(r#""esc \"q\"" rest"#, r#""esc \"q\"""#, LiteralDialect::Standard)]
    #[case(r#"@"I have ""x"" (\d+)")]"#, r#"@"I have ""x"" (\d+)""#, LiteralDialect::Verbatim)]
    fn csharp_literals_end_at_their_closing_quote(
        #[case] source: &str,
        #[case] expected: &str,
        #[case] dialect: LiteralDialect,
    ) {
        let literal = scan_csharp_literal(source, 0).expect("literal");
        assert_eq!(literal.text, expected);
        assert_eq!(literal.dialect, dialect);
        assert_eq!(literal.end, expected.len());
    }

    #[rstest]
    #[case("$\"interpolated {x}\"")]
    #[case("\"\"\"raw\"\"\"")]
    #[case("\"unterminated\nnext\"")]
    #[case("nameof(x)")]
    fn non_pattern_csharp_literals_are_skipped(#[case] source: &str) {
        assert!(scan_csharp_literal(source, 0).is_none());
    }

    #[rstest]
    #[case(r#"r"I wait (\d+)")"#, r#"r"I wait (\d+)""#, LiteralDialect::Raw)]
    #[case(r#"u'unicode')"#, r#"u'unicode'"#, LiteralDialect::Standard)]
    #[case(r#"'it\'s')"#, r#"'it\'s'"#, LiteralDialect::Standard)]
    fn python_literals_keep_their_prefix(
        #[case] source: &str,
        #[case] expected: &str,
        #[case] dialect: LiteralDialect,
    ) {
        let literal = scan_python_literal(source, 0).expect("literal");
        assert_eq!(literal.text, expected);
        assert_eq!(literal.dialect, dialect);
    }

    #[rstest]
    #[case(r#"b"bytes""#)]
    #[case(r#"f"{x}""#)]
    #[case(r#""""doc""""#)]
    fn unsupported_python_literals_are_skipped(#[case] source: &str) {
        assert!(scan_python_literal(source, 0).is_none());
    }

    #[test]
    fn js_template_literals_without_substitutions_are_kept() {
        let literal = scan_js_string("`a {int} b`, fn", 0).expect("literal");
        assert_eq!(literal.text, "`a {int} b`");
        assert!(scan_js_string("`a ${x}`", 0).is_none());
    }

    #[test]
    fn js_regex_literals_capture_body_and_flags() {
        let literal = scan_js_regex(r"/^a\/b [/x] (\d+)$/i, fn", 0).expect("regex literal");
        assert_eq!(literal.body, r"^a/b [/x] (\d+)$");
        assert_eq!(literal.flags, "i");
        assert_eq!(literal.end, 20);
    }

    fn offset(source: &str, needle: &str) -> usize {
        source.find(needle).expect("needle present")
    }

    #[test]
    fn line_comments_end_at_the_newline() {
        let source = "  // [Given(\"x\")]\n[When(\"y\")]";
        let map = CodeMap::new(source, CFamily::CSharp);
        assert!(map.in_comment(offset(source, "[Given")));
        assert!(map.is_code(offset(source, "[When")));
    }

    #[test]
    fn block_comments_span_lines() {
        let source = "/*\n    [Given(\"x\")]\n*/\n[When(\"y\")]";
        let map = CodeMap::new(source, CFamily::CSharp);
        assert!(map.in_comment(offset(source, "[Given")));
        assert!(map.is_code(offset(source, "[When")));
    }

    #[rstest]
    #[case::standard("var s = \"/* not a comment */\"; [When(\"y\")]")]
    #[case::verbatim("var s = @\"\"\"/*\"; [When(\"y\")]")]
    #[case::interpolated("var s = $@\"{x}/*\"; [When(\"y\")]")]
    #[case::raw("var s = \"\"\"\n/*\n\"\"\"; [When(\"y\")]")]
    fn csharp_strings_hide_comment_openers(#[case] source: &str) {
        let map = CodeMap::new(source, CFamily::CSharp);
        assert!(!map.is_code(offset(source, "/*")));
        assert!(map.is_code(offset(source, "[When")));
    }

    #[test]
    fn js_regex_literals_hide_comment_openers() {
        let source = "Given(/a\\/*b/, fn);\nWhen('c', fn);";
        let map = CodeMap::new(source, CFamily::JavaScript);
        assert!(!map.in_comment(offset(source, "When")));
        assert!(map.is_code(offset(source, "When")));
    }

    #[test]
    fn block_end_ignores_braces_in_strings_and_comments() {
        let source = "class A { var s = \"}\"; /* } */ void M() {} } tail";
        let map = CodeMap::new(source, CFamily::CSharp);
        let open = offset(source, "{");
        assert_eq!(map.block_end(source, open), Some(offset(source, "} tail")));
    }
}
