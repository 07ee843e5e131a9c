//! Behavioural tests for literal unescaping and matcher compilation.
#![expect(clippy::expect_used, reason = "test asserts conversion path")]

use proptest::prelude::*;
use rstest::rstest;
use stepbind_patterns::{
    LiteralDialect, PatternError, PatternSyntax, compile, compile_pattern, escape_literal,
    try_compile, unescape_literal,
};

#[test]
fn fixed_string_pattern_accepts_its_own_text() {
    let matcher = compile(
        r#""the basket is empty""#,
        LiteralDialect::Standard,
        PatternSyntax::Regex,
        false,
    )
    .expect("fixed string compiles");
    assert!(matcher.is_match("the basket is empty"));
    assert_eq!(matcher.arity(), 0);
}

#[test]
fn matching_never_accepts_a_substring() {
    let matcher = compile(
        r#""a user logs in""#,
        LiteralDialect::Standard,
        PatternSyntax::Auto,
        false,
    )
    .expect("fixed string compiles");
    assert!(!matcher.is_match("a user logs in successfully"));
    assert!(!matcher.is_match("given a user logs in"));
}

#[rstest]
#[case(r#""broken (group""#, LiteralDialect::Standard)]
#[case(r#""dangling \""#, LiteralDialect::Standard)]
#[case(r#"@"lone " quote""#, LiteralDialect::Verbatim)]
#[case("not a literal", LiteralDialect::Standard)]
fn unusable_literals_compile_to_none(#[case] raw: &str, #[case] dialect: LiteralDialect) {
    assert!(compile(raw, dialect, PatternSyntax::Regex, false).is_none());
}

#[test]
fn literal_errors_are_reported_through_try_compile() {
    let Err(err) = try_compile("'open", LiteralDialect::Standard, PatternSyntax::Regex, false)
    else {
        panic!("expected literal error");
    };
    assert!(matches!(err, PatternError::Literal(_)));
}

#[test]
fn undefined_parameter_types_are_placeholder_errors() {
    let Err(err) = compile_pattern("a {colour} car", PatternSyntax::CucumberExpression, false)
    else {
        panic!("expected placeholder error");
    };
    let PatternError::Placeholder(info) = err else {
        panic!("expected placeholder error, got {err}");
    };
    assert_eq!(info.placeholder.as_deref(), Some("colour"));
}

#[rstest]
#[case("I have {int} cucumber(s)", "I have 1 cucumber", true)]
#[case("I have {int} cucumber(s)", "I have 12 cucumbers", true)]
#[case("I have {int} cucumber(s)", "I have some cucumbers", false)]
#[case("it weighs {float} kg", "it weighs 2.5 kg", true)]
#[case("the {word} is ready", "the order is ready", true)]
#[case("the {word} is ready", "the big order is ready", false)]
#[case("a user named {string}", "a user named 'Bob'", true)]
#[case("I feel it in my belly/stomach", "I feel it in my stomach", true)]
fn cucumber_expressions_match_expected_text(
    #[case] pattern: &str,
    #[case] text: &str,
    #[case] expected: bool,
) {
    let matcher = compile_pattern(pattern, PatternSyntax::CucumberExpression, false)
        .expect("expression compiles");
    assert_eq!(matcher.is_match(text), expected, "{pattern} vs {text}");
}

#[test]
fn python_raw_literals_feed_regexes_untouched() {
    let matcher = compile(
        r#"r"I wait (\d+) seconds""#,
        LiteralDialect::Raw,
        PatternSyntax::Regex,
        false,
    )
    .expect("raw literal compiles");
    assert_eq!(matcher.captures("I wait 5 seconds"), Some(vec!["5".to_string()]));
}

proptest! {
    #[test]
    fn standard_literals_round_trip_through_escaping(text in "[ -~\t\n\r]{0,40}") {
        let literal = escape_literal(&text, LiteralDialect::Standard);
        let unescaped = unescape_literal(&literal, LiteralDialect::Standard)
            .expect("escaped literal is valid");
        prop_assert_eq!(&unescaped, &text);
        let reescaped = escape_literal(&unescaped, LiteralDialect::Standard);
        prop_assert_eq!(
            unescape_literal(&reescaped, LiteralDialect::Standard).expect("valid literal"),
            text
        );
    }

    #[test]
    fn verbatim_literals_only_collapse_doubled_quotes(text in "[a-zA-Z0-9 \\\\\"]{0,40}") {
        let literal = format!("@\"{}\"", text.replace('"', "\"\""));
        let unescaped = unescape_literal(&literal, LiteralDialect::Verbatim)
            .expect("verbatim literal is valid");
        prop_assert_eq!(unescaped, text);
    }

    #[test]
    fn escaped_fixed_text_matches_itself(text in "[a-zA-Z0-9 ]{1,30}") {
        let literal = escape_literal(&text, LiteralDialect::Standard);
        let matcher = compile(&literal, LiteralDialect::Standard, PatternSyntax::Regex, false)
            .expect("fixed text compiles");
        prop_assert!(matcher.is_match(&text));
    }
}
