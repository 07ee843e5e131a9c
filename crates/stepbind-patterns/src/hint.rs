//! Placeholder type-hint and parameter-type translation.

/// Translate a `parse`-style placeholder format spec into a regex fragment.
///
/// Unknown or missing specs fall back to a lazy match, mirroring the `parse`
/// library used by Behave.
///
/// # Examples
/// ```
/// use stepbind_patterns::get_type_pattern;
/// assert_eq!(get_type_pattern(Some("d")), r"[+-]?\d+");
/// assert_eq!(get_type_pattern(Some("w")), r"\w+");
/// assert_eq!(get_type_pattern(None), ".+?");
/// ```
#[must_use]
pub fn get_type_pattern(type_hint: Option<&str>) -> &'static str {
    match type_hint {
        Some("d" | "n") => r"[+-]?\d+",
        Some("f" | "F" | "e" | "g") => r"[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?",
        Some("w") => r"\w+",
        Some("W") => r"\W+",
        Some("s") => r"\s+",
        Some("S") => r"\S+",
        Some("l") => r"[a-z]+",
        _ => r".+?",
    }
}

/// Regex translation of one Cucumber expression parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterPattern {
    /// Regex fragment including its capture groups.
    pub source: &'static str,
    /// Number of capture groups the fragment contributes.
    pub groups: usize,
}

const INTEGER: ParameterPattern = ParameterPattern {
    source: r"([-+]?\d+)",
    groups: 1,
};

const DECIMAL: ParameterPattern = ParameterPattern {
    source: r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)",
    groups: 1,
};

/// Look up a built-in Cucumber expression parameter type.
///
/// Returns `None` for parameter types that are not built in; custom types are
/// registered in host code the indexer cannot see, so patterns using them do
/// not compile.
///
/// # Examples
/// ```
/// use stepbind_patterns::cucumber_parameter;
/// assert_eq!(cucumber_parameter("word").map(|p| p.groups), Some(1));
/// assert_eq!(cucumber_parameter("string").map(|p| p.groups), Some(2));
/// assert!(cucumber_parameter("colour").is_none());
/// ```
#[must_use]
pub fn cucumber_parameter(name: &str) -> Option<ParameterPattern> {
    let pattern = match name {
        "int" | "byte" | "short" | "long" | "biginteger" => INTEGER,
        "float" | "double" | "bigdecimal" => DECIMAL,
        "word" => ParameterPattern {
            source: r"([^\s]+)",
            groups: 1,
        },
        "string" => ParameterPattern {
            source: r#"(?:"([^"\\]*(?:\\.[^"\\]*)*)"|'([^'\\]*(?:\\.[^'\\]*)*)')"#,
            groups: 2,
        },
        "" => ParameterPattern {
            source: r"(.*)",
            groups: 1,
        },
        _ => return None,
    };
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_integer_pattern_for_d_spec() {
        assert_eq!(get_type_pattern(Some("d")), r"[+-]?\d+");
    }

    #[test]
    fn returns_float_pattern() {
        assert_eq!(
            get_type_pattern(Some("f")),
            r"[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?"
        );
    }

    #[test]
    fn defaults_to_lazy_match_for_unknown_specs() {
        assert_eq!(get_type_pattern(Some("ti")), r".+?");
    }

    #[test]
    fn integer_aliases_share_a_pattern() {
        assert_eq!(cucumber_parameter("long"), cucumber_parameter("int"));
    }

    #[test]
    fn anonymous_parameter_matches_anything() {
        assert_eq!(cucumber_parameter("").map(|p| p.source), Some(r"(.*)"));
    }
}
