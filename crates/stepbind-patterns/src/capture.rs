//! Regex capture helpers.

use regex::Regex;

/// Extract the capture groups when `text` matches `re`, returning `None`
/// otherwise.
///
/// Capture group 0 (the full match) is ignored, and groups that do not
/// participate yield empty strings to keep positional alignment.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use stepbind_patterns::extract_captured_values;
/// let regex = Regex::new(r"^(\d+)-(\w+)$")
///     .expect("example ensures fallible call succeeds");
/// let values = extract_captured_values(&regex, "42-answer")
///     .expect("example ensures fallible call succeeds");
/// assert_eq!(values, vec!["42".to_string(), "answer".to_string()]);
/// ```
#[must_use]
pub fn extract_captured_values(re: &Regex, text: &str) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    let mut values = Vec::with_capacity(caps.len().saturating_sub(1));
    for capture in caps.iter().skip(1) {
        let value = capture.map_or_else(String::new, |m| m.as_str().to_string());
        values.push(value);
    }

    Some(values)
}

/// Extract one value per parameter, where each parameter spans
/// `slots[i]` consecutive groups and the first participating group wins.
pub(crate) fn extract_slotted_values(
    re: &Regex,
    slots: &[usize],
    text: &str,
) -> Option<Vec<String>> {
    let caps = re.captures(text)?;
    let mut groups = caps.iter().skip(1);
    let mut values = Vec::with_capacity(slots.len());
    for &width in slots {
        let slot: Vec<_> = groups.by_ref().take(width).collect();
        let value = slot
            .into_iter()
            .flatten()
            .next()
            .map_or_else(String::new, |m| m.as_str().to_string());
        values.push(value);
    }
    Some(values)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require descriptive panic messages"
)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_when_pattern_does_not_match() {
        let regex = Regex::new(r"^(\d+)$").expect("test regex must compile");
        assert!(extract_captured_values(&regex, "nope").is_none());
    }

    #[test]
    fn supports_empty_optional_groups() {
        let regex = Regex::new(r"^(a)?(b)?$").expect("test regex must compile");
        let captures = extract_captured_values(&regex, "a").expect("captures for `a`");
        assert_eq!(captures, vec![String::from("a"), String::new()]);
    }

    #[test]
    fn collapses_alternative_groups_per_slot() {
        let regex =
            Regex::new(r#"^(\d+) (?:"([^"]*)"|'([^']*)') (\w+)$"#).expect("test regex must compile");
        let captures = extract_slotted_values(&regex, &[1, 2, 1], "7 'single' end")
            .expect("captures for slotted input");
        assert_eq!(captures, vec!["7", "single", "end"]);
    }
}
