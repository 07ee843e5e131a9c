//! Step keyword types shared by providers and the resolver.
//!
//! Feature steps carry an *effective* [`StepKeyword`]: conjunctions such as
//! `And` and `But` are resolved against the preceding primary keyword before
//! matching. Step definitions carry a [`BindingKeyword`], which adds the
//! keyword-agnostic [`BindingKeyword::Any`] form used by Reqnroll's
//! `[StepDefinition]`, Behave's `@step`, and Cucumber's `defineStep`.

use gherkin::StepType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Effective keyword of a feature step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform an action when testing behaviour.
    When,
    /// Assert the expected outcome of a scenario.
    Then,
}

impl StepKeyword {
    /// Return the keyword as a string slice.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepbind_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }

    /// Resolve a declared keyword as written in a feature file.
    ///
    /// Primary keywords update `prev` and are returned unchanged. The
    /// conjunctions `And`, `But` and `*` inherit the keyword stored in
    /// `prev`, defaulting to `Given` at the start of a scenario. Returns
    /// `None` for text that is not a step keyword at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepbind_patterns::StepKeyword;
    ///
    /// let mut prev = None;
    /// assert_eq!(StepKeyword::resolve_declared("When ", &mut prev), Some(StepKeyword::When));
    /// assert_eq!(StepKeyword::resolve_declared("And", &mut prev), Some(StepKeyword::When));
    /// assert_eq!(StepKeyword::resolve_declared("Scenario", &mut prev), None);
    /// ```
    pub fn resolve_declared(declared: &str, prev: &mut Option<Self>) -> Option<Self> {
        let trimmed = declared.trim();
        if trimmed.eq_ignore_ascii_case("and")
            || trimmed.eq_ignore_ascii_case("but")
            || trimmed == "*"
        {
            return Some(prev.unwrap_or(Self::Given));
        }
        let keyword = trimmed.parse::<Self>().ok()?;
        *prev = Some(keyword);
        Some(keyword)
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`StepKeyword`] or [`BindingKeyword`] fails.
///
/// Captures the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepKeywordParseError(pub String);

impl fmt::Display for StepKeywordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid step keyword: {}", self.0)
    }
}

impl std::error::Error for StepKeywordParseError {}

impl FromStr for StepKeyword {
    type Err = StepKeywordParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("given") {
            Ok(Self::Given)
        } else if trimmed.eq_ignore_ascii_case("when") {
            Ok(Self::When)
        } else if trimmed.eq_ignore_ascii_case("then") {
            Ok(Self::Then)
        } else {
            Err(StepKeywordParseError(trimmed.to_string()))
        }
    }
}

/// Error raised when converting a parsed Gherkin [`StepType`] into a
/// [`StepKeyword`] fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedStepType(pub StepType);

impl fmt::Display for UnsupportedStepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported step type: {:?}", self.0)
    }
}

impl std::error::Error for UnsupportedStepType {}

impl TryFrom<StepType> for StepKeyword {
    type Error = UnsupportedStepType;

    fn try_from(ty: StepType) -> Result<Self, Self::Error> {
        match ty {
            StepType::Given => Ok(Self::Given),
            StepType::When => Ok(Self::When),
            StepType::Then => Ok(Self::Then),
            #[expect(unreachable_patterns, reason = "guard future StepType variants")]
            other => Err(UnsupportedStepType(other)),
        }
    }
}

/// Keyword declared by a step definition in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingKeyword {
    /// Only matches `Given` steps.
    Given,
    /// Only matches `When` steps.
    When,
    /// Only matches `Then` steps.
    Then,
    /// Keyword-agnostic declaration matching every step keyword.
    Any,
}

impl BindingKeyword {
    /// Return the keyword as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::Any => "Any",
        }
    }

    /// Whether a binding declared with this keyword may serve `step`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepbind_patterns::{BindingKeyword, StepKeyword};
    ///
    /// assert!(BindingKeyword::Given.accepts(StepKeyword::Given));
    /// assert!(!BindingKeyword::Given.accepts(StepKeyword::Then));
    /// assert!(BindingKeyword::Any.accepts(StepKeyword::Then));
    /// ```
    #[must_use]
    pub const fn accepts(self, step: StepKeyword) -> bool {
        matches!(
            (self, step),
            (Self::Any, _)
                | (Self::Given, StepKeyword::Given)
                | (Self::When, StepKeyword::When)
                | (Self::Then, StepKeyword::Then)
        )
    }
}

impl From<StepKeyword> for BindingKeyword {
    fn from(keyword: StepKeyword) -> Self {
        match keyword {
            StepKeyword::Given => Self::Given,
            StepKeyword::When => Self::When,
            StepKeyword::Then => Self::Then,
        }
    }
}

impl fmt::Display for BindingKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
