//! Step-to-binding resolution.
//!
//! Resolution is a pure query over a snapshot of the active bindings. When
//! more than one binding accepts a step the result is [`ResolutionResult::Ambiguous`]
//! and lists every match in index order; no "most specific pattern" rule
//! picks a winner.

use std::sync::Arc;

use crate::binding::Binding;
use crate::gherkin_model::{GherkinModel, GherkinStep};
use crate::index::BindingIndex;

/// Outcome of resolving one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// No binding accepts the step text.
    Unmatched,
    /// Exactly one binding accepts the step text.
    Unique(Arc<Binding>),
    /// Several bindings accept the step text, in index order.
    Ambiguous(Vec<Arc<Binding>>),
}

impl ResolutionResult {
    fn from_matches(mut matches: Vec<Arc<Binding>>) -> Self {
        match matches.len() {
            0 => Self::Unmatched,
            1 => matches.pop().map_or(Self::Unmatched, Self::Unique),
            _ => Self::Ambiguous(matches),
        }
    }

    /// Every matching binding.
    #[must_use]
    pub fn bindings(&self) -> &[Arc<Binding>] {
        match self {
            Self::Unmatched => &[],
            Self::Unique(binding) => std::slice::from_ref(binding),
            Self::Ambiguous(bindings) => bindings,
        }
    }

    /// The single matching binding, if resolution was unique.
    #[must_use]
    pub fn unique(&self) -> Option<&Arc<Binding>> {
        match self {
            Self::Unique(binding) => Some(binding),
            _ => None,
        }
    }

    /// Lower-case label of the outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Unique(_) => "unique",
            Self::Ambiguous(_) => "ambiguous",
        }
    }
}

/// Resolve `step` against the active bindings in `index`.
#[must_use]
pub fn resolve(step: &GherkinStep, index: &BindingIndex) -> ResolutionResult {
    resolve_in(step, &index.active_bindings())
}

/// Resolve `step` against an ordered binding snapshot.
#[must_use]
pub fn resolve_in(step: &GherkinStep, bindings: &[Arc<Binding>]) -> ResolutionResult {
    let matches = bindings
        .iter()
        .filter(|binding| binding.keyword.accepts(step.keyword))
        .filter(|binding| binding.matches(&step.text))
        .cloned()
        .collect();
    ResolutionResult::from_matches(matches)
}

/// Resolution of one step of a feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResolution {
    /// Title of the scenario the step belongs to.
    pub scenario: String,
    /// The step, with outline placeholders substituted.
    pub step: GherkinStep,
    /// How the step resolved.
    pub result: ResolutionResult,
}

/// Resolve every step of `model`, expanding outlines.
#[must_use]
pub fn resolve_model(model: &GherkinModel, index: &BindingIndex) -> Vec<StepResolution> {
    let snapshot = index.active_bindings();
    let bindings = snapshot.as_slice();
    model
        .scenarios
        .iter()
        .flat_map(|scenario| {
            scenario
                .expanded_steps()
                .into_iter()
                .map(move |step| StepResolution {
                    scenario: scenario.title.clone(),
                    result: resolve_in(&step, bindings),
                    step,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::SourceLocation;
    use rstest::rstest;
    use std::path::{Path, PathBuf};
    use stepbind_patterns::{BindingKeyword, PatternSyntax, StepKeyword, compile_pattern};

    fn binding(
        keyword: BindingKeyword,
        line: usize,
        pattern: &str,
        syntax: PatternSyntax,
    ) -> Binding {
        let Ok(matcher) = compile_pattern(pattern, syntax, false) else {
            panic!("pattern {pattern} compiles");
        };
        Binding {
            keyword,
            pattern_raw: pattern.to_string(),
            matcher,
            declaring_symbol: format!("Steps.Method{line}"),
            location: SourceLocation {
                path: PathBuf::from("Steps.cs"),
                line,
                column: 4,
                end_line: line,
                end_column: 30,
            },
            provider: "p",
        }
    }

    fn index(bindings: Vec<Binding>) -> BindingIndex {
        let index = BindingIndex::new();
        index.set_provider_order(vec!["p"]);
        index.set_active(["p"]);
        let rev = index.begin_update();
        index.replace_file("p", Path::new("Steps.cs"), rev, bindings);
        index
    }

    #[test]
    fn matching_is_anchored() {
        let index = index(vec![binding(
            BindingKeyword::Given,
            1,
            "a user logs in",
            PatternSyntax::Regex,
        )]);
        let longer = GherkinStep::new(StepKeyword::Given, "a user logs in successfully");
        assert_eq!(resolve(&longer, &index), ResolutionResult::Unmatched);
        let exact = GherkinStep::new(StepKeyword::Given, "a user logs in");
        assert_eq!(resolve(&exact, &index).label(), "unique");
    }

    #[test]
    fn identical_patterns_are_ambiguous_in_index_order() {
        let index = index(vec![
            binding(BindingKeyword::Given, 8, "the cart is empty", PatternSyntax::Regex),
            binding(BindingKeyword::Given, 3, "the cart is empty", PatternSyntax::Regex),
        ]);
        let step = GherkinStep::new(StepKeyword::Given, "the cart is empty");
        let result = resolve(&step, &index);
        let lines: Vec<_> = result.bindings().iter().map(|b| b.location.line).collect();
        assert!(matches!(result, ResolutionResult::Ambiguous(_)));
        assert_eq!(lines, vec![3, 8]);
    }

    #[rstest]
    #[case(BindingKeyword::Given, StepKeyword::Given, true)]
    #[case(BindingKeyword::Given, StepKeyword::Then, false)]
    #[case(BindingKeyword::Any, StepKeyword::When, true)]
    fn keyword_compatibility(
        #[case] declared: BindingKeyword,
        #[case] step_keyword: StepKeyword,
        #[case] matched: bool,
    ) {
        let index = index(vec![binding(declared, 1, "a step", PatternSyntax::Regex)]);
        let step = GherkinStep::new(step_keyword, "a step");
        assert_eq!(resolve(&step, &index).unique().is_some(), matched);
    }

    #[test]
    fn cucumber_expression_resolves_quoted_argument() {
        let index = index(vec![binding(
            BindingKeyword::Given,
            1,
            "a user with name {string}",
            PatternSyntax::CucumberExpression,
        )]);
        let step = GherkinStep::new(StepKeyword::Given, "a user with name \"Alice\"");
        let Some(unique) = resolve(&step, &index).unique().cloned() else {
            panic!("expected a unique match");
        };
        assert_eq!(unique.declaring_symbol, "Steps.Method1");
    }

    #[test]
    fn resolution_does_not_touch_the_index() {
        let index = index(vec![binding(BindingKeyword::When, 1, "go", PatternSyntax::Regex)]);
        let step = GherkinStep::new(StepKeyword::When, "go");
        let first = resolve(&step, &index);
        let second = resolve(&step, &index);
        assert_eq!(first, second);
        assert_eq!(index.len(), 1);
    }
}
