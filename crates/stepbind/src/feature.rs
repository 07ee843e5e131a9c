//! Build a [`GherkinModel`] from `.feature` text.

use std::path::{Path, PathBuf};

use gherkin::GherkinEnv;
use stepbind_patterns::StepKeyword;

use crate::error::StepbindError;
use crate::gherkin_model::{ExamplesTable, GherkinModel, GherkinScenario, GherkinStep};

/// Read and parse a feature file from disk.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not valid Gherkin.
pub fn load_feature_file(path: &Path) -> Result<GherkinModel, StepbindError> {
    let text = std::fs::read_to_string(path)?;
    parse_feature(path, &text)
}

/// Parse feature `text` that was read from `path`.
///
/// Background steps, from the feature and from the enclosing rule, are
/// prepended to every scenario they apply to.
///
/// # Errors
///
/// Returns [`StepbindError::FeatureParse`] when `text` is not valid Gherkin.
pub fn parse_feature(path: &Path, text: &str) -> Result<GherkinModel, StepbindError> {
    let mut text = text.to_owned();
    normalise_trailing_newline(&mut text);
    let feature = gherkin::Feature::parse(&text, GherkinEnv::default()).map_err(|err| {
        StepbindError::FeatureParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;

    let background = feature
        .background
        .as_ref()
        .map(|b| b.steps.as_slice())
        .unwrap_or_default();

    let mut scenarios: Vec<_> = feature
        .scenarios
        .iter()
        .map(|scenario| build_scenario(scenario, &[background]))
        .collect();

    for rule in &feature.rules {
        let rule_background = rule
            .background
            .as_ref()
            .map(|b| b.steps.as_slice())
            .unwrap_or_default();
        scenarios.extend(
            rule.scenarios
                .iter()
                .map(|scenario| build_scenario(scenario, &[background, rule_background])),
        );
    }

    Ok(GherkinModel {
        path: PathBuf::from(path),
        name: feature.name.clone(),
        scenarios,
    })
}

fn normalise_trailing_newline(text: &mut String) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
}

fn build_scenario(
    scenario: &gherkin::Scenario,
    backgrounds: &[&[gherkin::Step]],
) -> GherkinScenario {
    let mut prev = None;
    let steps = backgrounds
        .iter()
        .flat_map(|steps| steps.iter())
        .chain(&scenario.steps)
        .filter_map(|step| build_step(step, &mut prev))
        .collect();

    let examples = scenario
        .examples
        .iter()
        .filter_map(|examples| examples.table.as_ref())
        .filter_map(|table| {
            let (header, rows) = table.rows.split_first()?;
            Some(ExamplesTable {
                header: header.clone(),
                rows: rows.to_vec(),
            })
        })
        .collect();

    GherkinScenario {
        title: scenario.name.clone(),
        line: scenario.position.line.saturating_sub(1),
        is_outline: !scenario.examples.is_empty(),
        tags: scenario.tags.clone(),
        examples,
        steps,
    }
}

fn build_step(step: &gherkin::Step, prev: &mut Option<StepKeyword>) -> Option<GherkinStep> {
    let keyword = match StepKeyword::try_from(step.ty) {
        Ok(keyword) => {
            *prev = Some(keyword);
            keyword
        }
        Err(_) => StepKeyword::resolve_declared(&step.keyword, prev)?,
    };
    let declared = step.keyword.trim();
    Some(GherkinStep {
        declared_keyword: declared.to_owned(),
        keyword,
        text: step.value.clone(),
        full_text: format!("{declared} {}", step.value),
        line: step.position.line.saturating_sub(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE: &str = "\
@checkout
Feature: Checkout

  Background:
    Given a signed-in customer

  Scenario: Paying by card
    Given a basket with 2 items
    And a saved card
    When the customer pays
    Then the order is confirmed

  Scenario Outline: Applying discounts
    Given a basket worth <total> pounds
    When the code <code> is applied
    Then the total is <discounted> pounds

    Examples:
      | total | code  | discounted |
      | 100   | TEN   | 90         |
      | 50    | HALF  | 25         |

  Rule: Gift cards
    Background:
      Given a gift card balance

    Scenario: Paying with a gift card
      When the customer pays by gift card
      But the balance is too low
      Then the payment is declined";

    fn model() -> GherkinModel {
        match parse_feature(Path::new("checkout.feature"), FEATURE) {
            Ok(model) => model,
            Err(err) => panic!("feature parses: {err}"),
        }
    }

    fn scenario(model: &GherkinModel, index: usize) -> &GherkinScenario {
        let Some(scenario) = model.scenarios.get(index) else {
            panic!("scenario {index} present");
        };
        scenario
    }

    #[test]
    fn background_steps_are_prepended() {
        let model = model();
        let paying = scenario(&model, 0);
        let texts: Vec<_> = paying.steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "a signed-in customer",
                "a basket with 2 items",
                "a saved card",
                "the customer pays",
                "the order is confirmed",
            ]
        );
        assert_eq!(paying.line, 6);
        assert!(!paying.is_outline);
    }

    #[test]
    fn conjunctions_take_the_preceding_keyword() {
        let model = model();
        let gift = scenario(&model, 2);
        let keywords: Vec<_> = gift.steps.iter().map(|s| s.keyword).collect();
        assert_eq!(
            keywords,
            vec![
                StepKeyword::Given,
                StepKeyword::Given,
                StepKeyword::When,
                StepKeyword::When,
                StepKeyword::Then,
            ]
        );
        let Some(but) = gift.steps.get(3) else {
            panic!("but step present");
        };
        assert_eq!(but.declared_keyword, "But");
        assert_eq!(but.full_text, "But the balance is too low");
    }

    #[test]
    fn outlines_carry_their_examples() {
        let model = model();
        let outline = scenario(&model, 1);
        assert!(outline.is_outline);
        let Some(table) = outline.examples.first() else {
            panic!("examples table present");
        };
        assert_eq!(table.header, vec!["total", "code", "discounted"]);
        assert_eq!(table.rows.len(), 2);
        let expanded = outline.expanded_steps();
        let Some(last) = expanded.last() else {
            panic!("expanded steps present");
        };
        assert_eq!(last.text, "the total is 25 pounds");
    }

    #[test]
    fn invalid_gherkin_is_reported_with_its_path() {
        let result = parse_feature(Path::new("broken.feature"), "this is not gherkin");
        let Err(err) = result else {
            panic!("expected a parse error");
        };
        assert!(err.to_string().starts_with("failed to parse feature file broken.feature"));
    }
}
