//! Read-only model of a parsed feature file.
//!
//! The model is what the resolver consumes: scenarios with their ordered
//! steps, each step already carrying its effective keyword. It is produced by
//! [`crate::feature::parse_feature`] or by any other Gherkin front end.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;
use stepbind_patterns::StepKeyword;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>\s][^>]*)>").unwrap_or_else(|_| unreachable!()));

/// A parsed feature file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GherkinModel {
    /// Path of the feature file.
    pub path: PathBuf,
    /// Feature title.
    pub name: String,
    /// Scenarios in document order, rules flattened.
    pub scenarios: Vec<GherkinScenario>,
}

/// A scenario or scenario outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GherkinScenario {
    /// Scenario title.
    pub title: String,
    /// Zero-based line of the scenario keyword.
    pub line: usize,
    /// Whether the scenario is an outline expanded from examples.
    pub is_outline: bool,
    /// Tags applied to the scenario.
    pub tags: Vec<String>,
    /// Examples tables of an outline.
    pub examples: Vec<ExamplesTable>,
    /// Steps, background steps first.
    pub steps: Vec<GherkinStep>,
}

/// One `Examples:` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamplesTable {
    /// Column names.
    pub header: Vec<String>,
    /// Data rows, one value per column.
    pub rows: Vec<Vec<String>>,
}

impl ExamplesTable {
    fn value(&self, row: &[String], column: &str) -> Option<String> {
        let position = self.header.iter().position(|name| name == column)?;
        row.get(position).cloned()
    }
}

/// A single feature step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GherkinStep {
    /// Keyword as written, such as `And` or `But`.
    pub declared_keyword: String,
    /// Effective keyword after resolving conjunctions.
    pub keyword: StepKeyword,
    /// Step text without the keyword.
    pub text: String,
    /// Keyword and text as written.
    pub full_text: String,
    /// Zero-based line of the step.
    pub line: usize,
}

impl GherkinStep {
    /// Build a step whose declared keyword is its effective keyword.
    #[must_use]
    pub fn new(keyword: StepKeyword, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            declared_keyword: keyword.as_str().to_owned(),
            keyword,
            full_text: format!("{} {text}", keyword.as_str()),
            text,
            line: 0,
        }
    }

    /// Place the step on `line`.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    fn substitute(&self, table: &ExamplesTable, row: &[String]) -> Self {
        let replace = |text: &str| {
            PLACEHOLDER_RE
                .replace_all(text, |caps: &Captures<'_>| {
                    caps.get(1)
                        .and_then(|name| table.value(row, name.as_str()))
                        .or_else(|| caps.get(0).map(|m| m.as_str().to_owned()))
                        .unwrap_or_default()
                })
                .into_owned()
        };
        Self {
            declared_keyword: self.declared_keyword.clone(),
            keyword: self.keyword,
            text: replace(&self.text),
            full_text: replace(&self.full_text),
            line: self.line,
        }
    }
}

impl GherkinScenario {
    /// Steps with outline placeholders substituted.
    ///
    /// A plain scenario yields its steps unchanged. An outline yields one
    /// copy of its steps per examples row, with every `<column>` reference
    /// replaced by that row's value; references to unknown columns are kept
    /// verbatim.
    #[must_use]
    pub fn expanded_steps(&self) -> Vec<GherkinStep> {
        if !self.is_outline || self.examples.iter().all(|t| t.rows.is_empty()) {
            return self.steps.clone();
        }
        self.examples
            .iter()
            .flat_map(|table| table.rows.iter().map(move |row| (table, row)))
            .flat_map(move |(table, row)| {
                self.steps
                    .iter()
                    .map(move |step| step.substitute(table, row))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> GherkinScenario {
        GherkinScenario {
            title: "eating".to_string(),
            line: 2,
            is_outline: true,
            tags: vec!["@smoke".to_string()],
            examples: vec![ExamplesTable {
                header: vec!["start".to_string(), "eat".to_string()],
                rows: vec![
                    vec!["12".to_string(), "5".to_string()],
                    vec!["20".to_string(), "5".to_string()],
                ],
            }],
            steps: vec![
                GherkinStep::new(StepKeyword::Given, "there are <start> cucumbers").at_line(3),
                GherkinStep::new(StepKeyword::When, "I eat <eat> of <colour> ones").at_line(4),
            ],
        }
    }

    #[test]
    fn outline_steps_expand_per_row() {
        let texts: Vec<_> = outline()
            .expanded_steps()
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(
            texts,
            vec![
                "there are 12 cucumbers",
                "I eat 5 of <colour> ones",
                "there are 20 cucumbers",
                "I eat 5 of <colour> ones",
            ]
        );
    }

    #[test]
    fn expansion_rewrites_full_text_and_keeps_lines() {
        let steps = outline().expanded_steps();
        let Some(first) = steps.first() else {
            panic!("expanded steps present");
        };
        assert_eq!(first.full_text, "Given there are 12 cucumbers");
        assert_eq!(first.line, 3);
    }

    #[test]
    fn plain_scenarios_are_returned_unchanged() {
        let mut scenario = outline();
        scenario.is_outline = false;
        assert_eq!(scenario.expanded_steps(), scenario.steps);
    }
}
