//! Framework detection results.
//!
//! A provider's confidence is the weighted sum of independent signal
//! categories. Each category contributes its weight at most once per scan
//! however many files exhibit it, and the total is clamped to `[0, 1]`.

use serde::Serialize;

/// Maximum number of files a provider reads for one signal category.
pub const SAMPLE_CAP: usize = 25;

/// Outcome of one provider's workspace scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    confidence: f64,
    /// Human-readable explanations of the confidence.
    pub reasons: Vec<String>,
    /// Machine-friendly signal identifiers such as `manifest:App.csproj`.
    pub signals: Vec<String>,
    /// Languages the framework's step definitions are written in.
    pub primary_languages: Vec<String>,
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

impl DetectionResult {
    /// Build a result, clamping `confidence` into `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepbind::detection::DetectionResult;
    ///
    /// let result = DetectionResult::new(1.7, Vec::new(), Vec::new(), Vec::new());
    /// assert!(result.confidence().total_cmp(&1.0).is_eq());
    /// ```
    #[must_use]
    pub fn new(
        confidence: f64,
        reasons: Vec<String>,
        signals: Vec<String>,
        primary_languages: Vec<String>,
    ) -> Self {
        Self {
            confidence: clamp_confidence(confidence),
            reasons,
            signals,
            primary_languages,
        }
    }

    /// A zero-confidence result explained by `reason`.
    #[must_use]
    pub fn none(reason: impl Into<String>) -> Self {
        Self::new(0.0, vec![reason.into()], Vec::new(), Vec::new())
    }

    /// A zero-confidence result recording why detection failed.
    #[must_use]
    pub fn failed(error: &dyn std::fmt::Display) -> Self {
        Self::none(format!("detection failed: {error}"))
    }

    /// Confidence in `[0, 1]`.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// A weighted category of detection evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalCategory {
    /// Stable category name.
    pub name: &'static str,
    /// Weight added to the confidence when the category is observed.
    pub weight: f64,
}

/// Accumulates evidence during a scan, counting each category once.
#[derive(Debug, Default)]
pub struct DetectionBuilder {
    seen: Vec<&'static str>,
    confidence: f64,
    reasons: Vec<String>,
    signals: Vec<String>,
    languages: Vec<String>,
}

impl DetectionBuilder {
    /// Start a scan for a framework whose steps are written in `languages`.
    #[must_use]
    pub fn new(languages: &[&str]) -> Self {
        Self {
            languages: languages.iter().map(|l| (*l).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Record evidence for `category`.
    ///
    /// Returns `false` and ignores the evidence when the category has
    /// already been observed during this scan.
    #[expect(
        clippy::float_arithmetic,
        reason = "confidence is a weighted sum of signal weights"
    )]
    pub fn record(
        &mut self,
        category: SignalCategory,
        reason: impl Into<String>,
        signal: impl Into<String>,
    ) -> bool {
        if self.has(category) {
            return false;
        }
        self.seen.push(category.name);
        self.confidence += category.weight;
        self.reasons.push(reason.into());
        self.signals.push(signal.into());
        true
    }

    /// Whether `category` has been observed.
    #[must_use]
    pub fn has(&self, category: SignalCategory) -> bool {
        self.seen.contains(&category.name)
    }

    /// Finish the scan. Without any evidence the result carries zero
    /// confidence and `no_signal_reason`.
    #[must_use]
    pub fn finish(self, no_signal_reason: &str) -> DetectionResult {
        if self.seen.is_empty() {
            return DetectionResult::none(no_signal_reason);
        }
        DetectionResult::new(
            self.confidence,
            self.reasons,
            self.signals,
            self.languages,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MANIFEST: SignalCategory = SignalCategory {
        name: "manifest",
        weight: 0.5,
    };
    const IMPORT: SignalCategory = SignalCategory {
        name: "import",
        weight: 0.3,
    };

    #[rstest]
    #[case(1.7, 1.0)]
    #[case(-0.2, 0.0)]
    #[case(0.45, 0.45)]
    #[case(f64::NAN, 0.0)]
    #[case(f64::INFINITY, 1.0)]
    fn confidence_is_clamped(#[case] raw: f64, #[case] expected: f64) {
        let result = DetectionResult::new(raw, Vec::new(), Vec::new(), Vec::new());
        assert!(result.confidence().total_cmp(&expected).is_eq());
    }

    #[test]
    fn categories_count_once() {
        let mut builder = DetectionBuilder::new(&["C#"]);
        assert!(builder.record(MANIFEST, "a.csproj references Reqnroll", "manifest:a.csproj"));
        assert!(!builder.record(MANIFEST, "b.csproj references Reqnroll", "manifest:b.csproj"));
        assert!(builder.record(IMPORT, "using Reqnroll", "using:Steps.cs"));
        let result = builder.finish("no signals");
        assert!(result.confidence().total_cmp(&0.8).is_eq());
        assert_eq!(result.signals, vec!["manifest:a.csproj", "using:Steps.cs"]);
        assert_eq!(result.primary_languages, vec!["C#"]);
    }

    #[test]
    fn empty_scan_has_zero_confidence_and_a_reason() {
        let result = DetectionBuilder::new(&["Python"]).finish("no behave signals found");
        assert!(result.confidence().total_cmp(&0.0).is_eq());
        assert_eq!(result.reasons, vec!["no behave signals found"]);
        assert!(result.primary_languages.is_empty());
    }

    #[test]
    fn failures_carry_the_error() {
        let result = DetectionResult::failed(&"disk on fire");
        assert_eq!(result.reasons, vec!["detection failed: disk on fire"]);
    }
}
