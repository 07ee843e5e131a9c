//! Provider selection produced by a detection run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::detection::DetectionResult;

/// Role a provider plays in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Highest-ranked provider with non-zero confidence.
    Primary,
    /// Confidence reached the active threshold.
    Active,
    /// Confidence below the active threshold.
    Inactive,
}

impl ProviderStatus {
    /// Lower-case label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// One provider's entry in a detection report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderReport {
    /// Provider identifier.
    pub id: &'static str,
    /// Human-readable provider name.
    pub display_name: &'static str,
    /// The provider's detection result.
    pub detection: DetectionResult,
    /// Role in the selection.
    pub status: ProviderStatus,
}

/// Immutable outcome of one detection run.
///
/// Shared behind an `Arc` and reused until the provider manager's cache is
/// invalidated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSelection {
    report: Vec<ProviderReport>,
    active: Vec<&'static str>,
    primary: Option<&'static str>,
    active_threshold: f64,
    detected_at: DateTime<Utc>,
}

impl ProviderSelection {
    /// Rank `results` (in registration order) and partition them.
    ///
    /// The report is sorted by confidence, highest first; ties keep
    /// registration order. Providers at or above `active_threshold` are
    /// active, and the top-ranked provider with non-zero confidence is
    /// primary.
    #[must_use]
    pub fn from_results(
        results: Vec<(&'static str, &'static str, DetectionResult)>,
        active_threshold: f64,
    ) -> Self {
        let mut ranked = results;
        ranked.sort_by(|(_, _, a), (_, _, b)| b.confidence().total_cmp(&a.confidence()));

        let primary = ranked
            .first()
            .filter(|(_, _, result)| result.confidence() > 0.0)
            .map(|(id, _, _)| *id);

        let report: Vec<_> = ranked
            .into_iter()
            .map(|(id, display_name, detection)| {
                let status = if Some(id) == primary {
                    ProviderStatus::Primary
                } else if detection.confidence() >= active_threshold {
                    ProviderStatus::Active
                } else {
                    ProviderStatus::Inactive
                };
                ProviderReport {
                    id,
                    display_name,
                    detection,
                    status,
                }
            })
            .collect();

        let active = report
            .iter()
            .filter(|entry| entry.detection.confidence() >= active_threshold)
            .map(|entry| entry.id)
            .collect();

        Self {
            report,
            active,
            primary,
            active_threshold,
            detected_at: Utc::now(),
        }
    }

    /// Every provider's entry, highest confidence first.
    #[must_use]
    pub fn report(&self) -> &[ProviderReport] {
        &self.report
    }

    /// Identifiers of the active providers, highest confidence first.
    #[must_use]
    pub fn active(&self) -> &[&'static str] {
        &self.active
    }

    /// Whether the provider with `id` is active.
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(&id)
    }

    /// The primary provider, if any provider reported non-zero confidence.
    #[must_use]
    pub fn primary(&self) -> Option<&'static str> {
        self.primary
    }

    /// Threshold the selection was partitioned with.
    #[must_use]
    pub fn active_threshold(&self) -> f64 {
        self.active_threshold
    }

    /// When detection ran.
    #[must_use]
    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Render the human-readable detection report.
    #[must_use]
    pub fn format_report(&self) -> String {
        self.to_string()
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "confidence is rendered as a percentage"
)]
fn percent(value: f64) -> f64 {
    (value * 100.0).round()
}

impl fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Provider detection (active threshold {}%, detected {})",
            percent(self.active_threshold),
            self.detected_at.to_rfc3339()
        )?;
        for entry in &self.report {
            writeln!(
                f,
                "  {} [{}] {}%",
                entry.display_name,
                entry.status.as_str(),
                percent(entry.detection.confidence())
            )?;
            for reason in &entry.detection.reasons {
                writeln!(f, "    - {reason}")?;
            }
            if !entry.detection.signals.is_empty() {
                writeln!(f, "    signals: {}", entry.detection.signals.join(", "))?;
            }
        }
        Ok(())
    }
}
