//! Configuration parsed from environment variables.
//!
//! Every setting can be overridden via environment variables prefixed with
//! `STEPBIND_`, and command-line flags take precedence over both.

use std::env;
use std::str::FromStr;

use crate::error::StepbindError;

/// Log level enumeration matching tracing crate levels.
///
/// Defaults to `Info` when not specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Most verbose logging, includes all trace spans.
    Trace,
    /// Debug-level information for development.
    Debug,
    /// Standard informational messages.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for failures.
    Error,
}

impl FromStr for LogLevel {
    type Err = StepbindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(StepbindError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Default minimum confidence for a provider to become active.
pub const DEFAULT_ACTIVE_THRESHOLD: f64 = 0.3;

/// Configuration for detection, indexing and resolution.
///
/// # Environment Variables
///
/// - `STEPBIND_ACTIVE_THRESHOLD`: minimum confidence in `[0, 1]` for a
///   provider to be active
/// - `STEPBIND_CASE_INSENSITIVE`: compile matchers case-insensitively
/// - `STEPBIND_DEBUG`: log skipped files and dropped literals
/// - `STEPBIND_LOG_LEVEL`: sets the log level (trace, debug, info, warn,
///   error)
#[derive(Debug, Clone, PartialEq)]
pub struct StepbindConfig {
    /// Minimum detection confidence for a provider to be active.
    pub active_threshold: f64,
    /// Whether step matchers ignore case.
    pub case_insensitive: bool,
    /// Whether per-file failures are logged.
    pub debug: bool,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: LogLevel,
}

impl Default for StepbindConfig {
    fn default() -> Self {
        Self {
            active_threshold: DEFAULT_ACTIVE_THRESHOLD,
            case_insensitive: false,
            debug: false,
            log_level: LogLevel::default(),
        }
    }
}

impl StepbindConfig {
    /// Load configuration from environment variables.
    ///
    /// Falls back to defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns `StepbindError::InvalidConfig` if an environment variable
    /// contains an invalid value.
    pub fn from_env() -> Result<Self, StepbindError> {
        let defaults = Self::default();

        let log_level = match env::var("STEPBIND_LOG_LEVEL") {
            Ok(val) => val.parse()?,
            Err(_) => defaults.log_level,
        };

        let active_threshold = match env::var("STEPBIND_ACTIVE_THRESHOLD") {
            Ok(val) => parse_threshold(&val)?,
            Err(_) => defaults.active_threshold,
        };

        let case_insensitive = match env::var("STEPBIND_CASE_INSENSITIVE") {
            Ok(val) => parse_flag("STEPBIND_CASE_INSENSITIVE", &val)?,
            Err(_) => defaults.case_insensitive,
        };

        let debug = match env::var("STEPBIND_DEBUG") {
            Ok(val) => parse_flag("STEPBIND_DEBUG", &val)?,
            Err(_) => defaults.debug,
        };

        Ok(Self {
            active_threshold,
            case_insensitive,
            debug,
            log_level,
        })
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for CLI overrides that should take precedence over
    /// environment-based defaults.
    ///
    /// # Errors
    ///
    /// Returns `StepbindError::InvalidConfig` when the threshold override lies
    /// outside `[0, 1]`.
    pub fn apply_overrides(
        mut self,
        log_level: Option<LogLevel>,
        active_threshold: Option<f64>,
        case_insensitive: bool,
        debug: bool,
    ) -> Result<Self, StepbindError> {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(threshold) = active_threshold {
            self.active_threshold = validate_threshold(threshold)?;
        }
        self.case_insensitive |= case_insensitive;
        self.debug |= debug;
        Ok(self)
    }

    /// Create a new configuration with the specified active threshold.
    ///
    /// # Errors
    ///
    /// Returns `StepbindError::InvalidConfig` when `threshold` lies outside
    /// `[0, 1]`.
    pub fn with_active_threshold(mut self, threshold: f64) -> Result<Self, StepbindError> {
        self.active_threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    /// Create a new configuration with case-insensitive matching toggled.
    #[must_use]
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Create a new configuration with debug logging toggled.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Create a new configuration with the specified log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// The effective log level, raised to `Debug` when `debug` is set.
    #[must_use]
    pub fn effective_log_level(&self) -> LogLevel {
        match self.log_level {
            LogLevel::Trace => LogLevel::Trace,
            _ if self.debug => LogLevel::Debug,
            level => level,
        }
    }
}

fn validate_threshold(threshold: f64) -> Result<f64, StepbindError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(StepbindError::InvalidConfig(format!(
            "active threshold {threshold} must lie between 0 and 1"
        )))
    }
}

fn parse_threshold(value: &str) -> Result<f64, StepbindError> {
    let threshold: f64 = value.trim().parse().map_err(|_| {
        StepbindError::InvalidConfig(format!(
            "invalid active threshold '{value}', expected a number between 0 and 1"
        ))
    })?;
    validate_threshold(threshold)
}

fn parse_flag(name: &str, value: &str) -> Result<bool, StepbindError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(StepbindError::InvalidConfig(format!(
            "invalid value '{value}' for {name}, expected true or false"
        ))),
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trace", LogLevel::Trace)]
    #[case("debug", LogLevel::Debug)]
    #[case("info", LogLevel::Info)]
    #[case("warn", LogLevel::Warn)]
    #[case("warning", LogLevel::Warn)]
    #[case("error", LogLevel::Error)]
    #[case("DEBUG", LogLevel::Debug)]
    fn log_level_parses_valid_values(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let result = "invalid".parse::<LogLevel>();
        assert!(result.unwrap_err().to_string().contains("unknown log level"));
    }

    #[test]
    fn default_values() {
        let config = StepbindConfig::default();
        assert!(config.active_threshold.total_cmp(&0.3).is_eq());
        assert!(!config.case_insensitive);
        assert!(!config.debug);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[rstest]
    #[case("0.5", true)]
    #[case("0", true)]
    #[case("1", true)]
    #[case("1.5", false)]
    #[case("-0.1", false)]
    #[case("half", false)]
    fn threshold_parsing_enforces_unit_interval(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(parse_threshold(input).is_ok(), ok);
    }

    #[rstest]
    #[case("true", true)]
    #[case("1", true)]
    #[case("Yes", true)]
    #[case("false", false)]
    #[case("0", false)]
    fn flags_parse_common_spellings(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(parse_flag("STEPBIND_DEBUG", input).unwrap(), expected);
    }

    #[test]
    fn flags_reject_other_text() {
        assert!(parse_flag("STEPBIND_DEBUG", "maybe").is_err());
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let config = StepbindConfig::default()
            .apply_overrides(Some(LogLevel::Error), Some(0.6), true, false)
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
        assert!(config.active_threshold.total_cmp(&0.6).is_eq());
        assert!(config.case_insensitive);
        assert!(!config.debug);

        let config = StepbindConfig::default()
            .apply_overrides(None, None, false, false)
            .unwrap();
        assert_eq!(config, StepbindConfig::default());
    }

    #[test]
    fn apply_overrides_rejects_out_of_range_threshold() {
        assert!(
            StepbindConfig::default()
                .apply_overrides(None, Some(2.0), false, false)
                .is_err()
        );
    }

    #[test]
    fn debug_raises_effective_log_level() {
        let mut config = StepbindConfig::default().with_log_level(LogLevel::Warn);
        assert_eq!(config.effective_log_level(), LogLevel::Warn);
        config.debug = true;
        assert_eq!(config.effective_log_level(), LogLevel::Debug);
        config.log_level = LogLevel::Trace;
        assert_eq!(config.effective_log_level(), LogLevel::Trace);
    }
}
