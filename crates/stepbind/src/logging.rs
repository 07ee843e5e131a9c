//! Log output for the `stepbind` binary and library.
//!
//! Everything goes to stderr; stdout carries only the reports.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::config::StepbindConfig;

fn filter_from_config(config: &StepbindConfig) -> EnvFilter {
    EnvFilter::new(config.effective_log_level().as_filter_str())
}

/// Install the global `tracing` subscriber for `config`.
///
/// The level is [`StepbindConfig::effective_log_level`]: `--log-level` wins
/// over `STEPBIND_LOG_LEVEL`, and the `debug` option never lets it drop
/// below `debug`.
///
/// Only the first call in a process installs a subscriber. Later calls are
/// no-ops, so tests and embedding tools may call this freely.
pub fn init_logging(config: &StepbindConfig) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from_config(config))
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::trace!("logging already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn repeated_initialisation_keeps_the_first_subscriber() {
        let config = StepbindConfig::default();
        init_logging(&config);
        init_logging(&StepbindConfig::default().with_debug(true));
    }

    #[test]
    fn filter_uses_config_log_level() {
        let config = StepbindConfig::default().with_log_level(LogLevel::Warn);
        assert_eq!(filter_from_config(&config).to_string(), "warn");
    }

    #[test]
    fn debug_option_raises_filter() {
        let config = StepbindConfig {
            debug: true,
            ..StepbindConfig::default()
        };
        assert_eq!(filter_from_config(&config).to_string(), "debug");
    }
}
