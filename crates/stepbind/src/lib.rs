//! Step-binding discovery and resolution for BDD test suites.
//!
//! stepbind indexes the step definitions ("bindings") of a workspace written
//! against one of several BDD frameworks and resolves Gherkin steps to the
//! binding(s) they invoke.
//!
//! # Overview
//!
//! - [`providers`] detect which framework a workspace uses and extract
//!   bindings from its source files
//! - [`manager::ProviderManager`] runs detection concurrently and caches the
//!   resulting [`selection::ProviderSelection`]
//! - [`index::BindingIndex`] stores bindings per provider and per file
//! - [`resolver`] classifies a step as unmatched, unique or ambiguous
//! - [`context::BindingContext`] ties the pieces together for one workspace
//!
//! # Configuration
//!
//! [`config::StepbindConfig::from_env`] reads:
//!
//! - `STEPBIND_ACTIVE_THRESHOLD`: minimum confidence for a provider to be
//!   active (default 0.3)
//! - `STEPBIND_CASE_INSENSITIVE`: compile matchers case-insensitively
//! - `STEPBIND_DEBUG`: log skipped files and dropped step definitions
//! - `STEPBIND_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//!
//! # Example
//!
//! ```ignore
//! use stepbind::config::StepbindConfig;
//! use stepbind::context::BindingContext;
//!
//! let context = BindingContext::with_default_providers(StepbindConfig::from_env()?);
//! let selection = context.refresh(&roots).await;
//! println!("{selection}");
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod feature;
pub mod gherkin_model;
pub mod index;
pub mod logging;
pub mod manager;
pub mod providers;
pub mod resolver;
pub mod selection;

/// Test support utilities for unit and integration tests.
///
/// This module is hidden from documentation as it's intended for internal
/// test use only.
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
