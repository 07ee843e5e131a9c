//! Semantic error types for stepbind.
//!
//! Nothing in the indexing pipeline is fatal: compilation failures drop one
//! binding and unreadable files are skipped. The errors defined here surface
//! at the edges, where configuration is loaded and feature files are read on
//! behalf of the command-line tool.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by configuration loading and feature-file handling.
#[derive(Debug, Error)]
pub enum StepbindError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking a workspace root failed.
    #[error("workspace walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A feature file could not be parsed as Gherkin.
    #[error("failed to parse feature file {}: {message}", path.display())]
    FeatureParse {
        /// Path of the offending feature file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}
