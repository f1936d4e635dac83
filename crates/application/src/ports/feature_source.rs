//! Feature source port
//!
//! Defines how scenario suites are discovered and turned into runnable
//! features.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::runner::Feature;

/// Errors that can occur while loading scenario files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The glob pattern is malformed.
    #[error("Invalid tests pattern '{pattern}': {message}")]
    Pattern {
        /// Offending pattern.
        pattern: String,
        /// Parser message.
        message: String,
    },

    /// A scenario file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A scenario file is not a valid suite document.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A schema reference names no schema of the file.
    #[error("Unknown schema '{name}' referenced in {path}")]
    UnknownSchema {
        /// File holding the reference.
        path: PathBuf,
        /// Referenced name.
        name: String,
    },
}

/// Source of runnable features.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Loads every feature matching `pattern`, in a stable order.
    ///
    /// # Errors
    /// Returns the first file that cannot be read, parsed or resolved.
    async fn load(&self, pattern: &str) -> Result<Vec<Feature>, LoadError>;
}
