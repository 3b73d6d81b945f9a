//! Module construction errors.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to build the module bank. Fatal at startup, never raised while
/// audio runs.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A sample file could not be decoded.
    #[error("failed to load sample {}: {source}", path.display())]
    Sample {
        /// The file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: hound::Error,
    },

    /// A sample source could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A sample file has no usable stem to name its word.
    #[error("cannot derive a word name from {}", path.display())]
    InvalidName {
        /// The file.
        path: PathBuf,
    },

    /// Two samples would register the same word.
    #[error("samples {} and {} both define '{name}'", first.display(), second.display())]
    DuplicateSample {
        /// The word both files map to.
        name: String,
        /// The file registered first.
        first: PathBuf,
        /// The file that collided.
        second: PathBuf,
    },
}
