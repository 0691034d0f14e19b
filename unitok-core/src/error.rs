//! Error types for the core library

use std::path::PathBuf;
use thiserror::Error;

/// Error type for tokenizer and detokenizer operations
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A resource data file could not be read
    #[error("Cannot read resource file {file}: {source}")]
    ResourceIo {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resource data file line failed to parse
    #[error("Resource error in {file}, line {line}: {message}")]
    Resource {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// A context regex in a resource entry failed to compile
    #[error("Bad context regex in {file}, line {line} ({slot} {pattern}): {source}")]
    ContextRegex {
        file: PathBuf,
        line: usize,
        slot: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
