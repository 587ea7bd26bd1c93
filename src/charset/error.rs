//! Error types for charset detection and normalization

use std::path::PathBuf;

/// Error types for the charset reader pipeline
#[derive(thiserror::Error, Debug)]
pub enum CharsetReaderError {
    /// The source ended before a single byte could be primed.
    #[error("Source is empty")]
    EmptySource,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed {encoding} input: {cause}")]
    Decode {
        encoding: &'static str,
        cause: String,
    },

    #[error("Cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot close {path:?}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for charset reader operations
pub type Result<T> = std::result::Result<T, CharsetReaderError>;

impl CharsetReaderError {
    /// Create a decode error
    pub fn decode<S: Into<String>>(encoding: &'static str, cause: S) -> Self {
        Self::Decode {
            encoding,
            cause: cause.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when the source legitimately ended, as opposed to failing
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EmptySource)
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptySource => "empty_source",
            Self::Io(_) => "io",
            Self::Decode { .. } => "decode",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Wrap into an `io::Error` so the error can cross a `Read` boundary.
    pub(crate) fn into_io_error(self) -> std::io::Error {
        match self {
            Self::Io(e) => e,
            Self::Decode { .. } => std::io::Error::new(std::io::ErrorKind::InvalidData, self),
            other => std::io::Error::other(other),
        }
    }
}
