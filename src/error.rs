//! Errors raised while aggregating simulation result directories.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single aggregation call.
///
/// Every variant is fatal to the `load` that produced it; records that are
/// well-formed but degenerate are dropped instead and never show up here.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("results directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("malformed result filename '{name}': expected <prefix>{separator}<index>.<ext>")]
    MalformedFilename { name: String, separator: String },

    #[error("malformed record in {}: {reason}", .path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("invalid JSON in {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("series length mismatch: x has {x} values but y has {y}")]
    LengthMismatch { x: usize, y: usize },
}

pub type Result<T> = std::result::Result<T, AggregateError>;

// Directory walk failures carry their own path when one is known.
impl From<walkdir::Error> for AggregateError {
    fn from(e: walkdir::Error) -> Self {
        let path = e
            .path()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("<unknown>"));
        let source = e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "directory walk loop"));
        AggregateError::Io { path, source }
    }
}
