//! Error types for pktview.

use thiserror::Error;

/// Main error type for library operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a capture or writing an export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A packet record that is not valid wire JSON
    #[error("Invalid packet record at line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    /// Export destination unusable
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
