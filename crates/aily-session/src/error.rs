//! Error types for record cache operations.

/// Error type for record cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading or writing the backing file failed.
    #[error("record cache I/O error at '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The backing file does not contain valid records.
    #[error("record cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for record cache operations.
pub type Result<T> = std::result::Result<T, Error>;
