//! Error taxonomy for catalogue parsing and per-song uploads.

use thiserror::Error;

/// Failure of a single server call. Only `NotFound` is not a failure for the pipeline:
/// it is how an existence check reports an unknown song.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("song not found: {0}")]
    NotFound(String),

    /// Bad record fields (unparseable year, unreadable media file, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or transport failure. Not retried.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected the request.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Other(String),
}

impl UploadError {
    /// Short label for log lines and the error log.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::NotFound(_) => "not found",
            UploadError::Validation(_) => "validation",
            UploadError::Connection(_) => "connection",
            UploadError::BadRequest(_) => "bad request",
            UploadError::Other(_) => "unclassified",
        }
    }
}

/// Catalogue error. Fatal to the import unless it hits a row before the offset; never
/// attributed to a single song.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("syntax error, line {line}: {message}")]
    Syntax { line: u64, message: String },

    #[error("line {line}: missing required field `{field}`")]
    MissingField { line: u64, field: &'static str },

    #[error("catalogue I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogueError {
    /// Error confined to one row; the rows after it can still be read.
    pub fn is_row_error(&self) -> bool {
        matches!(self, CatalogueError::MissingField { .. })
    }
}

impl From<csv::Error> for CatalogueError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => CatalogueError::Io(e),
            _ => CatalogueError::Syntax { line, message },
        }
    }
}
