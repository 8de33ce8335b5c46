use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a refresh run.
///
/// Only [`EtlError::Transient`] is retried, see [`crate::etl::retry::RetryPolicy`].
/// A non-success status is reported as [`EtlError::Status`] and is fatal right away.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("{method} {url} failed: {source}")]
    Transient {
        method: &'static str,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{method} request to {url} failed with status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("invalid checkpoint timestamp {value:?} in {path:?}: {reason}")]
    InvalidCheckpoint {
        path: PathBuf,
        value: String,
        reason: String,
    },

    #[error("invalid last-modified header {value:?}: {reason}")]
    InvalidLastModified { value: String, reason: String },

    #[error("archive {path:?} has {count} members, expected exactly one")]
    ArchiveMembers { path: PathBuf, count: usize },

    #[error("archive {path:?} has no file to extract")]
    EmptyArchive { path: PathBuf },

    #[error("sheet {sheet:?} not found in {path:?}, available sheets: {available:?}")]
    MissingSheet {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet {sheet:?} has no header row after skipping {skip_rows} rows")]
    MissingHeader { sheet: String, skip_rows: usize },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Xlsx(#[from] calamine::XlsxError),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl EtlError {
    pub fn transient<E>(method: &'static str, url: &str, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        EtlError::Transient {
            method,
            url: url.to_string(),
            source: source.into(),
        }
    }

    /// True for failures worth another attempt: timeouts, refused connections,
    /// a body stream cut short.
    pub fn is_transient(&self) -> bool {
        matches!(self, EtlError::Transient { .. })
    }

    /// The HTTP status code, if the error is a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            EtlError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
