//! Store error type

use std::path::PathBuf;

/// Failure writing or reading one document.
#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize {
        id: String,
        source: serde_json::Error,
    },
    /// Stored file exists but is not a valid document
    Corrupt { path: PathBuf, message: String },
    /// Backend refused the write
    Rejected { id: String, message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "IO {}: {source}", path.display()),
            Self::Serialize { id, source } => write!(f, "serialize {id}: {source}"),
            Self::Corrupt { path, message } => write!(f, "corrupt {}: {message}", path.display()),
            Self::Rejected { id, message } => write!(f, "rejected {id}: {message}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialize { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
