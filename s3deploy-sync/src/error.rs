//! Error types for s3deploy-sync.

use std::path::PathBuf;

use thiserror::Error;

use s3deploy_core::ValidationError;

use crate::remote::RemoteStoreError;

/// All errors that can abort a synchronization run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The target or build directory failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Any failure reported by the object store or the CDN.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),

    /// An I/O error on a local file, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A retained precache manifest could not be parsed.
    #[error("cannot parse manifest {key}: {message}")]
    Manifest { key: String, message: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
