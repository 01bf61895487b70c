//! Error types for s3deploy-core.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can make a deployment request invalid before any remote
/// call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("missing configuration section: {section}")]
    MissingSection { section: String },

    #[error("missing configuration option: {section}:{key}")]
    MissingOption { section: String, key: String },

    #[error("invalid product: {name}, valid products are: {valid}")]
    UnknownProduct { name: String, valid: String },

    #[error("invalid deployment: {name}, valid deployments are: {valid}")]
    UnknownDeployment { name: String, valid: String },

    #[error("build directory does not exist: {path}")]
    BuildDirMissing { path: PathBuf },

    /// One of the files every build must ship is absent.
    #[error("build directory {dir} is missing {file}")]
    MissingBuildFile { dir: PathBuf, file: String },
}
