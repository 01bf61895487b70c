//! s3-deploy core library: domain types, configuration, validation errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, deployment target, retention policy
//! - [`error`]: [`ValidationError`]
//! - [`config`]: sectioned config file loading and [`DeployConfig`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigFile, DeployConfig};
pub use error::ValidationError;
pub use types::{Credentials, DeployTarget, DeploymentName, ProductName, RetentionPolicy};
