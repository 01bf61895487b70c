//! Sectioned YAML configuration.
//!
//! # File layout
//!
//! ```yaml
//! general:
//!   products: webapp admin
//!   deployments: staging production
//!   s3_bucket: my-bucket
//!   region: us-east-1            # optional
//! cloudfront-webapp:
//!   staging-dist-id: E2QWRUHAPOMQZL
//! aws-credentials:
//!   access_id: AKIA...
//!   secret_key: ...
//! ```
//!
//! # API pattern
//!
//! - `load_at(path)` reads the raw sections; nothing is validated yet.
//! - [`DeployConfig::resolve`] turns the sections into an immutable value,
//!   taking environment lookups as a closure so tests never touch the real
//!   process environment.
//! - [`DeployConfig::target`] validates a product/deployment pair.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::Value;

use crate::error::ValidationError;
use crate::types::{Credentials, DeployTarget, DeploymentName, ProductName};

pub const GENERAL_SECTION: &str = "general";
pub const CREDENTIALS_SECTION: &str = "aws-credentials";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Environment variables that take precedence over the credentials section.
pub const ACCESS_ID_ENV: &str = "AWS_S3_DEPLOY_ACCESS_ID";
pub const SECRET_KEY_ENV: &str = "AWS_S3_DEPLOY_SECRET_KEY";

// ---------------------------------------------------------------------------
// 1. Raw sections
// ---------------------------------------------------------------------------

/// The config file as loaded: section name → key → scalar value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

/// Load the configuration file at `path`.
///
/// Returns `ValidationError::ConfigNotFound` if absent,
/// `ValidationError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<ConfigFile, ValidationError> {
    if !path.exists() {
        return Err(ValidationError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    ConfigFile::parse(&contents).map_err(|source| ValidationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ConfigFile {
    /// Parse YAML text. An empty document is an empty config.
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<BTreeMap<String, Option<BTreeMap<String, Value>>>> =
            serde_yaml::from_str(contents)?;

        let sections = raw
            .unwrap_or_default()
            .into_iter()
            .map(|(name, entries)| {
                let entries = entries
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|(key, value)| scalar_text(&value).map(|text| (key, text)))
                    .collect();
                (name, entries)
            })
            .collect();
        Ok(Self { sections })
    }

    /// Required value: errors name the missing section or option.
    pub fn value(&self, section: &str, key: &str) -> Result<&str, ValidationError> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| ValidationError::MissingSection {
                section: section.to_string(),
            })?;
        entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ValidationError::MissingOption {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Optional value: `None` when either the section or the key is absent.
    pub fn optional(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    /// Required whitespace-separated list.
    pub fn list(&self, section: &str, key: &str) -> Result<Vec<String>, ValidationError> {
        Ok(self
            .value(section, key)?
            .split_whitespace()
            .map(str::to_owned)
            .collect())
    }
}

/// Flatten a YAML scalar (or a sequence of scalars) into config text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// 2. Resolved configuration
// ---------------------------------------------------------------------------

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub products: Vec<ProductName>,
    pub deployments: Vec<DeploymentName>,
    pub bucket: String,
    pub region: String,
    pub credentials: Credentials,
    file: ConfigFile,
}

impl DeployConfig {
    /// Resolve every required setting. `env` looks up environment variables;
    /// empty values count as unset.
    pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let products = file
            .list(GENERAL_SECTION, "products")?
            .into_iter()
            .map(ProductName::from)
            .collect();
        let deployments = file
            .list(GENERAL_SECTION, "deployments")?
            .into_iter()
            .map(DeploymentName::from)
            .collect();
        let bucket = file.value(GENERAL_SECTION, "s3_bucket")?.to_string();
        let region = file
            .optional(GENERAL_SECTION, "region")
            .unwrap_or(DEFAULT_REGION)
            .to_string();

        let lookup = |var: &str, key: &str| -> Result<String, ValidationError> {
            match env(var).filter(|v| !v.is_empty()) {
                Some(v) => Ok(v),
                None => file.value(CREDENTIALS_SECTION, key).map(str::to_owned),
            }
        };
        let credentials = Credentials {
            access_id: lookup(ACCESS_ID_ENV, "access_id")?,
            secret_key: lookup(SECRET_KEY_ENV, "secret_key")?,
        };

        Ok(Self {
            products,
            deployments,
            bucket,
            region,
            credentials,
            file,
        })
    }

    /// [`resolve`](Self::resolve) against the real process environment.
    pub fn from_env(file: ConfigFile) -> Result<Self, ValidationError> {
        Self::resolve(file, |var| std::env::var(var).ok())
    }

    /// Validate a product/deployment pair and look up its CDN distribution.
    pub fn target(
        &self,
        product: &ProductName,
        deployment: &DeploymentName,
    ) -> Result<DeployTarget, ValidationError> {
        if !self.products.contains(product) {
            return Err(ValidationError::UnknownProduct {
                name: product.to_string(),
                valid: join(&self.products),
            });
        }
        if !self.deployments.contains(deployment) {
            return Err(ValidationError::UnknownDeployment {
                name: deployment.to_string(),
                valid: join(&self.deployments),
            });
        }

        let section = format!("cloudfront-{product}");
        let key = format!("{deployment}-dist-id");
        let distribution_id = self.file.value(&section, &key)?.to_string();

        Ok(DeployTarget {
            product: product.clone(),
            deployment: deployment.clone(),
            bucket: self.bucket.clone(),
            distribution_id,
        })
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
