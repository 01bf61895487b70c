//! Domain types for a deployment run.
//!
//! Everything here is built once per invocation and never mutated afterwards.

use std::fmt;

/// Root under which every product/deployment pair lives in the bucket.
pub const DEPLOYMENTS_ROOT: &str = "deployments";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed product name (e.g. `webapp`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductName(pub String);

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProductName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed deployment name (e.g. `staging`, `production`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentName(pub String);

impl fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DeploymentName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DeploymentName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Static access keys used for both the object store and the CDN.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Deployment target
// ---------------------------------------------------------------------------

/// A validated product/deployment pair with everything needed to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    pub product: ProductName,
    pub deployment: DeploymentName,
    pub bucket: String,
    /// CDN distribution fronting this deployment.
    pub distribution_id: String,
}

impl DeployTarget {
    /// `deployments/<product>/<deployment>`, no trailing separator.
    pub fn prefix(&self) -> String {
        format!("{DEPLOYMENTS_ROOT}/{}/{}", self.product, self.deployment)
    }

    /// Full object key for a relative build path.
    pub fn object_key(&self, relative: &str) -> String {
        format!("{}/{relative}", self.prefix())
    }
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// How many superseded manifest generations keep their assets alive.
///
/// `0` disables retention: every obsolete remote file is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub versions_to_keep: u32,
}

impl RetentionPolicy {
    pub fn new(versions_to_keep: u32) -> Self {
        Self { versions_to_keep }
    }

    pub fn is_enabled(&self) -> bool {
        self.versions_to_keep > 0
    }
}

impl From<Option<u32>> for RetentionPolicy {
    fn from(versions: Option<u32>) -> Self {
        Self::new(versions.unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
