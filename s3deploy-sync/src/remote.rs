//! The remote capabilities the sync engine consumes.
//!
//! Both traits are synchronous; adapters over async SDKs block internally.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Any failure reported by the object store or the CDN, carrying the
/// provider's message verbatim. Always fatal to the current run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote store error: {message}")]
pub struct RemoteStoreError {
    pub message: String,
}

impl RemoteStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One entry of an object listing, exactly as the store reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full object key, including the listing prefix.
    pub key: String,
    /// Entity tag, possibly still wrapped in quotes.
    pub etag: Option<String>,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A single object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub cache_control: String,
}

/// Object storage operations needed to deploy a build.
pub trait RemoteStore {
    /// Cheap probe proving the bucket exists and the credentials can read it.
    fn check_access(&self, bucket: &str) -> Result<(), RemoteStoreError>;

    /// Every object under `prefix`, across all result pages.
    fn list_objects(&self, bucket: &str, prefix: &str)
        -> Result<Vec<RemoteObject>, RemoteStoreError>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError>;

    fn put_object(&self, bucket: &str, object: PutObject) -> Result<(), RemoteStoreError>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), RemoteStoreError>;
}

/// CDN cache invalidation.
pub trait CacheInvalidator {
    /// Start an invalidation and return the provider's invalidation id.
    fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<String, RemoteStoreError>;
}
