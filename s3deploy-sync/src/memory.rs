//! In-memory [`RemoteStore`] + [`CacheInvalidator`].
//!
//! Behaves like a single-part-upload S3 bucket: entity tags are the quoted MD5
//! of the body and every write advances the object's modification time past
//! everything already stored. Every mutating call is recorded so tests can
//! assert exactly which side effects a run performed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

use crate::fingerprint::fingerprint_bytes;
use crate::remote::{CacheInvalidator, PutObject, RemoteObject, RemoteStore, RemoteStoreError};

/// A mutating call observed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Put {
        key: String,
        content_type: Option<String>,
        cache_control: String,
    },
    Delete {
        key: String,
    },
    Invalidation {
        distribution_id: String,
        paths: Vec<String>,
    },
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    CheckAccess,
    List,
    Get,
    Put,
    Delete,
    Invalidate,
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    etag: Option<String>,
    size: Option<u64>,
    last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    calls: Vec<RemoteCall>,
    failures: BTreeMap<Operation, String>,
    invalidations: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub const DEFAULT_BUCKET: &'static str = "test-bucket";

    /// A store holding one empty bucket, [`Self::DEFAULT_BUCKET`].
    pub fn new() -> Self {
        let store = Self::default();
        store.lock().buckets.insert(Self::DEFAULT_BUCKET.to_string());
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Place a listing entry in the default bucket without recording a call.
    pub fn seed(&self, object: RemoteObject) {
        let key = (Self::DEFAULT_BUCKET.to_string(), object.key);
        self.lock().objects.insert(
            key,
            StoredObject {
                body: Vec::new(),
                etag: object.etag,
                size: object.size,
                last_modified: object.last_modified,
            },
        );
    }

    /// Place an object with a body (and matching entity tag) in the default
    /// bucket without recording a call.
    pub fn seed_body(&self, key: &str, body: &[u8], last_modified: DateTime<Utc>) {
        let entry = (Self::DEFAULT_BUCKET.to_string(), key.to_string());
        self.lock().objects.insert(
            entry,
            StoredObject {
                body: body.to_vec(),
                etag: Some(format!("\"{}\"", fingerprint_bytes(body))),
                size: Some(body.len() as u64),
                last_modified: Some(last_modified),
            },
        );
    }

    /// Make every later call of `operation` fail with `message`.
    pub fn fail(&self, operation: Operation, message: &str) {
        self.lock().failures.insert(operation, message.to_string());
    }

    /// Mutating calls in the order they happened.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Keys currently stored in the default bucket.
    pub fn keys(&self) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(bucket, _)| bucket == Self::DEFAULT_BUCKET)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Body stored under `key` in the default bucket.
    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(Self::DEFAULT_BUCKET.to_string(), key.to_string()))
            .map(|o| o.body.clone())
    }

    fn check(state: &State, operation: Operation) -> Result<(), RemoteStoreError> {
        match state.failures.get(&operation) {
            Some(message) => Err(RemoteStoreError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn check_bucket(state: &State, bucket: &str) -> Result<(), RemoteStoreError> {
        if state.buckets.contains(bucket) {
            Ok(())
        } else {
            Err(RemoteStoreError::new(format!(
                "The specified bucket does not exist: {bucket}"
            )))
        }
    }
}

/// One second past the newest stored modification time.
fn next_timestamp(state: &State) -> DateTime<Utc> {
    let epoch = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap_or_default();
    let newest = state
        .objects
        .values()
        .filter_map(|o| o.last_modified)
        .max()
        .unwrap_or(epoch);
    newest + Duration::seconds(1)
}

impl RemoteStore for MemoryStore {
    fn check_access(&self, bucket: &str) -> Result<(), RemoteStoreError> {
        let state = self.lock();
        Self::check(&state, Operation::CheckAccess)?;
        Self::check_bucket(&state, bucket)
    }

    fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<RemoteObject>, RemoteStoreError> {
        let state = self.lock();
        Self::check(&state, Operation::List)?;
        Self::check_bucket(&state, bucket)?;
        Ok(state
            .objects
            .iter()
            .filter(|((b, key), _)| b == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| RemoteObject {
                key: key.clone(),
                etag: object.etag.clone(),
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        let state = self.lock();
        Self::check(&state, Operation::Get)?;
        Self::check_bucket(&state, bucket)?;
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
            .ok_or_else(|| RemoteStoreError::new(format!("The specified key does not exist: {key}")))
    }

    fn put_object(&self, bucket: &str, object: PutObject) -> Result<(), RemoteStoreError> {
        let mut state = self.lock();
        Self::check(&state, Operation::Put)?;
        Self::check_bucket(&state, bucket)?;
        let last_modified = next_timestamp(&state);
        state.calls.push(RemoteCall::Put {
            key: object.key.clone(),
            content_type: object.content_type.clone(),
            cache_control: object.cache_control.clone(),
        });
        let etag = Some(format!("\"{}\"", fingerprint_bytes(&object.body)));
        let size = Some(object.body.len() as u64);
        state.objects.insert(
            (bucket.to_string(), object.key),
            StoredObject {
                body: object.body,
                etag,
                size,
                last_modified: Some(last_modified),
            },
        );
        Ok(())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), RemoteStoreError> {
        let mut state = self.lock();
        Self::check(&state, Operation::Delete)?;
        Self::check_bucket(&state, bucket)?;
        state.calls.push(RemoteCall::Delete {
            key: key.to_string(),
        });
        state.objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

impl CacheInvalidator for MemoryStore {
    fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        _caller_reference: &str,
    ) -> Result<String, RemoteStoreError> {
        let mut state = self.lock();
        Self::check(&state, Operation::Invalidate)?;
        state.invalidations += 1;
        state.calls.push(RemoteCall::Invalidation {
            distribution_id: distribution_id.to_string(),
            paths: paths.to_vec(),
        });
        Ok(format!("I{:04}", state.invalidations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_reports_seeded_metadata_unchanged() {
        let store = MemoryStore::new();
        store.seed(RemoteObject {
            key: "deployments/web/prod/app.css".to_string(),
            etag: Some("\"abc\"".to_string()),
            size: Some(42),
            last_modified: None,
        });

        let listed = store
            .list_objects(MemoryStore::DEFAULT_BUCKET, "deployments/web/prod/")
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].size, Some(42));
        assert_eq!(listed[0].etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn put_records_body_size_and_md5_etag() {
        let store = MemoryStore::new();
        store
            .put_object(
                MemoryStore::DEFAULT_BUCKET,
                PutObject {
                    key: "a.txt".to_string(),
                    body: b"hello".to_vec(),
                    content_type: None,
                    cache_control: "no-cache".to_string(),
                },
            )
            .unwrap();

        let listed = store.list_objects(MemoryStore::DEFAULT_BUCKET, "").unwrap();
        assert_eq!(listed[0].size, Some(5));
        assert_eq!(
            listed[0].etag.as_deref(),
            Some("\"5d41402abc4b2a76b9719d911017c592\"")
        );
        assert_eq!(store.body("a.txt").as_deref(), Some(&b"hello"[..]));
    }
}
