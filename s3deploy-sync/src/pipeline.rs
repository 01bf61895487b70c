//! End-to-end deployment run.
//!
//! 1. Validate the build directory and probe the bucket.
//! 2. Build the local and remote inventories and reconcile them.
//! 3. Drop deletion candidates protected by the retention window.
//! 4. Upload, then delete (both skipped in dry-run mode).
//! 5. Invalidate the whole CDN distribution (skipped in dry-run mode).
//!
//! Invalidation-only mode runs steps 1 and 5.

use std::path::Path;

use chrono::Utc;

use s3deploy_core::{DeployTarget, RetentionPolicy, ValidationError};

use crate::error::{io_err, SyncError};
use crate::inventory::{build_local, build_remote};
use crate::reconcile::{reconcile, Reconciliation};
use crate::remote::{CacheInvalidator, PutObject, RemoteStore};
use crate::upload::{content_type_for, CachePolicy, ALWAYS_FRESH_FILES};
use crate::version_guard::protect;

/// Path pattern covering the entire distribution.
pub const INVALIDATE_ALL: &str = "/*";

/// Flags controlling a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute and report everything, change nothing remotely.
    pub dry_run: bool,
    /// Upload every local file regardless of checksums.
    pub force_transfer: bool,
    /// Skip reconciliation entirely and only invalidate the CDN.
    pub invalidation_only: bool,
    pub retention: RetentionPolicy,
}

/// Outcome of an individual object operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    Uploaded { key: String, cache: CachePolicy },
    /// `--dry-run` mode: the file *would* have been uploaded.
    WouldUpload { key: String, cache: CachePolicy },
    Deleted { key: String },
    /// `--dry-run` mode: the object *would* have been removed.
    WouldDelete { key: String },
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// `deployments/<product>/<deployment>`
    pub prefix: String,
    /// Sets after retention filtering; empty in invalidation-only mode.
    pub plan: Reconciliation,
    /// Uploads first, then deletions, each in key order.
    pub transfers: Vec<TransferResult>,
    /// Invalidation id, `None` in dry-run mode.
    pub invalidation: Option<String>,
}

impl SyncReport {
    pub fn uploaded(&self) -> usize {
        self.transfers
            .iter()
            .filter(|t| {
                matches!(
                    t,
                    TransferResult::Uploaded { .. } | TransferResult::WouldUpload { .. }
                )
            })
            .count()
    }

    pub fn removed(&self) -> usize {
        self.transfers
            .iter()
            .filter(|t| {
                matches!(
                    t,
                    TransferResult::Deleted { .. } | TransferResult::WouldDelete { .. }
                )
            })
            .count()
    }
}

/// The build directory exists and contains every always-fresh file.
pub fn validate_build_dir(build_dir: &Path) -> Result<(), ValidationError> {
    if !build_dir.is_dir() {
        return Err(ValidationError::BuildDirMissing {
            path: build_dir.to_path_buf(),
        });
    }
    for file in ALWAYS_FRESH_FILES {
        if !build_dir.join(file).is_file() {
            return Err(ValidationError::MissingBuildFile {
                dir: build_dir.to_path_buf(),
                file: file.to_string(),
            });
        }
    }
    Ok(())
}

/// Compute the upload and (retention-filtered) delete sets.
///
/// Reads the remote side but never writes to it, so dry-run and real runs
/// always agree on the sets.
pub fn plan(
    store: &dyn RemoteStore,
    target: &DeployTarget,
    build_dir: &Path,
    options: &SyncOptions,
) -> Result<Reconciliation, SyncError> {
    let prefix = target.prefix();
    let local = build_local(build_dir)?;
    let remote = build_remote(store, &target.bucket, &prefix)?;

    let mut result = reconcile(&local, &remote, options.force_transfer)?;
    if options.retention.is_enabled() {
        result.to_delete = protect(
            store,
            &target.bucket,
            &prefix,
            &remote,
            &result.to_delete,
            options.retention,
        )?;
    }
    tracing::info!(
        "{}: {} to upload, {} to remove",
        prefix,
        result.to_upload.len(),
        result.to_delete.len()
    );
    Ok(result)
}

/// Run a full deployment against `store` and `cdn`.
///
/// Any error aborts the run immediately; nothing is retried or rolled back.
pub fn run(
    store: &dyn RemoteStore,
    cdn: &dyn CacheInvalidator,
    target: &DeployTarget,
    build_dir: &Path,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    validate_build_dir(build_dir)?;
    store.check_access(&target.bucket)?;

    let mut report = SyncReport {
        prefix: target.prefix(),
        plan: Reconciliation::default(),
        transfers: Vec::new(),
        invalidation: None,
    };

    if !options.invalidation_only {
        report.plan = plan(store, target, build_dir, options)?;
        for key in &report.plan.to_upload {
            let result = upload_file(store, target, build_dir, key, options.dry_run)?;
            report.transfers.push(result);
        }
        for key in &report.plan.to_delete {
            let result = delete_object(store, target, key, options.dry_run)?;
            report.transfers.push(result);
        }
    }

    if !options.dry_run {
        report.invalidation = Some(invalidate(cdn, target)?);
    }

    Ok(report)
}

fn upload_file(
    store: &dyn RemoteStore,
    target: &DeployTarget,
    build_dir: &Path,
    key: &str,
    dry_run: bool,
) -> Result<TransferResult, SyncError> {
    let object_key = target.object_key(key);
    let cache = CachePolicy::for_key(key);

    if dry_run {
        tracing::info!("[dry-run] would transfer to s3://{}/{}", target.bucket, object_key);
        return Ok(TransferResult::WouldUpload {
            key: key.to_string(),
            cache,
        });
    }

    let path = build_dir.join(key);
    let body = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
    tracing::info!("transferring to s3://{}/{}", target.bucket, object_key);
    store.put_object(
        &target.bucket,
        PutObject {
            key: object_key,
            body,
            content_type: content_type_for(key),
            cache_control: cache.header_value(),
        },
    )?;

    Ok(TransferResult::Uploaded {
        key: key.to_string(),
        cache,
    })
}

fn delete_object(
    store: &dyn RemoteStore,
    target: &DeployTarget,
    key: &str,
    dry_run: bool,
) -> Result<TransferResult, SyncError> {
    let object_key = target.object_key(key);

    if dry_run {
        tracing::info!("[dry-run] would remove s3://{}/{}", target.bucket, object_key);
        return Ok(TransferResult::WouldDelete {
            key: key.to_string(),
        });
    }

    tracing::info!("removing s3://{}/{}", target.bucket, object_key);
    store.delete_object(&target.bucket, &object_key)?;
    Ok(TransferResult::Deleted {
        key: key.to_string(),
    })
}

fn invalidate(cdn: &dyn CacheInvalidator, target: &DeployTarget) -> Result<String, SyncError> {
    let caller_reference = format!("s3-deploy-{}", Utc::now().to_rfc3339());
    tracing::info!("clearing CloudFront distribution: {}", target.distribution_id);
    let id = cdn.create_invalidation(
        &target.distribution_id,
        &[INVALIDATE_ALL.to_string()],
        &caller_reference,
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, Operation, RemoteCall};
    use s3deploy_core::{DeploymentName, ProductName};
    use tempfile::TempDir;

    fn target() -> DeployTarget {
        DeployTarget {
            product: ProductName::from("web"),
            deployment: DeploymentName::from("prod"),
            bucket: MemoryStore::DEFAULT_BUCKET.to_string(),
            distribution_id: "EDIST".to_string(),
        }
    }

    fn build_dir() -> TempDir {
        let tmp = TempDir::new().expect("tmp");
        std::fs::write(tmp.path().join("index.html"), "<html></html>").expect("index");
        std::fs::write(tmp.path().join("asset-manifest.json"), "{}").expect("asset manifest");
        tmp
    }

    #[test]
    fn missing_build_dir_is_validation_error() {
        let tmp = TempDir::new().unwrap();
        let err = validate_build_dir(&tmp.path().join("build")).unwrap_err();
        assert!(matches!(err, ValidationError::BuildDirMissing { .. }));
    }

    #[test]
    fn build_dir_without_asset_manifest_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("index.html"), "x").unwrap();
        let err = validate_build_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("asset-manifest.json"), "got: {err}");
    }

    #[test]
    fn validation_failure_makes_no_remote_calls() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let err = run(&store, &store, &target(), tmp.path(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn unreachable_bucket_aborts_before_any_transfer() {
        let dir = build_dir();
        let store = MemoryStore::new();
        let mut target = target();
        target.bucket = "no-such-bucket".to_string();
        let err = run(&store, &store, &target, dir.path(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn invalidation_only_skips_transfers() {
        let dir = build_dir();
        let store = MemoryStore::new();
        let options = SyncOptions {
            invalidation_only: true,
            ..SyncOptions::default()
        };
        let report = run(&store, &store, &target(), dir.path(), &options).unwrap();
        assert!(report.transfers.is_empty());
        assert_eq!(report.invalidation.as_deref(), Some("I0001"));
        assert_eq!(
            store.calls(),
            vec![RemoteCall::Invalidation {
                distribution_id: "EDIST".to_string(),
                paths: vec!["/*".to_string()],
            }]
        );
    }

    #[test]
    fn put_failure_is_fatal_and_stops_the_run() {
        let dir = build_dir();
        let store = MemoryStore::new();
        store.fail(Operation::Put, "Access Denied");
        let err = run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "remote store error: Access Denied");
        assert!(store.calls().is_empty());
    }

    #[test]
    fn delete_failure_is_fatal_and_skips_invalidation() {
        let dir = build_dir();
        let store = MemoryStore::new();
        store.seed_body("deployments/web/prod/stale.js", b"old", Utc::now());
        store.fail(Operation::Delete, "Access Denied");

        let err = run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert!(store
            .calls()
            .iter()
            .all(|c| !matches!(c, RemoteCall::Invalidation { .. })));
        assert!(store.keys().contains(&"deployments/web/prod/stale.js".to_string()));
    }

    #[test]
    fn invalidation_failure_is_fatal_after_transfers() {
        let dir = build_dir();
        let store = MemoryStore::new();
        store.fail(Operation::Invalidate, "TooManyInvalidationsInProgress");

        let err = run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert_eq!(store.keys().len(), 2);
    }

    #[test]
    fn list_failure_is_fatal_before_any_transfer() {
        let dir = build_dir();
        let store = MemoryStore::new();
        store.fail(Operation::List, "SlowDown");

        let err = run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "remote store error: SlowDown");
        assert!(store.calls().is_empty());
    }

    #[test]
    fn access_check_failure_is_fatal() {
        let dir = build_dir();
        let store = MemoryStore::new();
        store.fail(Operation::CheckAccess, "Forbidden");

        let err = run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Remote(_)));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn uploads_carry_content_type_and_cache_policy() {
        let dir = build_dir();
        let store = MemoryStore::new();
        run(&store, &store, &target(), dir.path(), &SyncOptions::default()).unwrap();

        let index_put = store
            .calls()
            .into_iter()
            .find(|c| matches!(c, RemoteCall::Put { key, .. } if key.ends_with("/index.html")))
            .expect("index.html uploaded");
        match index_put {
            RemoteCall::Put {
                key,
                content_type,
                cache_control,
            } => {
                assert_eq!(key, "deployments/web/prod/index.html");
                assert_eq!(content_type.as_deref(), Some("text/html"));
                assert_eq!(cache_control, CachePolicy::NoCache.header_value());
            }
            other => panic!("expected put, got {other:?}"),
        }
    }
}
