//! # s3deploy-sync
//!
//! Checksum-gated reconciliation of a build directory against a bucket prefix.
//!
//! Call [`pipeline::run`] to validate, reconcile, upload, delete and invalidate
//! in one go, or [`pipeline::plan`] to compute the upload/delete sets without
//! touching the remote side.

pub mod error;
pub mod fingerprint;
pub mod inventory;
pub mod memory;
pub mod pipeline;
pub mod reconcile;
pub mod remote;
pub mod upload;
pub mod version_guard;

pub use error::SyncError;
pub use inventory::{FileRecord, Inventory};
pub use pipeline::{SyncOptions, SyncReport, TransferResult};
pub use reconcile::Reconciliation;
pub use remote::{CacheInvalidator, PutObject, RemoteObject, RemoteStore, RemoteStoreError};
