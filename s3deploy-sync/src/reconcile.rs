//! Local/remote set algebra: which keys to upload and which to remove.

use std::collections::BTreeSet;

use crate::error::SyncError;
use crate::inventory::Inventory;

/// File-name prefix of the build tool's precache manifests.
pub const MANIFEST_PREFIX: &str = "precache-manifest";

/// `true` when the last path segment of `key` starts with [`MANIFEST_PREFIX`].
pub fn is_manifest(key: &str) -> bool {
    key.rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with(MANIFEST_PREFIX))
}

/// Keys to write and keys that are candidates for removal.
///
/// The two sets are always disjoint: uploads come from local keys, deletions
/// from keys that exist only remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub to_upload: BTreeSet<String>,
    pub to_delete: BTreeSet<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_delete.is_empty()
    }
}

/// Compare a local inventory with the remote one.
///
/// - local only → upload
/// - remote only → delete candidate
/// - both → upload when `force_all`, when the checksums differ (a missing
///   remote checksum counts as different), or when the key is a manifest;
///   otherwise nothing.
pub fn reconcile(
    local: &Inventory,
    remote: &Inventory,
    force_all: bool,
) -> Result<Reconciliation, SyncError> {
    let mut result = Reconciliation::default();

    for record in local.iter() {
        let Some(remote_record) = remote.get(&record.key) else {
            tracing::debug!("new: {}", record.key);
            result.to_upload.insert(record.key.clone());
            continue;
        };

        if force_all {
            tracing::debug!("forced: {}", record.key);
            result.to_upload.insert(record.key.clone());
            continue;
        }

        let local_sum = record.content_checksum()?;
        let changed = match (&local_sum, &remote_record.checksum) {
            (Some(local_sum), Some(remote_sum)) => local_sum != remote_sum,
            _ => true,
        };

        if changed {
            tracing::debug!("changed: {}", record.key);
            result.to_upload.insert(record.key.clone());
        } else if is_manifest(&record.key) {
            tracing::debug!("manifest refresh: {}", record.key);
            result.to_upload.insert(record.key.clone());
        } else {
            tracing::debug!("unchanged: {}", record.key);
        }
    }

    result.to_delete = remote
        .keys()
        .filter(|key| !local.contains(key))
        .map(str::to_owned)
        .collect();

    Ok(result)
}
