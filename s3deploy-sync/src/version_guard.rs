//! Retention of superseded deployment generations.
//!
//! Every build ships a `precache-manifest.<hash>.js` listing the asset URLs of
//! that generation. When a new build replaces it, the old manifest and its
//! assets become deletion candidates. Keeping the newest `N` superseded
//! manifests, and every asset they reference, lets clients still running an
//! older build finish loading it.

use std::collections::BTreeSet;

use serde::Deserialize;

use s3deploy_core::RetentionPolicy;

use crate::error::SyncError;
use crate::inventory::{FileRecord, Inventory};
use crate::reconcile::is_manifest;
use crate::remote::RemoteStore;

/// Script form emitted by the build tool around the JSON entry list.
const CONCAT_MARKER: &str = ".concat(";

/// One manifest entry. Other fields (`revision`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    url: String,
}

/// Drop from `candidates` every key protected by the retention window.
///
/// With retention disabled the candidates are returned unchanged. Otherwise
/// the newest `versions_to_keep` manifests that are themselves candidates are
/// kept along with every asset they list. All retained manifests are fetched
/// and parsed before the filtered set is returned.
pub fn protect(
    store: &dyn RemoteStore,
    bucket: &str,
    prefix: &str,
    remote: &Inventory,
    candidates: &BTreeSet<String>,
    policy: RetentionPolicy,
) -> Result<BTreeSet<String>, SyncError> {
    if !policy.is_enabled() {
        return Ok(candidates.clone());
    }

    let mut keep = BTreeSet::new();
    for manifest in retained_manifests(remote, candidates, policy.versions_to_keep) {
        keep.insert(manifest.key.clone());

        let object_key = format!("{}/{}", prefix.trim_end_matches('/'), manifest.key);
        let body = store.get_object(bucket, &object_key)?;
        let assets = parse_manifest(&manifest.key, &body)?;
        tracing::info!(
            "retaining {} ({} referenced assets)",
            manifest.key,
            assets.len()
        );
        keep.extend(assets);
    }

    Ok(candidates.difference(&keep).cloned().collect())
}

/// Manifest records among `candidates`, newest first, at most `limit`.
///
/// Records without a modification time sort after every dated record; ties
/// are broken by key so the selection is deterministic.
pub fn retained_manifests<'a>(
    remote: &'a Inventory,
    candidates: &BTreeSet<String>,
    limit: u32,
) -> Vec<&'a FileRecord> {
    let mut manifests: Vec<&FileRecord> = remote
        .iter()
        .filter(|r| is_manifest(&r.key) && candidates.contains(&r.key))
        .collect();
    manifests.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| a.key.cmp(&b.key))
    });
    manifests.truncate(limit as usize);
    manifests
}

/// Asset keys referenced by a manifest body, leading `/` stripped.
///
/// Accepts a bare JSON array of entries, or the script form
/// `self.__precacheManifest = (self.__precacheManifest || []).concat([...]);`.
pub fn parse_manifest(key: &str, body: &[u8]) -> Result<Vec<String>, SyncError> {
    let parse_err = |message: String| SyncError::Manifest {
        key: key.to_string(),
        message,
    };

    let text = std::str::from_utf8(body).map_err(|e| parse_err(e.to_string()))?;
    let list = entry_list(text).ok_or_else(|| parse_err("no entry list found".to_string()))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(list).map_err(|e| parse_err(e.to_string()))?;

    Ok(entries
        .into_iter()
        .map(|entry| entry.url.trim_start_matches('/').to_string())
        .collect())
}

/// The `[...]` slice holding the entries.
fn entry_list(text: &str) -> Option<&str> {
    let body = match text.find(CONCAT_MARKER) {
        Some(at) => &text[at + CONCAT_MARKER.len()..],
        None => text,
    };
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    (start < end).then(|| &body[start..=end])
}
