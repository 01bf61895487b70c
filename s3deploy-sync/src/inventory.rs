//! File inventories: the local build tree and the remote prefix listing,
//! both keyed by `/`-separated relative path.

use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::error::{io_err, SyncError};
use crate::fingerprint::fingerprint;
use crate::remote::RemoteStore;

/// One file, local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub key: String,
    /// Remote: entity tag without quotes. Local: `None` until computed.
    pub checksum: Option<String>,
    pub size: Option<u64>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Absolute path on disk; set for local records only.
    pub source: Option<PathBuf>,
}

impl FileRecord {
    /// A record with nothing but a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            checksum: None,
            size: None,
            modified_at: None,
            source: None,
        }
    }

    /// The stored checksum, or the digest of `source` when none is stored.
    ///
    /// Returns `Ok(None)` for a record with neither.
    pub fn content_checksum(&self) -> Result<Option<String>, SyncError> {
        match (&self.checksum, &self.source) {
            (Some(sum), _) => Ok(Some(sum.clone())),
            (None, Some(path)) => fingerprint(path).map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// A set of [`FileRecord`]s with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    records: BTreeMap<String, FileRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous record with the same key.
    pub fn insert(&mut self, record: FileRecord) {
        self.records.insert(record.key.clone(), record);
    }

    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, FileRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<FileRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for record in iter {
            inventory.insert(record);
        }
        inventory
    }
}

// ---------------------------------------------------------------------------
// Local
// ---------------------------------------------------------------------------

/// Every regular file under `root`, recursively. Symlinks are not followed.
///
/// Checksums are left empty and computed lazily by the reconciler, which only
/// needs them for files that also exist remotely.
pub fn build_local(root: &Path) -> Result<Inventory, SyncError> {
    let mut inventory = Inventory::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let key = relative_key(relative);
        let metadata = entry.metadata().map_err(|e| io_err(path, e.into()))?;

        inventory.insert(FileRecord {
            key,
            checksum: None,
            size: Some(metadata.len()),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            source: Some(path.to_path_buf()),
        });
    }
    tracing::debug!("local inventory: {} files under {}", inventory.len(), root.display());
    Ok(inventory)
}

/// Join path components with `/` whatever the platform separator is.
fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// Every object under `prefix/` in `bucket`, keyed relative to the prefix.
///
/// A missing or empty listing yields an empty inventory.
pub fn build_remote(
    store: &dyn RemoteStore,
    bucket: &str,
    prefix: &str,
) -> Result<Inventory, SyncError> {
    let listing_prefix = format!("{}/", prefix.trim_end_matches('/'));
    let objects = store.list_objects(bucket, &listing_prefix)?;

    let mut inventory = Inventory::new();
    for object in objects {
        let Some(key) = object.key.strip_prefix(&listing_prefix) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        inventory.insert(FileRecord {
            key: key.to_string(),
            checksum: object.etag.as_deref().map(strip_quotes),
            size: object.size,
            modified_at: object.last_modified,
            source: None,
        });
    }
    tracing::debug!(
        "remote inventory: {} objects under s3://{}/{}",
        inventory.len(),
        bucket,
        listing_prefix
    );
    Ok(inventory)
}

/// `"abc"` → `abc`; anything else is returned unchanged.
fn strip_quotes(etag: &str) -> String {
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::remote::RemoteObject;
    use tempfile::TempDir;

    #[test]
    fn local_keys_are_slash_separated_and_recursive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("static/js")).unwrap();
        std::fs::write(root.join("index.html"), "<html>").unwrap();
        std::fs::write(root.join("static/js/main.js"), "x").unwrap();

        let inventory = build_local(root).unwrap();
        let keys: Vec<_> = inventory.keys().collect();
        assert_eq!(keys, vec!["index.html", "static/js/main.js"]);

        let record = inventory.get("index.html").unwrap();
        assert_eq!(record.size, Some(6));
        assert!(record.checksum.is_none());
        assert!(record.source.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_descended() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("static")).unwrap();
        std::fs::write(root.join("static/app.js"), "x").unwrap();
        std::os::unix::fs::symlink(root, root.join("static/loop")).unwrap();

        let inventory = build_local(root).unwrap();
        assert_eq!(inventory.keys().collect::<Vec<_>>(), vec!["static/app.js"]);
    }

    #[test]
    fn local_checksum_is_computed_on_demand() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "hello").unwrap();
        let inventory = build_local(tmp.path()).unwrap();
        let sum = inventory.get("a.txt").unwrap().content_checksum().unwrap();
        assert_eq!(sum.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
    }

    #[test]
    fn remote_keys_are_relative_and_etags_unquoted() {
        let store = MemoryStore::new();
        store.seed(RemoteObject {
            key: "deployments/web/prod/static/css/app.css".to_string(),
            etag: Some("\"abc123\"".to_string()),
            size: Some(10),
            last_modified: None,
        });

        let inventory = build_remote(&store, MemoryStore::DEFAULT_BUCKET, "deployments/web/prod")
            .unwrap();
        let record = inventory.get("static/css/app.css").unwrap();
        assert_eq!(record.checksum.as_deref(), Some("abc123"));
        assert_eq!(record.size, Some(10));
    }

    #[test]
    fn sibling_prefixes_are_not_listed() {
        let store = MemoryStore::new();
        for key in ["deployments/web/prod/a.js", "deployments/web/prod2/b.js"] {
            store.seed(RemoteObject {
                key: key.to_string(),
                etag: None,
                size: None,
                last_modified: None,
            });
        }
        let inventory = build_remote(&store, MemoryStore::DEFAULT_BUCKET, "deployments/web/prod")
            .unwrap();
        assert_eq!(inventory.keys().collect::<Vec<_>>(), vec!["a.js"]);
    }

    #[test]
    fn empty_listing_is_empty_inventory() {
        let store = MemoryStore::new();
        let inventory = build_remote(&store, MemoryStore::DEFAULT_BUCKET, "deployments/x/y").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn strip_quotes_leaves_unbalanced_tags_alone() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\"abc"), "\"abc");
    }
}
