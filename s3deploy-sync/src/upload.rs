//! Object metadata applied at upload time.

/// Lifetime of the long-lived cache policy: 90 days.
pub const CACHE_SECONDS: u64 = 90 * 24 * 60 * 60;

/// Files clients must always revalidate so they discover new deployments.
/// Every build is required to contain both.
pub const ALWAYS_FRESH_FILES: [&str; 2] = ["index.html", "asset-manifest.json"];

const SOURCE_MAP_CONTENT_TYPE: &str = "application/octet-stream";

/// Cache-control policy for an uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never cache, always revalidate.
    NoCache,
    /// Public, cached for [`CACHE_SECONDS`].
    LongLived,
}

impl CachePolicy {
    /// Policy for a relative key.
    pub fn for_key(key: &str) -> Self {
        if ALWAYS_FRESH_FILES.contains(&key) {
            CachePolicy::NoCache
        } else {
            CachePolicy::LongLived
        }
    }

    /// Value of the `Cache-Control` header.
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::NoCache => {
                "max-age=0, no-cache, must-revalidate, proxy-revalidate, no-store".to_string()
            }
            CachePolicy::LongLived => format!("max-age={CACHE_SECONDS}, public"),
        }
    }
}

/// Content type inferred from the key's extension.
///
/// Source maps are forced to a binary type; unknown extensions get `None` and
/// the store's default applies.
pub fn content_type_for(key: &str) -> Option<String> {
    if key.ends_with(".map") {
        return Some(SOURCE_MAP_CONTENT_TYPE.to_string());
    }
    mime_guess::from_path(key)
        .first_raw()
        .map(str::to_owned)
}
