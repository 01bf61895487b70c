//! Content fingerprints comparable with S3 entity tags.
//!
//! A single-part S3 upload reports the hex MD5 of its body as its ETag, so a
//! local digest can be compared with the remote listing directly.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use md5::{Digest, Md5};

use crate::error::{io_err, SyncError};

/// Bytes read per iteration. The digest does not depend on it.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Hex MD5 of the file at `path`, read in [`CHUNK_SIZE`] chunks.
pub fn fingerprint(path: &Path) -> Result<String, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_err(path, e)),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hex MD5 of an in-memory body.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}
