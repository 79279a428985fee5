//! Content-addressed storage for ingested payloads.

use crate::BackendHandle;
use crate::error::{ErrorKind, Result};
use std::ops::Deref;
use std::path::PathBuf;
use tracing::instrument;

/// Length of a BLAKE3 digest rendered as lowercase hex.
const HASH_HEX_LEN: usize = 64;

/// Hex-encoded BLAKE3 digest of `data`; the key of a raw blob.
pub fn content_hash(data: impl AsRef<[u8]>) -> String {
    blake3::hash(data.as_ref()).to_hex().to_string()
}

/// Whether `hash` has the shape of a key produced by [`content_hash`].
pub fn is_content_hash(hash: &str) -> bool {
    hash.len() == HASH_HEX_LEN && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Write-once blob store keyed by the BLAKE3 hash of each blob's content.
///
/// Blobs are sharded into directories by the first two hex characters of
/// their hash (`ab/abcdef…`). Identical bytes always land at the identical
/// key, so saving is idempotent: the blob is written only the first time
/// its hash is seen. Two concurrent saves of the same bytes may both write,
/// which is harmless because the backend replaces files atomically and the
/// bytes are identical.
#[derive(Clone)]
pub struct RawStore {
    backend: BackendHandle,
}
impl RawStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    fn blob_path(hash: &str) -> PathBuf {
        PathBuf::from(&hash[..2]).join(hash)
    }

    /// Store `data` and return its content hash.
    #[instrument(skip_all, fields(backend = self.backend.name(), bytes = data.as_ref().len()))]
    pub async fn save(&self, data: impl AsRef<[u8]>) -> Result<String> {
        let data = data.as_ref();
        let hash = content_hash(data);
        let path = Self::blob_path(&hash);
        if self.backend.exists(&path).await? {
            tracing::debug!(%hash, "Raw blob already stored");
            return Ok(hash);
        }
        self.backend.write(&path, data).await?;
        tracing::debug!(%hash, "Stored raw blob");
        Ok(hash)
    }

    /// Fetch the blob stored under `hash`.
    ///
    /// A hash that was never saved (including strings that aren't hashes at
    /// all) is `Ok(None)`; only operational failures are errors.
    pub async fn get(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        if !is_content_hash(hash) {
            return Ok(None);
        }
        match self.backend.read(&Self::blob_path(hash)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, hash: &str) -> Result<bool> {
        if !is_content_hash(hash) {
            return Ok(false);
        }
        self.backend.exists(&Self::blob_path(hash)).await
    }
}
