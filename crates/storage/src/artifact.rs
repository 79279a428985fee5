//! Durable archive of built artifacts.

use crate::BackendHandle;
use crate::error::{ErrorKind, Result};
use crate::raw::is_content_hash;
use futures::TryStreamExt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

const LATEST_DIR: &str = "latest";
const ARCHIVE_EXTENSION: &str = "bin";

/// One archived artifact, as found by [`ArtifactStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub route: String,
    pub format: String,
    pub hash: String,
    pub size: u64,
    pub stored_at: OffsetDateTime,
}

/// Archive of every artifact that was considered for publishing.
///
/// Layout relative to the backend root:
///
/// ```text
/// {route}/{format}/{hash}.bin             archive, one file per distinct build
/// latest/{route}/{route}_{format}.{ext}   most recent build, replaced in place
/// ```
#[derive(Clone)]
pub struct ArtifactStore {
    backend: BackendHandle,
}

/// Route and format names become single path segments.
fn check_segment(segment: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if !valid {
        exn::bail!(ErrorKind::InvalidKey(segment.to_string()));
    }
    Ok(())
}

fn check_route(route: &str) -> Result<()> {
    check_segment(route)?;
    if route == LATEST_DIR {
        exn::bail!(ErrorKind::InvalidKey(route.to_string()));
    }
    Ok(())
}

fn check_hash(hash: &str) -> Result<()> {
    if !is_content_hash(hash) {
        exn::bail!(ErrorKind::InvalidKey(hash.to_string()));
    }
    Ok(())
}

impl ArtifactStore {
    pub fn new(backend: BackendHandle) -> Self {
        Self { backend }
    }

    fn archive_path(route: &str, format: &str, hash: &str) -> PathBuf {
        Path::new(route).join(format).join(format!("{hash}.{ARCHIVE_EXTENSION}"))
    }

    fn latest_path(route: &str, format: &str, extension: &str) -> PathBuf {
        Path::new(LATEST_DIR).join(route).join(format!("{route}_{format}.{extension}"))
    }

    /// Archive `data` under `(route, format, hash)` and refresh the latest copy.
    ///
    /// The archive entry is written before the latest copy, so the latest copy
    /// always has an archived counterpart. Returns the archive path.
    #[instrument(skip(self, data), fields(backend = self.backend.name(), bytes = data.len()))]
    pub async fn save(&self, route: &str, format: &str, hash: &str, extension: &str, data: &[u8]) -> Result<PathBuf> {
        check_route(route)?;
        check_segment(format)?;
        check_segment(extension)?;
        check_hash(hash)?;

        let archive = Self::archive_path(route, format, hash);
        if !self.backend.exists(&archive).await? {
            self.backend.write(&archive, data).await?;
        }
        self.backend.write(&Self::latest_path(route, format, extension), data).await?;
        tracing::debug!(path = %archive.display(), "Archived artifact");
        Ok(archive)
    }

    pub async fn get(&self, route: &str, format: &str, hash: &str) -> Result<Option<Vec<u8>>> {
        check_route(route)?;
        check_segment(format)?;
        check_hash(hash)?;
        match self.backend.read(&Self::archive_path(route, format, hash)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if matches!(e.deref(), ErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, route: &str, format: &str, hash: &str) -> Result<bool> {
        check_route(route)?;
        check_segment(format)?;
        check_hash(hash)?;
        self.backend.exists(&Self::archive_path(route, format, hash)).await
    }

    /// Every archived artifact of `route`, oldest first.
    pub async fn list(&self, route: &str) -> Result<Vec<ArtifactEntry>> {
        check_route(route)?;
        let prefix = PathBuf::from(route);
        let mut entries: Vec<ArtifactEntry> = self
            .backend
            .list_stream(Some(prefix.as_path()))
            .try_filter_map(|file| async move {
                let mut components = file.path.iter().map(|c| c.to_str());
                let (Some(Some(r)), Some(Some(format)), Some(Some(name)), None) =
                    (components.next(), components.next(), components.next(), components.next())
                else {
                    return Ok(None);
                };
                let Some(hash) = name.strip_suffix(".bin").filter(|h| is_content_hash(h)) else {
                    return Ok(None);
                };
                Ok(Some(ArtifactEntry {
                    route: r.to_string(),
                    format: format.to_string(),
                    hash: hash.to_string(),
                    size: file.size,
                    stored_at: file.modified,
                }))
            })
            .try_collect()
            .await?;
        entries.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then_with(|| a.hash.cmp(&b.hash)));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{LocalBackend, MockBackend, StorageBackend};
    use crate::content_hash;
    use rstest::rstest;
    use std::sync::Arc;

    fn store() -> (Arc<MockBackend>, ArtifactStore) {
        let backend = Arc::new(MockBackend::default());
        (backend.clone(), ArtifactStore::new(backend))
    }

    #[tokio::test]
    async fn test_save_archives_and_updates_latest() {
        let (backend, store) = store();
        let hash = content_hash(b"vmess://a");
        let path = store.save("free", "uri", &hash, "txt", b"vmess://a").await.unwrap();
        assert_eq!(path, PathBuf::from(format!("free/uri/{hash}.bin")));
        assert_eq!(store.get("free", "uri", &hash).await.unwrap().as_deref(), Some(b"vmess://a".as_slice()));
        assert_eq!(backend.read(Path::new("latest/free/free_uri.txt")).await.unwrap(), b"vmess://a");

        let newer = content_hash(b"vmess://b");
        store.save("free", "uri", &newer, "txt", b"vmess://b").await.unwrap();
        assert!(store.exists("free", "uri", &hash).await.unwrap());
        assert_eq!(backend.read(Path::new("latest/free/free_uri.txt")).await.unwrap(), b"vmess://b");
    }

    #[tokio::test]
    async fn test_resave_does_not_rewrite_archive() {
        let (backend, store) = store();
        let hash = content_hash(b"data");
        store.save("r", "ovpn", &hash, "ovpn", b"data").await.unwrap();
        store.save("r", "ovpn", &hash, "ovpn", b"data").await.unwrap();
        // One archive write, two latest writes.
        assert_eq!(backend.write_count(), 3);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (_, store) = store();
        assert_eq!(store.get("r", "uri", &content_hash(b"nothing")).await.unwrap(), None);
    }

    #[rstest]
    #[case("../escape", "uri")]
    #[case("latest", "uri")]
    #[case("", "uri")]
    #[case("a/b", "uri")]
    #[case("route", "..")]
    #[case("route", "u ri")]
    #[tokio::test]
    async fn test_invalid_keys(#[case] route: &str, #[case] format: &str) {
        let (_, store) = store();
        let err = store.save(route, format, &content_hash(b"x"), "txt", b"x").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_invalid_hash() {
        let (_, store) = store();
        let err = store.save("r", "uri", "deadbeef", "txt", b"x").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_list_only_sees_own_route() {
        let (_, store) = store();
        let one = content_hash(b"1");
        let two = content_hash(b"2");
        store.save("alpha", "uri", &one, "txt", b"1").await.unwrap();
        store.save("alpha", "ovpn", &two, "ovpn", b"2").await.unwrap();
        store.save("beta", "uri", &one, "txt", b"1").await.unwrap();

        let mut listed: Vec<(String, String)> =
            store.list("alpha").await.unwrap().into_iter().map(|e| (e.format, e.hash)).collect();
        listed.sort();
        assert_eq!(listed, vec![("ovpn".to_string(), two), ("uri".to_string(), one)]);
    }

    #[tokio::test]
    async fn test_local_list() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(Arc::new(LocalBackend::new("artifacts", temp_dir.path()).unwrap()));
        let hash = content_hash(b"profile");
        store.save("vpn", "ovpn", &hash, "ovpn", b"profile").await.unwrap();
        let entries = store.list("vpn").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 7);
        assert!(temp_dir.path().join("latest/vpn/vpn_ovpn.ovpn").is_file());
    }
}
