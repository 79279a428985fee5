//! Blob storage for mergebot.
//!
//! Two stores sit on top of a pluggable [`StorageBackend`]:
//! - [`RawStore`]: write-once, content-addressed storage for ingested payloads.
//!   The key of a blob is the BLAKE3 hex digest of its bytes.
//! - [`ArtifactStore`]: durable archive of every built artifact that was
//!   considered for publishing, addressed by `(route, format, hash)`.

mod artifact;
pub mod backend;
pub mod error;
pub mod file;
mod path;
mod raw;

pub use crate::artifact::{ArtifactEntry, ArtifactStore};
pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
pub use crate::raw::{RawStore, content_hash, is_content_hash};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
