//! SQLite processing state for mergebot.
//!
//! The repository is the single writer of truth for three kinds of rows:
//! - **Seen files**: one row per ingested payload, tracking its processing
//!   lifecycle (`pending` to `processed` or `failed`). Identified by
//!   `(source_id, external_id)` and pointing at a raw blob by content hash.
//! - **Records**: parsed, deduplicated units extracted from raw blobs. The
//!   `unique_hash` of a record is unique across the whole table, so
//!   re-ingesting a payload never produces a duplicate record.
//! - **Publish state**: the last successfully published artifact hash per
//!   tracking key. Only ever advanced after a publish that reached at least
//!   one destination.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{
    FileStatus, NewRecord, NewSeenFile, PublishState, Record, RecordStats, Registration, SeenFile, StatusCounts,
};
pub use crate::repo::Repository;
