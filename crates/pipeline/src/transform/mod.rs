//! Draining pending files into deduplicated records.
//!
//! Every seen file still `pending` is resolved against the raw store,
//! routed to a format handler and parsed. Its records and its status flip are
//! written in one transaction. A file that can't be processed is marked
//! `failed` with the reason; it never stops the rest of the batch.
//!
//! The primary entry point is [`TransformPipeline::stream`], which yields a
//! [`TransformEvent`] per file as it completes. [`TransformPipeline::run`]
//! collects the same events into a [`TransformReport`].

mod file;
mod report;
mod stream;

pub use self::file::{FailureReason, FileOutcome, FileResult};
pub use self::report::TransformReport;
pub use self::stream::TransformEvent;
use mergebot_formats::FormatRegistry;
use mergebot_state::Repository;
use mergebot_storage::RawStore;

/// Stateless orchestrator over the raw store, the repository and the format
/// registry.
#[derive(Clone)]
pub struct TransformPipeline {
    raw: RawStore,
    repo: Repository,
    registry: FormatRegistry,
}

impl TransformPipeline {
    pub fn new(raw: RawStore, repo: Repository, registry: FormatRegistry) -> Self {
        Self { raw, repo, registry }
    }
}
