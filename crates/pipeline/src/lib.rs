//! The transform and publish pipelines of mergebot.
//!
//! 1. [`TransformPipeline`] drains pending ingested files into deduplicated
//!    records.
//! 2. [`ArtifactBuilder`] assembles a route's records of one format into an
//!    [`Artifact`].
//! 3. [`PublishPipeline`] archives changed artifacts and fans them out to the
//!    route's destinations, advancing the watermark only when something got
//!    through.
//!
//! The pipelines hold no state of their own between runs. Everything durable
//! lives in the raw store, the artifact store and the repository. At most one
//! pipeline instance may mutate a given file or tracking key at a time.

mod build;
pub mod error;
pub mod publish;
pub mod publisher;
pub mod transform;

pub use crate::build::{Artifact, ArtifactBuilder, route_sources};
pub use crate::publish::{PublishPipeline, PublishReport, PublishSession};
pub use crate::transform::{TransformPipeline, TransformReport};

/// Files transformed concurrently within one batch.
pub const MAX_PROCESS_CONCURRENCY: usize = 16;
