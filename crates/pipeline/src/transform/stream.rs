use super::{FileOutcome, TransformPipeline};
use crate::MAX_PROCESS_CONCURRENCY;
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::HashSet;

/// Progress events emitted by [`TransformPipeline::stream`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of distinct raw blobs waiting to be processed.
/// 3. [`Processed`](Self::Processed): zero or more times, one per blob.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// Failing to list pending files terminates the stream with an error, in
/// which case [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum TransformEvent {
    Started,
    DiscoveryComplete(u64),
    Processed(FileOutcome),
    Complete,
}

impl TransformPipeline {
    /// Streams a [`TransformEvent`] for every pending file.
    ///
    /// Seen files that point at the same raw blob are processed once; the
    /// status update reaches all of them. Blobs are processed concurrently, up
    /// to `MAX_PROCESS_CONCURRENCY` at a time, and their order of completion
    /// is not significant.
    pub fn stream(&self) -> impl Stream<Item = Result<TransformEvent>> + '_ {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(TransformEvent::Started);

            let pending = match self.repo.list_pending().await.or_raise(|| ErrorKind::State) {
                Ok(files) => files,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            let mut seen = HashSet::new();
            let files: Vec<_> = pending.into_iter().filter(|file| seen.insert(file.raw_hash.clone())).collect();
            // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
            yield Ok(TransformEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));

            let mut queue = files.into_iter().map(|file| self.transform_file(file));
            let mut processing: FuturesUnordered<_> = queue.by_ref().take(MAX_PROCESS_CONCURRENCY).collect();
            while let Some(outcome) = processing.next().await {
                yield Ok(TransformEvent::Processed(outcome));
                if let Some(next) = queue.next() {
                    processing.push(next);
                }
            }

            yield Ok(TransformEvent::Complete);
        })
    }
}
