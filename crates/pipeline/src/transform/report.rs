use super::{FileOutcome, FileResult, TransformEvent, TransformPipeline};
use crate::error::Result;
use futures::TryStreamExt;
use tracing::instrument;

/// Summary of one transform batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Distinct raw blobs that were pending at the start of the batch.
    pub discovered: u64,
    pub outcomes: Vec<FileOutcome>,
}

impl TransformReport {
    pub fn processed(&self) -> usize {
        self.count(|r| matches!(r, FileResult::Processed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, FileResult::Failed(_)))
    }

    /// Files that failed but are still `pending`.
    pub fn unrecorded(&self) -> usize {
        self.count(|r| matches!(r, FileResult::Unrecorded(_)))
    }

    pub fn records_inserted(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                FileResult::Processed { stats, .. } => stats.inserted,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&FileResult) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.result)).count()
    }
}

impl TransformPipeline {
    /// Process every pending file and collect the outcomes.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<TransformReport> {
        let report = self
            .stream()
            .try_fold(TransformReport::default(), |mut report, event| async move {
                match event {
                    TransformEvent::DiscoveryComplete(total) => report.discovered = total,
                    TransformEvent::Processed(outcome) => report.outcomes.push(outcome),
                    TransformEvent::Started | TransformEvent::Complete => {},
                }
                Ok(report)
            })
            .await?;
        tracing::info!(
            discovered = report.discovered,
            processed = report.processed(),
            failed = report.failed(),
            unrecorded = report.unrecorded(),
            records = report.records_inserted(),
            "Transform complete"
        );
        Ok(report)
    }
}
