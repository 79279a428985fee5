use super::TransformPipeline;
use mergebot_formats::ParseContext;
use mergebot_state::{FileStatus, NewRecord, RecordStats, SeenFile};
use std::ops::Deref;
use tracing::instrument;

/// Why a file ended up `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The raw blob is gone. Only re-ingestion can fix this.
    MissingRawData,
    /// The raw blob exists but could not be read.
    StorageFailure(String),
    /// No handler recognized the payload, or the handler rejected it.
    ParseFailure(String),
    /// The records could not be written; none of them were kept.
    PersistenceFailure(String),
}
impl FailureReason {
    /// Text stored as the file's `error_message`.
    pub fn message(&self) -> String {
        match self {
            Self::MissingRawData => "Raw data missing".to_string(),
            Self::StorageFailure(detail) => format!("Raw data unreadable: {detail}"),
            Self::ParseFailure(detail) => detail.clone(),
            Self::PersistenceFailure(detail) => format!("Could not store records: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Processed { format: &'static str, stats: RecordStats },
    Failed(FailureReason),
    /// Processing failed and so did recording the failure. The file is still
    /// `pending` and will be picked up again by the next run.
    Unrecorded(FailureReason),
}

/// What happened to one pending file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub raw_hash: String,
    pub source_id: String,
    pub filename: String,
    pub result: FileResult,
}

impl TransformPipeline {
    /// Process a single pending file. Never fails: every problem is folded
    /// into the returned [`FileOutcome`].
    #[instrument(skip_all, fields(raw_hash = %file.raw_hash, filename = %file.filename))]
    pub(crate) async fn transform_file(&self, file: SeenFile) -> FileOutcome {
        let result = match self.parse_and_store(&file).await {
            Ok((format, stats)) => {
                tracing::debug!(format, inserted = stats.inserted, duplicates = stats.duplicates, "Processed file");
                FileResult::Processed { format, stats }
            },
            Err(reason) => self.record_failure(&file.raw_hash, reason).await,
        };
        FileOutcome { raw_hash: file.raw_hash, source_id: file.source_id, filename: file.filename, result }
    }

    async fn parse_and_store(&self, file: &SeenFile) -> Result<(&'static str, RecordStats), FailureReason> {
        let data = match self.raw.get(&file.raw_hash).await {
            Ok(Some(data)) => data,
            Ok(None) => return Err(FailureReason::MissingRawData),
            Err(e) => return Err(FailureReason::StorageFailure(e.deref().to_string())),
        };

        let parse = || -> mergebot_formats::error::Result<_> {
            let format = self.registry.decide_format(&file.filename, &data)?;
            let context = ParseContext { filename: &file.filename, source_id: &file.source_id };
            let records = self.registry.get(format)?.parse(&data, &context)?;
            Ok((format, records))
        };
        let (format, records) = parse().map_err(|e| FailureReason::ParseFailure(e.deref().to_string()))?;

        let records: Vec<NewRecord> = records.into_iter().map(|r| NewRecord::new(r.unique_hash, r.data)).collect();
        let stats = self
            .repo
            .record_processed(&file.raw_hash, format, &records)
            .await
            .map_err(|e| FailureReason::PersistenceFailure(e.deref().to_string()))?;
        Ok((format, stats))
    }

    async fn record_failure(&self, raw_hash: &str, reason: FailureReason) -> FileResult {
        let message = reason.message();
        match self.repo.update_file_status(raw_hash, FileStatus::Failed, Some(&message)).await {
            Ok(_) => {
                tracing::warn!(reason = %message, "File failed");
                FileResult::Failed(reason)
            },
            Err(e) => {
                tracing::error!(reason = %message, error = ?e, "File failed and the failure could not be recorded");
                FileResult::Unrecorded(reason)
            },
        }
    }
}
