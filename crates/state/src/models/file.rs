use crate::error::{Error, ErrorKind};
use derive_more::Display;
use exn::ResultExt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Processing lifecycle of a seen file.
///
/// `Pending` moves to exactly one of the two terminal states. The only way
/// back is an explicit [`requeue_failed`](crate::Repository::requeue_failed).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    #[display("pending")]
    Pending,
    #[display("processed")]
    Processed,
    #[display("failed")]
    Failed,
}
impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
impl FromStr for FileStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processed" => Ok(Self::Processed),
            "failed" => Ok(Self::Failed),
            _ => exn::bail!(ErrorKind::InvalidData("file status")),
        }
    }
}

/// An ingested payload about to be tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSeenFile {
    pub source_id: String,
    /// Identifier of the payload within its source (message id, file name).
    pub external_id: String,
    pub raw_hash: String,
    pub filename: String,
}

/// Outcome of [`register_file`](crate::Repository::register_file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted(i64),
    /// `(source_id, external_id)` was registered before; nothing changed.
    AlreadySeen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenFile {
    pub id: i64,
    pub source_id: String,
    pub external_id: String,
    pub raw_hash: String,
    pub filename: String,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub discovered_at: OffsetDateTime,
}

/// Number of seen files in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub processed: u64,
    pub failed: u64,
}
impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.processed + self.failed
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeenFileRow {
    id: i64,
    source_id: String,
    external_id: String,
    raw_hash: String,
    filename: String,
    status: String,
    error_message: Option<String>,
    discovered_at: i64,
}
impl TryFrom<SeenFileRow> for SeenFile {
    type Error = Error;
    fn try_from(row: SeenFileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            source_id: row.source_id,
            external_id: row.external_id,
            raw_hash: row.raw_hash,
            filename: row.filename,
            status: row.status.parse()?,
            error_message: row.error_message,
            discovered_at: OffsetDateTime::from_unix_timestamp(row.discovered_at)
                .or_raise(|| ErrorKind::InvalidData("discovery date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FileStatus::Pending, "pending")]
    #[case(FileStatus::Processed, "processed")]
    #[case(FileStatus::Failed, "failed")]
    fn test_status_text(#[case] status: FileStatus, #[case] text: &str) {
        assert_eq!(status.as_str(), text);
        assert_eq!(status.to_string(), text);
        assert_eq!(text.parse::<FileStatus>().unwrap(), status);
    }

    #[test]
    fn test_unknown_status() {
        let err = "PENDING".parse::<FileStatus>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[test]
    fn test_row_to_model() {
        let discovery = OffsetDateTime::now_utc();
        let row = SeenFileRow {
            id: 7,
            source_id: "channel".to_string(),
            external_id: "42".to_string(),
            raw_hash: "692ed948ccd76c2230efe90175a519a3092b1862ab049704b7221738e56028ca".to_string(),
            filename: "configs.txt".to_string(),
            status: "failed".to_string(),
            error_message: Some("Raw data missing".to_string()),
            discovered_at: discovery.unix_timestamp(),
        };
        let model = SeenFile::try_from(row).unwrap();
        assert_eq!(model.status, FileStatus::Failed);
        // Unix timestamps are measured in seconds, so the nanoseconds are gone.
        assert_eq!(model.discovered_at, discovery.replace_nanosecond(0).unwrap());
    }
}
