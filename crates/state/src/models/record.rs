use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::OffsetDateTime;

/// A parsed record on its way into the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Deduplication key, unique across every record of every type.
    pub unique_hash: String,
    pub data: Vec<u8>,
}
impl NewRecord {
    pub fn new(unique_hash: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self { unique_hash: unique_hash.into(), data: data.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Content hash of the raw blob this record was first parsed from.
    pub raw_hash: String,
    pub record_type: String,
    pub unique_hash: String,
    pub data: Vec<u8>,
    pub created_at: OffsetDateTime,
}

/// How many records of a batch were new.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    pub inserted: usize,
    /// Records whose `unique_hash` was already stored.
    pub duplicates: usize,
}

#[derive(sqlx::FromRow)]
pub(crate) struct RecordRow {
    raw_hash: String,
    record_type: String,
    unique_hash: String,
    data: Vec<u8>,
    created_at: i64,
}
impl TryFrom<RecordRow> for Record {
    type Error = Error;
    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            raw_hash: row.raw_hash,
            record_type: row.record_type,
            unique_hash: row.unique_hash,
            data: row.data,
            created_at: OffsetDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("record creation date"))?,
        })
    }
}
