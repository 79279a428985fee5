//! Repository over seen files, records and publish watermarks.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{
    FileStatus, NewRecord, NewSeenFile, PublishRow, PublishState, Record, RecordRow, RecordStats, Registration,
    SeenFile, SeenFileRow, StatusCounts,
};
use exn::ResultExt;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;
use tracing::instrument;

/// Repository for every row the pipelines read and write.
///
/// Each method is atomic on its own. [`record_processed`](Self::record_processed)
/// is the per-file transaction boundary: a file's records and its status flip
/// become visible together or not at all.
///
/// # Relationships
///
/// - Many seen files can point at the same raw hash (the same bytes ingested
///   from several sources or messages). Status updates address a raw hash and
///   apply to every pending row that points at it.
/// - A record is stored once, under the raw hash it was first parsed from.
///   Every payload it is parsed out of later is added to its origins, so it
///   belongs to the sources of all of them.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    // =========================================================================
    // Seen files
    // =========================================================================

    /// Start tracking an ingested payload as `pending`.
    ///
    /// Registering the same `(source_id, external_id)` twice leaves the first
    /// row untouched, whatever its status.
    #[instrument(skip_all, fields(source = %file.source_id, external_id = %file.external_id))]
    pub async fn register_file(&self, file: &NewSeenFile) -> Result<Registration> {
        let id: Option<i64> = sqlx::query_scalar(include_str!("../queries/register_file.sql"))
            .bind(&file.source_id)
            .bind(&file.external_id)
            .bind(&file.raw_hash)
            .bind(&file.filename)
            .bind(Self::now())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(match id {
            Some(id) => Registration::Inserted(id),
            None => Registration::AlreadySeen,
        })
    }

    /// Every seen file still waiting to be transformed, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<SeenFile>> {
        let rows: Vec<SeenFileRow> = sqlx::query_as(include_str!("../queries/list_pending.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(SeenFile::try_from).collect()
    }

    /// The oldest seen file pointing at `raw_hash`.
    pub async fn get_file(&self, raw_hash: impl AsRef<str>) -> Result<Option<SeenFile>> {
        let row: Option<SeenFileRow> = sqlx::query_as(include_str!("../queries/get_file.sql"))
            .bind(raw_hash.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(SeenFile::try_from).transpose()
    }

    /// Move every pending file pointing at `raw_hash` to a terminal status.
    ///
    /// Files that already left `pending` are not touched. Returns the number
    /// of rows that changed.
    #[instrument(skip(self, error_message))]
    pub async fn update_file_status(
        &self,
        raw_hash: &str,
        status: FileStatus,
        error_message: Option<&str>,
    ) -> Result<u64> {
        if !status.is_terminal() {
            exn::bail!(ErrorKind::InvalidTransition(status.to_string()));
        }
        let result = sqlx::query(include_str!("../queries/update_file_status.sql"))
            .bind(status.as_str())
            .bind(error_message)
            .bind(raw_hash)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    /// Put failed files pointing at `raw_hash` back into `pending`.
    ///
    /// Operator action only. Returns the number of rows requeued.
    #[instrument(skip(self))]
    pub async fn requeue_failed(&self, raw_hash: &str) -> Result<u64> {
        let result = sqlx::query(include_str!("../queries/requeue_failed.sql"))
            .bind(raw_hash)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    pub async fn count_by_status(&self) -> Result<StatusCounts> {
        let rows: Vec<(String, i64)> = sqlx::query_as(include_str!("../queries/count_by_status.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut counts = StatusCounts::default();
        for (status, total) in rows {
            let total = u64::try_from(total).or_raise(|| ErrorKind::InvalidData("status count"))?;
            match status.parse::<FileStatus>()? {
                FileStatus::Pending => counts.pending = total,
                FileStatus::Processed => counts.processed = total,
                FileStatus::Failed => counts.failed = total,
            }
        }
        Ok(counts)
    }

    // =========================================================================
    // Records
    // =========================================================================

    async fn insert_record(
        tx: &mut Transaction<'_, Sqlite>,
        raw_hash: &str,
        record_type: &str,
        record: &NewRecord,
        now: i64,
    ) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/add_record.sql"))
            .bind(raw_hash)
            .bind(record_type)
            .bind(&record.unique_hash)
            .bind(&record.data)
            .bind(now)
            .execute(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/add_record_origin.sql"))
            .bind(&record.unique_hash)
            .bind(raw_hash)
            .execute(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a single record, ignoring it if its `unique_hash` is already known.
    ///
    /// Either way `raw_hash` is remembered as one of the record's origins.
    /// Returns `true` if the record was new.
    pub async fn add_record(&self, raw_hash: &str, record_type: &str, unique_hash: &str, data: &[u8]) -> Result<bool> {
        let record = NewRecord::new(unique_hash, data);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let inserted = Self::insert_record(&mut tx, raw_hash, record_type, &record, Self::now()).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(inserted)
    }

    /// Store every record parsed from `raw_hash` and mark its files processed.
    ///
    /// All of it happens in one transaction: after a crash either all of the
    /// file's new records exist and the file is `processed`, or none of them
    /// exist and the file is still `pending`.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn record_processed(
        &self,
        raw_hash: &str,
        record_type: &str,
        records: &[NewRecord],
    ) -> Result<RecordStats> {
        let now = Self::now();
        let mut stats = RecordStats::default();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for record in records {
            match Self::insert_record(&mut tx, raw_hash, record_type, record, now).await? {
                true => stats.inserted += 1,
                false => stats.duplicates += 1,
            }
        }
        sqlx::query(include_str!("../queries/update_file_status.sql"))
            .bind(FileStatus::Processed.as_str())
            .bind(None::<&str>)
            .bind(raw_hash)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(stats)
    }

    /// Records of one type parsed from a payload of any of the given sources,
    /// ordered by `unique_hash`.
    pub async fn list_records(&self, record_type: &str, source_ids: &[String]) -> Result<Vec<Record>> {
        if source_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sources = serde_json::to_string(source_ids).or_raise(|| ErrorKind::InvalidData("source ids"))?;
        let rows: Vec<RecordRow> = sqlx::query_as(include_str!("../queries/list_records.sql"))
            .bind(record_type)
            .bind(sources)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Record::try_from).collect()
    }

    // =========================================================================
    // Publish state
    // =========================================================================

    pub async fn get_publish_state(&self, tracking_key: &str) -> Result<Option<PublishState>> {
        let row: Option<PublishRow> = sqlx::query_as(include_str!("../queries/get_publish_state.sql"))
            .bind(tracking_key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PublishState::try_from).transpose()
    }

    pub async fn get_last_published_hash(&self, tracking_key: &str) -> Result<Option<String>> {
        Ok(self.get_publish_state(tracking_key).await?.map(|state| state.last_published_hash))
    }

    /// Advance the watermark of `tracking_key` to `hash`.
    #[instrument(skip(self))]
    pub async fn mark_published(&self, tracking_key: &str, hash: &str) -> Result<()> {
        sqlx::query(include_str!("../queries/mark_published.sql"))
            .bind(tracking_key)
            .bind(hash)
            .bind(Self::now())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
