use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::OffsetDateTime;

/// Watermark of the last successful publish under a tracking key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishState {
    pub tracking_key: String,
    pub last_published_hash: String,
    pub published_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PublishRow {
    tracking_key: String,
    last_published_hash: String,
    published_at: i64,
}
impl TryFrom<PublishRow> for PublishState {
    type Error = Error;
    fn try_from(row: PublishRow) -> Result<Self, Self::Error> {
        Ok(Self {
            tracking_key: row.tracking_key,
            last_published_hash: row.last_published_hash,
            published_at: OffsetDateTime::from_unix_timestamp(row.published_at)
                .or_raise(|| ErrorKind::InvalidData("publish date"))?,
        })
    }
}
