mod file;
mod publish;
mod record;

pub use self::file::{FileStatus, NewSeenFile, Registration, SeenFile, StatusCounts};
pub(crate) use self::file::SeenFileRow;
pub use self::publish::PublishState;
pub(crate) use self::publish::PublishRow;
pub use self::record::{NewRecord, Record, RecordStats};
pub(crate) use self::record::RecordRow;
