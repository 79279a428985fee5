//! Zip bundles for formats whose records can't be concatenated.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Extension of a bundled artifact.
pub const BUNDLE_EXTENSION: &str = "zip";

/// Pack each record into its own entry, named `{format}_{n:03}.{extension}`
/// in record order.
///
/// Entry timestamps are pinned, so the same records always give the same
/// bytes and the artifact hash only changes when the records do.
pub fn zip_bundle(format: &'static str, extension: &str, records: &[&[u8]]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (index, record) in records.iter().enumerate() {
        writer
            .start_file(format!("{format}_{:03}.{extension}", index + 1), options)
            .or_raise(|| ErrorKind::Assembly(format))?;
        writer.write_all(record).or_raise(|| ErrorKind::Assembly(format))?;
    }
    let cursor = writer.finish().or_raise(|| ErrorKind::Assembly(format))?;
    Ok(cursor.into_inner())
}
