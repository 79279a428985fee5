use crate::error::Result;

/// Where a payload came from, for handlers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext<'a> {
    pub filename: &'a str,
    pub source_id: &'a str,
}

/// One unit extracted from a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Deduplication key. Handlers namespace it by format (see [`record_hash`]),
    /// so equal bytes parsed by two formats never collide.
    pub unique_hash: String,
    pub data: Vec<u8>,
}
impl ParsedRecord {
    pub fn new(format: &str, key: impl AsRef<[u8]>, data: impl Into<Vec<u8>>) -> Self {
        Self { unique_hash: record_hash(format, key), data: data.into() }
    }
}

/// BLAKE3 of `format`, a NUL separator, then `key`.
pub fn record_hash(format: &str, key: impl AsRef<[u8]>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(format.as_bytes());
    hasher.update(&[0]);
    hasher.update(key.as_ref());
    hasher.finalize().to_hex().to_string()
}

/// A payload format the pipeline knows how to detect, parse and reassemble.
///
/// Handlers are registered with a [`FormatRegistry`](crate::FormatRegistry)
/// and selected by [`id`](Self::id). Nothing outside the handler special-cases
/// a format.
pub trait FormatHandler: Send + Sync {
    /// Stable identifier, stored as the record type.
    fn id(&self) -> &'static str;

    /// Lowercase filename extensions (without the dot) that identify this
    /// format outright.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether the content looks like this format. Only consulted when no
    /// handler claimed the filename's extension.
    fn sniff(&self, data: &[u8]) -> bool;

    /// Extract records. An `Err` marks the payload as failed.
    fn parse(&self, data: &[u8], context: &ParseContext<'_>) -> Result<Vec<ParsedRecord>>;

    /// Extension of an assembled artifact.
    fn artifact_extension(&self) -> &'static str;

    /// Combine record payloads, already in their final order, into artifact
    /// bytes. Defaults to one record per line, which only suits line-based
    /// formats.
    fn assemble(&self, records: &[&[u8]]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(records.iter().map(|r| r.len() + 1).sum());
        for record in records {
            out.extend_from_slice(record);
            if !record.ends_with(b"\n") {
                out.push(b'\n');
            }
        }
        Ok(out)
    }
}
