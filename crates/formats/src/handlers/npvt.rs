use crate::bundle::{BUNDLE_EXTENSION, zip_bundle};
use crate::error::{ErrorKind, Result};
use crate::handler::{FormatHandler, ParseContext, ParsedRecord};

/// NapsternetV exports. Opaque: the whole payload is one record, recognised
/// by filename only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NpvtHandler;

impl NpvtHandler {
    pub const ID: &'static str = "npvt";
}

impl FormatHandler for NpvtHandler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npvt"]
    }

    fn sniff(&self, _data: &[u8]) -> bool {
        false
    }

    fn parse(&self, data: &[u8], _context: &ParseContext<'_>) -> Result<Vec<ParsedRecord>> {
        if data.iter().all(u8::is_ascii_whitespace) {
            exn::bail!(ErrorKind::NoRecords(Self::ID));
        }
        Ok(vec![ParsedRecord::new(Self::ID, data, data)])
    }

    fn artifact_extension(&self) -> &'static str {
        BUNDLE_EXTENSION
    }

    fn assemble(&self, records: &[&[u8]]) -> Result<Vec<u8>> {
        zip_bundle(Self::ID, "npvt", records)
    }
}
