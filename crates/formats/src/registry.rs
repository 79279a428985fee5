use crate::error::{ErrorKind, Result};
use crate::handler::FormatHandler;
use crate::handlers::{NpvtHandler, OvpnHandler, UriHandler};
use exn::OptionExt;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Ordered set of format handlers, keyed by [`FormatHandler::id`].
///
/// Registration order matters: it breaks ties when more than one handler
/// claims a payload.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    handlers: Vec<Arc<dyn FormatHandler>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler: `ovpn`, `uri`, `npvt`.
    pub fn with_defaults() -> Self {
        let handlers: Vec<Arc<dyn FormatHandler>> =
            vec![Arc::new(OvpnHandler), Arc::new(UriHandler), Arc::new(NpvtHandler)];
        Self { handlers }
    }

    pub fn register(&mut self, handler: impl FormatHandler + 'static) -> Result<()> {
        if self.handlers.iter().any(|h| h.id() == handler.id()) {
            exn::bail!(ErrorKind::DuplicateFormat(handler.id().to_string()));
        }
        self.handlers.push(Arc::new(handler));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn FormatHandler>> {
        self.handlers
            .iter()
            .find(|h| h.id() == id)
            .cloned()
            .ok_or_raise(|| ErrorKind::UnregisteredFormat(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.iter().any(|h| h.id() == id)
    }

    /// Registered format ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.iter().map(|h| h.id())
    }

    /// Decide which format a payload is in.
    ///
    /// The filename's extension is checked against every handler first; only
    /// if none claims it is the content sniffed, again in registration order.
    /// A payload nobody recognizes is [`UnknownFormat`](ErrorKind::UnknownFormat)
    /// rather than a guess.
    #[instrument(level = "debug", skip(self, data), fields(bytes = data.len()))]
    pub fn decide_format(&self, filename: &str, data: &[u8]) -> Result<&'static str> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if let Some(extension) = extension.as_deref()
            && let Some(handler) = self.handlers.iter().find(|h| h.extensions().contains(&extension))
        {
            return Ok(handler.id());
        }
        self.handlers
            .iter()
            .find(|h| h.sniff(data))
            .map(|h| h.id())
            .ok_or_raise(|| ErrorKind::UnknownFormat(filename.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{ParseContext, ParsedRecord};
    use rstest::rstest;

    const PROFILE: &[u8] = b"client\nremote vpn.example.com 1194\n";

    #[rstest]
    #[case("server.ovpn", b"".as_slice(), "ovpn")]
    #[case("SERVER.OVPN", b"".as_slice(), "ovpn")]
    #[case("links.txt", b"".as_slice(), "uri")]
    #[case("links.uri", b"".as_slice(), "uri")]
    #[case("export.npvt", b"".as_slice(), "npvt")]
    // Extension beats content.
    #[case("notes.txt", PROFILE, "uri")]
    #[case("download", PROFILE, "ovpn")]
    #[case("download.bin", b"vless://a@h:1\n".as_slice(), "uri")]
    #[case("unknown", b"vmess://x\n".as_slice(), "uri")]
    fn test_decide_format(#[case] filename: &str, #[case] data: &[u8], #[case] expected: &str) {
        assert_eq!(FormatRegistry::with_defaults().decide_format(filename, data).unwrap(), expected);
    }

    #[rstest]
    #[case("unknown", b"hello world".as_slice())]
    #[case("image.png", b"\x89PNG".as_slice())]
    #[case("", b"".as_slice())]
    fn test_unrecognized(#[case] filename: &str, #[case] data: &[u8]) {
        let err = FormatRegistry::with_defaults().decide_format(filename, data).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownFormat(_)));
    }

    #[test]
    fn test_default_order() {
        let ids: Vec<_> = FormatRegistry::with_defaults().ids().collect();
        assert_eq!(ids, ["ovpn", "uri", "npvt"]);
    }

    struct Shouty;
    impl FormatHandler for Shouty {
        fn id(&self) -> &'static str {
            "shout"
        }
        fn extensions(&self) -> &'static [&'static str] {
            &["txt"]
        }
        fn sniff(&self, data: &[u8]) -> bool {
            data.starts_with(b"HEY")
        }
        fn parse(&self, data: &[u8], _context: &ParseContext<'_>) -> Result<Vec<ParsedRecord>> {
            Ok(vec![ParsedRecord::new("shout", data, data.to_ascii_uppercase())])
        }
        fn artifact_extension(&self) -> &'static str {
            "txt"
        }
    }

    #[test]
    fn test_custom_handler_plugs_in() {
        let mut registry = FormatRegistry::new();
        registry.register(Shouty).unwrap();
        assert_eq!(registry.decide_format("x", b"HEY you").unwrap(), "shout");
        let handler = registry.get("shout").unwrap();
        let records = handler.parse(b"hey", &ParseContext { filename: "x", source_id: "s" }).unwrap();
        assert_eq!(handler.assemble(&[records[0].data.as_slice(), b"B\n".as_slice()]).unwrap(), b"HEY\nB\n");
    }

    #[test]
    fn test_first_registration_wins_shared_extension() {
        let mut registry = FormatRegistry::with_defaults();
        registry.register(Shouty).unwrap();
        assert_eq!(registry.decide_format("a.txt", b"HEY").unwrap(), "uri");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = FormatRegistry::with_defaults();
        let err = registry.register(UriHandler).unwrap_err();
        assert_eq!(*err, ErrorKind::DuplicateFormat("uri".to_string()));
    }

    #[test]
    fn test_get_unregistered() {
        let registry = FormatRegistry::with_defaults();
        assert!(registry.contains("npvt"));
        assert!(matches!(&*registry.get("csv").err().unwrap(), ErrorKind::UnregisteredFormat(_)));
    }
}
