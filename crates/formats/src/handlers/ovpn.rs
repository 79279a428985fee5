use crate::consts::{OVPN_CLIENT_REGEX, OVPN_REMOTE_REGEX};
use crate::bundle::{BUNDLE_EXTENSION, zip_bundle};
use crate::error::{ErrorKind, Result};
use crate::handler::{FormatHandler, ParseContext, ParsedRecord};
use exn::ResultExt;

/// OpenVPN client profiles. One profile per payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct OvpnHandler;

impl OvpnHandler {
    pub const ID: &'static str = "ovpn";

    /// The profile with comments, blank lines and trailing whitespace removed,
    /// so cosmetic edits don't produce a "new" profile.
    fn normalize(profile: &str) -> String {
        profile
            .lines()
            .map(str::trim_end)
            .filter(|line| {
                let trimmed = line.trim_start();
                !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with(';')
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FormatHandler for OvpnHandler {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ovpn"]
    }

    fn sniff(&self, data: &[u8]) -> bool {
        let text = String::from_utf8_lossy(data);
        OVPN_CLIENT_REGEX.is_match(&text) && OVPN_REMOTE_REGEX.is_match(&text)
    }

    fn parse(&self, data: &[u8], _context: &ParseContext<'_>) -> Result<Vec<ParsedRecord>> {
        let text = std::str::from_utf8(data)
            .or_raise(|| ErrorKind::Malformed { format: Self::ID, reason: "not valid UTF-8".to_string() })?;
        let normalized = Self::normalize(text);
        if !OVPN_REMOTE_REGEX.is_match(&normalized) {
            exn::bail!(ErrorKind::Malformed { format: Self::ID, reason: "no remote directive".to_string() });
        }
        Ok(vec![ParsedRecord::new(Self::ID, &normalized, data)])
    }

    fn artifact_extension(&self) -> &'static str {
        BUNDLE_EXTENSION
    }

    fn assemble(&self, records: &[&[u8]]) -> Result<Vec<u8>> {
        zip_bundle(Self::ID, "ovpn", records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "client\ndev tun\nproto udp\nremote vpn.example.com 1194\n<ca>\nMIIB\n</ca>\n";
    const CONTEXT: ParseContext<'static> = ParseContext { filename: "server.ovpn", source_id: "channel" };

    #[test]
    fn test_sniff() {
        assert!(OvpnHandler.sniff(PROFILE.as_bytes()));
        assert!(OvpnHandler.sniff(b"client\r\nremote 1.2.3.4 443\r\n"));
        assert!(!OvpnHandler.sniff(b"remote 1.2.3.4 443\n"));
        assert!(!OvpnHandler.sniff(b"client\n"));
        assert!(!OvpnHandler.sniff(b"vless://a@h:1"));
    }

    #[test]
    fn test_parse_single_record_with_original_bytes() {
        let records = OvpnHandler.parse(PROFILE.as_bytes(), &CONTEXT).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, PROFILE.as_bytes());
    }

    #[test]
    fn test_cosmetic_edits_share_a_hash() {
        let edited = format!("# downloaded today\n{}\n\n; trailing comment   \n", PROFILE.replace('\n', "  \n"));
        let a = OvpnHandler.parse(PROFILE.as_bytes(), &CONTEXT).unwrap();
        let b = OvpnHandler.parse(edited.as_bytes(), &CONTEXT).unwrap();
        assert_eq!(a[0].unique_hash, b[0].unique_hash);

        let moved = PROFILE.replace("1194", "1195");
        let c = OvpnHandler.parse(moved.as_bytes(), &CONTEXT).unwrap();
        assert_ne!(a[0].unique_hash, c[0].unique_hash);
    }

    #[test]
    fn test_parse_rejects_profile_without_remote() {
        let err = OvpnHandler.parse(b"client\ndev tun\n# remote commented.out 1194\n", &CONTEXT).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Malformed { format: "ovpn", .. }));
    }

    #[test]
    fn test_assemble_keeps_profiles_apart() {
        let other = PROFILE.replace("vpn.example.com", "backup.example.com");
        let bundle = OvpnHandler.assemble(&[PROFILE.as_bytes(), other.as_bytes()]).unwrap();
        let entries = crate::bundle::tests::entries(&bundle);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, PROFILE.as_bytes());
        assert_eq!(entries[1].1, other.as_bytes());
        assert_eq!(OvpnHandler.artifact_extension(), "zip");
    }

    #[test]
    fn test_parse_rejects_binary() {
        let err = OvpnHandler.parse(&[0xff, 0xfe, 0x00], &CONTEXT).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Malformed { .. }));
    }
}
