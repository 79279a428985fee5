use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(SHARE_LINK_REGEX, r"^(?:vmess|vless|trojan|ssr|ss|hysteria2|hysteria|tuic)://\S+$");
regex!(OVPN_CLIENT_REGEX, r"(?m)^[ \t]*client[ \t]*\r?$");
regex!(OVPN_REMOTE_REGEX, r"(?m)^[ \t]*remote[ \t]+\S+");
