mod npvt;
mod ovpn;
mod uri;

pub use self::npvt::NpvtHandler;
pub use self::ovpn::OvpnHandler;
pub use self::uri::UriHandler;
