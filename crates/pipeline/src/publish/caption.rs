//! Caption templates.
//!
//! A caption is literal text with `{placeholder}` expressions. The known
//! placeholders are:
//!
//! | Placeholder   | Value                                                   |
//! |---------------|---------------------------------------------------------|
//! | `{timestamp}` | Publish time, `YYYY-MM-DD HH:MM:SS` in UTC               |
//! | `{sha12}`     | First 12 hex characters of the artifact hash            |
//! | `{count}`     | Number of records in the artifact, or `?` if unknown    |
//! | `{format}`    | Format id of the artifact                               |
//!
//! Any other placeholder is an error when the template is parsed, not an
//! empty string at render time.

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use upon::{Engine, Syntax, Template};

const PLACEHOLDERS: [&str; 4] = ["timestamp", "sha12", "count", "format"];
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\s*([^{}]*?)\s*\}").unwrap());

/// What a caption is rendered with.
#[derive(Debug, Clone, Copy)]
pub struct CaptionValues<'a> {
    pub timestamp: OffsetDateTime,
    pub hash: &'a str,
    pub count: Option<usize>,
    pub format: &'a str,
}

/// A compiled caption template.
pub struct CaptionTemplate {
    engine: Engine<'static>,
    template: Template<'static>,
}

impl FromStr for CaptionTemplate {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let unknown: Vec<&str> = EXPRESSION
            .captures_iter(s)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !PLACEHOLDERS.contains(name))
            .collect();
        if !unknown.is_empty() {
            let names = unknown.iter().map(|name| format!("{{{name}}}")).collect::<Vec<_>>().join(", ");
            exn::bail!(ErrorKind::Caption(format!("unknown placeholder {names}")));
        }

        let engine = Engine::with_syntax(Syntax::builder().expr("{", "}").build());
        let template = engine.compile(s.to_string()).or_raise(|| ErrorKind::Caption(s.to_string()))?;
        Ok(Self { engine, template })
    }
}

impl CaptionTemplate {
    pub fn render(&self, values: &CaptionValues<'_>) -> Result<String> {
        let timestamp = values
            .timestamp
            .to_offset(time::UtcOffset::UTC)
            .format(TIMESTAMP_FORMAT)
            .or_raise(|| ErrorKind::Caption("timestamp".to_string()))?;
        let context = upon::value! {
            timestamp: timestamp,
            sha12: values.hash.get(..12).unwrap_or(values.hash),
            count: values.count.map_or_else(|| "?".to_string(), |count| count.to_string()),
            format: values.format,
        };
        self.template
            .render(&self.engine, context)
            .to_string()
            .or_raise(|| ErrorKind::Caption("render".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn values(count: Option<usize>) -> CaptionValues<'static> {
        CaptionValues {
            timestamp: datetime!(2024-03-05 07:08:09 +02:00),
            hash: "abcdef1234567890",
            count,
            format: "uri",
        }
    }

    #[test]
    fn test_renders_known_placeholders() {
        let template: CaptionTemplate = "Update: {timestamp}, sha={sha12}, n={count}".parse().unwrap();
        let caption = template.render(&values(Some(5))).unwrap();
        assert!(caption.contains("sha=abcdef123456"));
        assert!(caption.contains("n=5"));
        assert_eq!(caption, "Update: 2024-03-05 05:08:09, sha=abcdef123456, n=5");
    }

    #[rstest]
    #[case("{format} x{count}", None, "uri x?")]
    #[case("{ format }", None, "uri")]
    #[case("no placeholders", Some(1), "no placeholders")]
    #[case("", Some(1), "")]
    fn test_render(#[case] template: &str, #[case] count: Option<usize>, #[case] expected: &str) {
        let template: CaptionTemplate = template.parse().unwrap();
        assert_eq!(template.render(&values(count)).unwrap(), expected);
    }

    #[test]
    fn test_short_hash_is_kept_whole() {
        let template: CaptionTemplate = "{sha12}".parse().unwrap();
        let mut values = values(None);
        values.hash = "abc";
        assert_eq!(template.render(&values).unwrap(), "abc");
    }

    #[rstest]
    #[case("Hello {name}")]
    #[case("{timestamp} {sha}")]
    #[case("{}")]
    fn test_unknown_placeholder_rejected(#[case] template: &str) {
        let err = template.parse::<CaptionTemplate>().err().unwrap();
        assert!(matches!(&*err, ErrorKind::Caption(message) if message.starts_with("unknown placeholder")));
    }

    #[test]
    fn test_unbalanced_braces_rejected() {
        assert!("Update {timestamp".parse::<CaptionTemplate>().is_err());
    }
}
