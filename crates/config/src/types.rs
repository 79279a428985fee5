use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CAPTION_TEMPLATE: &str = "Update: {timestamp}";
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Selector entry that matches every format.
pub const ALL_FORMATS: &str = "all";

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "mergebot")
}

fn default_data_dir() -> PathBuf {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("data"))
}

fn default_caption_template() -> String {
    DEFAULT_CAPTION_TEMPLATE.to_string()
}

/// Telegram chat ids are often written as bare (negative) numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Holds `raw/`, `artifacts/` and `state.db`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub publishing: PublishingConfig,
}
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            telegram: TelegramConfig::default(),
            sources: Vec::new(),
            publishing: PublishingConfig::default(),
        }
    }
}
impl AppConfig {
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.data_dir.join("artifacts")
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("state.db")
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn route(&self, name: &str) -> Option<&RouteConfig> {
        self.publishing.routes.iter().find(|r| r.name == name)
    }
}

/// Process-wide publisher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Default token for destinations that don't carry their own.
    pub token: Option<String>,
    pub api_url: String,
    /// Upper bound for a single delivery.
    pub timeout_secs: u64,
}
impl Default for TelegramConfig {
    fn default() -> Self {
        Self { token: None, api_url: DEFAULT_API_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramSourceConfig>,
    #[serde(default)]
    pub selector: SourceSelector,
}

/// Where a Telegram source is polled from. Used by the ingesting front end.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TelegramSourceConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceSelector {
    pub include_formats: Vec<String>,
}
impl Default for SourceSelector {
    fn default() -> Self {
        Self { include_formats: vec![ALL_FORMATS.to_string()] }
    }
}
impl SourceSelector {
    pub fn includes(&self, format: &str) -> bool {
        self.include_formats.iter().any(|f| f == ALL_FORMATS || f == format)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublishingConfig {
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// A named publishing target: which sources feed it, which formats it
/// builds, and where the results go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    pub name: String,
    pub from_sources: Vec<String>,
    pub formats: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DestinationConfig {
    #[serde(deserialize_with = "string_or_number")]
    pub chat_id: String,
    #[serde(default)]
    pub mode: DeliveryMode,
    #[serde(default = "default_caption_template")]
    pub caption_template: String,
    /// Overrides [`TelegramConfig::token`] for this destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
impl DestinationConfig {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            mode: DeliveryMode::default(),
            caption_template: default_caption_template(),
            token: None,
        }
    }

    pub fn with_caption(mut self, template: impl Into<String>) -> Self {
        self.caption_template = template.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// How a destination wants artifacts delivered. Both modes currently send
/// the assembled artifact as a single document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    #[default]
    Bundle,
    Document,
}
