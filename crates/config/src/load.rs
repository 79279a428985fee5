use crate::error::{ErrorKind, Result};
use crate::types::{AppConfig, project_dirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::instrument;

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "MERGEBOT_";
/// Process-wide default publisher token, outside the prefixed namespace.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Replace `${NAME}` with the value of environment variable `NAME`.
///
/// Unset variables expand to an empty string, the way a shell would.
pub(crate) fn expand_env(text: &str) -> String {
    ENV_REFERENCE
        .replace_all(text, |caps: &Captures<'_>| std::env::var(&caps[1]).unwrap_or_default())
        .into_owned()
}

/// The user-level configuration file, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn file_provider(path: &Path) -> Result<Figment> {
    let text = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let text = expand_env(&text);
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("yaml" | "yml") => Figment::from(Yaml::string(&text)),
        Some("toml") => Figment::from(Toml::string(&text)),
        Some("json") => Figment::from(Json::string(&text)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

impl AppConfig {
    /// Build the provider chain, lowest priority first:
    ///
    /// 1. Built-in defaults.
    /// 2. The file at `path`, or the user-level `config.yaml` if it exists.
    ///    `${NAME}` references in the file are expanded from the environment.
    /// 3. `TELEGRAM_TOKEN`, as `telegram.token`.
    /// 4. `MERGEBOT_*` variables, `__` separating nested keys
    ///    (`MERGEBOT_TELEGRAM__TIMEOUT_SECS` is `telegram.timeout_secs`).
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => figment = figment.merge(file_provider(path)?),
            None => {
                if let Some(path) = default_config_path().filter(|p| p.exists()) {
                    tracing::debug!(path = %path.display(), "Using user configuration file");
                    figment = figment.merge(file_provider(&path)?);
                }
            },
        }
        Ok(figment
            .merge(Env::raw().only(&[TOKEN_ENV]).map(|_| "telegram.token".into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate the configuration.
    #[instrument(skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Malformed)?;
        config.validate()?;
        Ok(config)
    }
}
