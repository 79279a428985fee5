//! Layered configuration for mergebot.
//!
//! Configuration sources, highest priority last:
//! 1. Built-in defaults
//! 2. A YAML, TOML or JSON file (explicit path, or the user-level
//!    `config.yaml` in the platform config directory)
//! 3. `TELEGRAM_TOKEN`, the process-wide default publisher token
//! 4. `MERGEBOT_*` environment variables, `__` separating nested keys
//!
//! ```no_run
//! use mergebot_config::AppConfig;
//!
//! let config = AppConfig::load(None)?;
//! for route in &config.publishing.routes {
//!     println!("{} publishes {:?}", route.name, route.formats);
//! }
//! # Ok::<(), mergebot_config::error::Error>(())
//! ```

pub mod error;
mod load;
mod types;
mod validate;

pub use crate::load::{ENV_PREFIX, TOKEN_ENV, default_config_path};
pub use crate::types::{
    ALL_FORMATS, AppConfig, DEFAULT_CAPTION_TEMPLATE, DeliveryMode, DestinationConfig, PublishingConfig, RouteConfig,
    SourceConfig, SourceSelector, TelegramConfig, TelegramSourceConfig,
};
