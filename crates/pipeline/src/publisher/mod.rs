//! Delivery transports.
//!
//! A [`Publisher`] sends one file to one target. A [`Connector`] builds the
//! publisher for a credential; the publish pipeline asks it at most once per
//! token and run.

pub mod error;
#[cfg(test)]
mod mock;
#[cfg(feature = "telegram")]
mod telegram;

use self::error::Result;
#[cfg(test)]
pub use self::mock::{MockConnector, Sent};
#[cfg(feature = "telegram")]
pub use self::telegram::{TelegramConnector, TelegramPublisher};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends a file with a caption to a destination-specific target.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, target_id: &str, data: &[u8], filename: &str, caption: &str) -> Result<()>;
}

/// Creates the [`Publisher`] that acts with a given credential.
pub trait Connector: Send + Sync {
    fn connect(&self, token: &str) -> Result<Arc<dyn Publisher>>;
}
