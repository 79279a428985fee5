//! Telegram Bot API transport.

use super::error::{ErrorKind, Result};
use super::{Connector, Publisher};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Telegram rejects longer document captions.
const MAX_CAPTION_CHARS: usize = 1024;

/// Builds a [`TelegramPublisher`] per bot token, all sharing one HTTP client.
#[derive(Clone)]
pub struct TelegramConnector {
    client: Client,
    api_url: String,
}

impl TelegramConnector {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(reqwest::Error::without_url)
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, api_url: api_url.into().trim_end_matches('/').to_string() })
    }
}

impl Connector for TelegramConnector {
    fn connect(&self, token: &str) -> Result<Arc<dyn Publisher>> {
        Ok(Arc::new(TelegramPublisher {
            client: self.client.clone(),
            endpoint: format!("{}/bot{token}/sendDocument", self.api_url),
        }))
    }
}

/// Sends documents as one bot.
pub struct TelegramPublisher {
    client: Client,
    /// Contains the bot token. Never log it.
    endpoint: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

fn truncate_caption(caption: &str) -> &str {
    match caption.char_indices().nth(MAX_CAPTION_CHARS) {
        Some((index, _)) => &caption[..index],
        None => caption,
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, target_id: &str, data: &[u8], filename: &str, caption: &str) -> Result<()> {
        let form = Form::new()
            .text("chat_id", target_id.to_string())
            .text("caption", truncate_caption(caption).to_string())
            .part("document", Part::bytes(data.to_vec()).file_name(filename.to_string()));

        // Errors carry the request URL, and with it the token, unless stripped.
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .or_raise(|| ErrorKind::Transport)?;
        let status = response.status();
        let body: ApiResponse =
            response.json().await.map_err(reqwest::Error::without_url).or_raise(|| ErrorKind::InvalidResponse)?;

        if !status.is_success() || !body.ok {
            exn::bail!(ErrorKind::Rejected {
                status: status.as_u16(),
                description: body.description.unwrap_or_else(|| "no description".to_string()),
            });
        }
        tracing::debug!(target_id, filename, bytes = data.len(), "Document sent");
        Ok(())
    }
}
