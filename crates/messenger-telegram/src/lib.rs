//! Telegram Bot API implementation of the messenger sink.
//!
//! Captions are sent with the MarkdownV2 parse mode, so they must arrive
//! fully escaped. Photo messages upload the image bytes as a multipart form;
//! text messages disable link previews.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use herald_messenger::Messenger;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PARSE_MODE: &str = "MarkdownV2";

/// Messenger delivering to a single Telegram chat via the Bot API.
#[derive(Clone, Debug)]
pub struct TelegramMessenger {
    client: reqwest::Client,
    base_url: String,
    chat_id: String,
}

impl TelegramMessenger {
    /// Creates a new messenger for the given bot token and chat id.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(bot_token: &str, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::ClientBuild)?;

        Ok(Self {
            client,
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
            chat_id: chat_id.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn check(response: reqwest::Response) -> Result<()> {
        let api: ApiResponse = response.json().await?;
        if api.ok {
            Ok(())
        } else {
            Err(Error::Api(
                api.description
                    .unwrap_or_else(|| "no description".to_string()),
            ))
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    type Error = Error;

    async fn send_text(&self, text: &str) -> Result<()> {
        debug!("sending text message to chat {}", self.chat_id);

        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: PARSE_MODE,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        Self::check(response).await
    }

    async fn send_photo(&self, photo: Bytes, caption: &str) -> Result<()> {
        debug!(
            "sending photo message ({} bytes) to chat {}",
            photo.len(),
            self.chat_id
        );

        let part = Part::bytes(photo.to_vec())
            .file_name("thumbnail")
            .mime_str("image/jpeg")?;

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", PARSE_MODE)
            .part("photo", part);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;

        Self::check(response).await
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
