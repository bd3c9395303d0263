//! Telegram Bot API delivery channel

use super::DeliveryChannel;
use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Longest response body kept in a [`DeliveryError::Rejected`]
const MAX_ERROR_BODY: usize = 512;

/// Sends files to a chat through a bot's `sendDocument` method
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    /// Build a channel from the delivery settings
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn check_response(
        &self,
        method: &str,
        response: reqwest::Response,
    ) -> Result<(), DeliveryError> {
        let status = response.status();
        // Token is part of the URL, so only the method name is logged
        if status.is_success() {
            tracing::debug!(method, status = status.as_u16(), "Telegram API accepted request");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DeliveryChannel for TelegramChannel {
    async fn send_document(&self, path: &Path) -> Result<(), DeliveryError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| DeliveryError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;

        self.check_response("sendDocument", response).await
    }

    async fn send_message(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await?;

        self.check_response("sendMessage", response).await
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
