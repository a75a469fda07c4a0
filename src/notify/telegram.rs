use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{MessageTransport, Notification, TransportResponse};
use crate::error::{ConfigError, TransportError};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API `sendMessage` transport.
pub struct TelegramTransport {
    client: Client,
    endpoint: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct ApiReply {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ReplyParameters>,
}

#[derive(Deserialize)]
struct ReplyParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramTransport {
    /// All requests of this transport go through `proxy` when given. The
    /// proxy URL is expected to be validated already.
    pub fn new(
        api_base: &str,
        bot_token: &str,
        chat_id: impl Into<String>,
        proxy: Option<&Url>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30));
        if let Some(p) = proxy {
            builder = builder.proxy(Proxy::all(p.as_str())?);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.into(),
        })
    }
}

#[async_trait::async_trait]
impl MessageTransport for TelegramTransport {
    async fn send(&self, notification: &Notification) -> Result<TransportResponse, TransportError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: &notification.text,
            message_thread_id: notification.thread_id.as_deref(),
        };

        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status().as_u16();
        if resp.status().is_success() {
            return Ok(TransportResponse::with_status(status));
        }

        let header_retry = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        // Error bodies are best-effort; a garbled one still yields the status.
        let reply: ApiReply = resp
            .text()
            .await
            .ok()
            .and_then(|t| serde_json::from_str(&t).ok())
            .unwrap_or_default();
        let body_retry = reply.parameters.and_then(|p| p.retry_after);

        Ok(TransportResponse {
            status,
            retry_after: body_retry.or(header_retry).map(Duration::from_secs),
            description: reply.description,
        })
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
