// src/infrastructure/telegram/mod.rs
// Telegram Bot API client

pub mod dto;

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Client, Method, Request};
use hyper_tls::HttpsConnector;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::domain::errors::{TransportError, TransportResult};
use crate::domain::models::{Location, UserId};
use crate::domain::service::{Controls, MessageRef, Messenger};

use dto::ApiResponse;
pub use dto::{CallbackQuery, Message, Update, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where inbound updates come from.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Waits for the next batch of updates after `offset`.
    async fn next_batch(&self, offset: Option<i64>) -> TransportResult<Vec<Update>>;

    /// Confirms everything queued so far without returning it. Returns the
    /// offset to poll from next, if anything was pending.
    async fn skip_pending(&self) -> TransportResult<Option<i64>>;
}

pub struct TelegramClient {
    client: Client<HttpsConnector<HttpConnector>>,
    // Contains the bot token; never log it.
    endpoint: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            poll_timeout,
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> TransportResult<T> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("{}/{}", self.endpoint, method))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body)?))
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let response = tokio::time::timeout(timeout, self.client.request(request))
            .await
            .map_err(|_| TransportError::Timeout)??;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;

        let parsed: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Http(format!("{} calling {}", status, method)))
            }
            Err(e) => return Err(e.into()),
        };

        match parsed {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                description,
                error_code,
                ..
            } => Err(TransportError::Api {
                code: error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: description.unwrap_or_else(|| format!("{} failed", method)),
            }),
        }
    }

    async fn send(
        &self,
        method: &str,
        mut body: Value,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        if let Some(controls) = controls {
            body["reply_markup"] = dto::reply_markup(controls);
        }
        let message: Message = self.call(method, &body, REQUEST_TIMEOUT).await?;
        Ok(MessageRef {
            chat: UserId(message.chat.id),
            message_id: message.message_id,
        })
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> TransportResult<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body, timeout + REQUEST_TIMEOUT).await
    }
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        let body = json!({ "chat_id": recipient.0, "text": text });
        self.send("sendMessage", body, controls).await
    }

    async fn send_location(
        &self,
        recipient: UserId,
        location: Location,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        let body = json!({
            "chat_id": recipient.0,
            "latitude": location.latitude,
            "longitude": location.longitude,
        });
        self.send("sendLocation", body, controls).await
    }

    async fn send_photo(
        &self,
        recipient: UserId,
        photo: &str,
        caption: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        let body = json!({ "chat_id": recipient.0, "photo": photo, "caption": caption });
        self.send("sendPhoto", body, controls).await
    }

    async fn edit_controls(
        &self,
        message: MessageRef,
        controls: Option<&Controls>,
    ) -> TransportResult<()> {
        let body = json!({
            "chat_id": message.chat.0,
            "message_id": message.message_id,
            "reply_markup": dto::edited_markup(controls),
        });
        // Responds with the edited message, or `true` for inline messages.
        let _: Value = self
            .call("editMessageReplyMarkup", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) -> TransportResult<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self
            .call("answerCallbackQuery", &body, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_batch(&self, offset: Option<i64>) -> TransportResult<Vec<Update>> {
        self.get_updates(offset, self.poll_timeout).await
    }

    async fn skip_pending(&self) -> TransportResult<Option<i64>> {
        // Offset -1 returns only the newest update; polling past it confirms the rest.
        let latest = self.get_updates(Some(-1), Duration::ZERO).await?;
        let next = latest.last().map(|update| update.update_id + 1);
        if let Some(offset) = next {
            self.get_updates(Some(offset), Duration::ZERO).await?;
            log::info!("Skipped updates queued before startup");
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_token() {
        let client = TelegramClient::new(
            "https://api.telegram.org/",
            "123456:SECRET",
            Duration::from_secs(30),
        );
        assert_eq!(client.endpoint, "https://api.telegram.org/bot123456:SECRET");
        assert!(!format!("{:?}", client).contains("SECRET"));
    }
}
