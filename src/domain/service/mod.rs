// src/domain/service/mod.rs
// Outbound messaging interface

use async_trait::async_trait;

use crate::domain::errors::TransportResult;
use crate::domain::models::{Location, UserId};

/// Handle to a message already delivered, so its controls can be edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: UserId,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Interactive elements attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    /// Rows of buttons attached to the message itself.
    Buttons(Vec<Vec<Button>>),
    /// Keyboard asking the user to share their location.
    RequestLocation { label: String },
    /// Hides a previously shown request keyboard.
    Remove,
}

impl Controls {
    /// Payloads of every button, in display order.
    pub fn payloads(&self) -> Vec<&str> {
        match self {
            Controls::Buttons(rows) => rows
                .iter()
                .flatten()
                .map(|button| button.payload.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Chat transport used by the core to reach customers and the operator.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef>;

    async fn send_location(
        &self,
        recipient: UserId,
        location: Location,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef>;

    async fn send_photo(
        &self,
        recipient: UserId,
        photo: &str,
        caption: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef>;

    /// Replaces the buttons on `message`; `None` removes them.
    async fn edit_controls(
        &self,
        message: MessageRef,
        controls: Option<&Controls>,
    ) -> TransportResult<()>;

    /// Confirms a button press, optionally with a short toast.
    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) -> TransportResult<()>;
}
