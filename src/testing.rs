// src/testing.rs
// Test doubles shared by unit tests

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::{TransportError, TransportResult};
use crate::domain::models::{Location, UserId};
use crate::domain::service::{Controls, MessageRef, Messenger};

#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text {
        reference: MessageRef,
        recipient: UserId,
        text: String,
        controls: Option<Controls>,
    },
    Location {
        reference: MessageRef,
        recipient: UserId,
        location: Location,
        controls: Option<Controls>,
    },
    Photo {
        reference: MessageRef,
        recipient: UserId,
        photo: String,
        caption: String,
        controls: Option<Controls>,
    },
}

impl Outgoing {
    pub fn message_ref(&self) -> MessageRef {
        match self {
            Outgoing::Text { reference, .. }
            | Outgoing::Location { reference, .. }
            | Outgoing::Photo { reference, .. } => *reference,
        }
    }

    pub fn recipient(&self) -> UserId {
        self.message_ref().chat
    }

    pub fn text(&self) -> &str {
        match self {
            Outgoing::Text { text, .. } => text,
            Outgoing::Photo { caption, .. } => caption,
            Outgoing::Location { .. } => "",
        }
    }

    pub fn controls(&self) -> Option<&Controls> {
        match self {
            Outgoing::Text { controls, .. }
            | Outgoing::Location { controls, .. }
            | Outgoing::Photo { controls, .. } => controls.as_ref(),
        }
    }
}

/// Messenger that records everything instead of talking to a chat service.
#[derive(Default)]
pub struct RecordingMessenger {
    fail: bool,
    sent: Mutex<Vec<Outgoing>>,
    edits: Mutex<Vec<(MessageRef, Option<Controls>)>>,
    acks: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingMessenger {
    /// A messenger whose every call fails, as if the transport were down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<Outgoing> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, recipient: UserId) -> Vec<Outgoing> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.recipient() == recipient)
            .cloned()
            .collect()
    }

    pub async fn edits(&self) -> Vec<(MessageRef, Option<Controls>)> {
        self.edits.lock().await.clone()
    }

    pub async fn acks(&self) -> Vec<(String, Option<String>)> {
        self.acks.lock().await.clone()
    }

    async fn record(&self, recipient: UserId, build: impl FnOnce(MessageRef) -> Outgoing) -> TransportResult<MessageRef> {
        if self.fail {
            return Err(TransportError::Http("transport unavailable".to_string()));
        }
        let mut sent = self.sent.lock().await;
        let reference = MessageRef {
            chat: recipient,
            message_id: sent.len() as i64 + 1,
        };
        sent.push(build(reference));
        Ok(reference)
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        recipient: UserId,
        text: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        self.record(recipient, |reference| Outgoing::Text {
            reference,
            recipient,
            text: text.to_string(),
            controls: controls.cloned(),
        })
        .await
    }

    async fn send_location(
        &self,
        recipient: UserId,
        location: Location,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        self.record(recipient, |reference| Outgoing::Location {
            reference,
            recipient,
            location,
            controls: controls.cloned(),
        })
        .await
    }

    async fn send_photo(
        &self,
        recipient: UserId,
        photo: &str,
        caption: &str,
        controls: Option<&Controls>,
    ) -> TransportResult<MessageRef> {
        self.record(recipient, |reference| Outgoing::Photo {
            reference,
            recipient,
            photo: photo.to_string(),
            caption: caption.to_string(),
            controls: controls.cloned(),
        })
        .await
    }

    async fn edit_controls(
        &self,
        message: MessageRef,
        controls: Option<&Controls>,
    ) -> TransportResult<()> {
        if self.fail {
            return Err(TransportError::Http("transport unavailable".to_string()));
        }
        self.edits.lock().await.push((message, controls.cloned()));
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) -> TransportResult<()> {
        if self.fail {
            return Err(TransportError::Http("transport unavailable".to_string()));
        }
        self.acks
            .lock()
            .await
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }
}
