// src/application/dto/mod.rs
// Inbound events as seen by the core

pub mod parser;

use thiserror::Error;

use crate::domain::models::{Location, OperatorAction, UserId};
use crate::domain::service::MessageRef;

pub use parser::Command;

/// Who sent an event, with the name shown on their orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `/start`: greeting and main menu.
    Greet,
    StartFlow,
    SelectProduct(String),
    ViewCart,
    FinishSelection,
    ShareLocation(Location),
    FreeText(String),
    OperatorAction(OperatorAction),
    ListMyOrders,
}

/// An event plus the transport context it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub sender: Sender,
    pub event: InboundEvent,
    /// Set when the event came from a button press that must be acknowledged.
    pub callback_id: Option<String>,
    /// Message carrying the pressed button.
    pub origin: Option<MessageRef>,
}

impl Envelope {
    pub fn new(sender: Sender, event: InboundEvent) -> Self {
        Self {
            sender,
            event,
            callback_id: None,
            origin: None,
        }
    }

    pub fn from_button(
        sender: Sender,
        event: InboundEvent,
        callback_id: String,
        origin: Option<MessageRef>,
    ) -> Self {
        Self {
            sender,
            event,
            callback_id: Some(callback_id),
            origin,
        }
    }
}

/// Button payloads that do not decode into a [`Command`].
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("Invalid order id in {0:?}")]
    InvalidOrderId(String),

    #[error("Missing product name in {0:?}")]
    MissingProduct(String),
}
