// src/adapter/classifier.rs
// Turns transport updates into typed events

use crate::application::dto::{Command, Envelope, InboundEvent, ParseError, Sender};
use crate::domain::models::{Location, UserId};
use crate::domain::service::MessageRef;
use crate::infrastructure::telegram::{CallbackQuery, Message, Update, User};

/// A button press whose payload could not be decoded.
#[derive(Debug, PartialEq)]
pub struct Rejected {
    pub sender: UserId,
    pub callback_id: String,
    pub error: ParseError,
}

/// `None` for updates the bot does not react to.
pub fn classify(update: &Update) -> Option<Result<Envelope, Rejected>> {
    if let Some(query) = &update.callback_query {
        return Some(classify_callback(query));
    }
    update.message.as_ref().and_then(classify_message).map(Ok)
}

fn sender_of(user: &User) -> Sender {
    Sender {
        id: UserId(user.id),
        display_name: user.full_name(),
    }
}

fn classify_callback(query: &CallbackQuery) -> Result<Envelope, Rejected> {
    let sender = sender_of(&query.from);
    let payload = query.data.as_deref().unwrap_or_default();
    let command = payload.parse::<Command>().map_err(|error| Rejected {
        sender: sender.id,
        callback_id: query.id.clone(),
        error,
    })?;

    let origin = query.message.as_ref().map(|message| MessageRef {
        chat: UserId(message.chat.id),
        message_id: message.message_id,
    });
    Ok(Envelope::from_button(
        sender,
        command.into_event(),
        query.id.clone(),
        origin,
    ))
}

fn classify_message(message: &Message) -> Option<Envelope> {
    let sender = match &message.from {
        Some(user) => sender_of(user),
        None => Sender {
            id: UserId(message.chat.id),
            display_name: message.chat.id.to_string(),
        },
    };

    if let Some(point) = message.location {
        let location = Location::new(point.latitude, point.longitude);
        return Some(Envelope::new(sender, InboundEvent::ShareLocation(location)));
    }

    let text = message.text.as_deref()?;
    let event = match text.strip_prefix('/') {
        Some(command) => command_event(command)?,
        None => InboundEvent::FreeText(text.to_string()),
    };
    Some(Envelope::new(sender, event))
}

fn command_event(command: &str) -> Option<InboundEvent> {
    // "/start@SomeBot payload" -> "start"
    let name = command
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .split('@')
        .next()
        .unwrap_or_default();
    match name {
        "start" => Some(InboundEvent::Greet),
        "order" => Some(InboundEvent::StartFlow),
        "myorders" => Some(InboundEvent::ListMyOrders),
        other => {
            log::debug!("Ignoring unknown command /{}", other);
            None
        }
    }
}
