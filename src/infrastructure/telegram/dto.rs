// src/infrastructure/telegram/dto.rs
// Bot API wire types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::service::{Button, Controls};

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// First and last name, falling back to the username or the numeric id.
    pub fn full_name(&self) -> String {
        let name = match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        };
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

fn inline_keyboard(rows: &[Vec<Button>]) -> Value {
    let rows: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.label, "callback_data": b.payload }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// Maps controls onto a `reply_markup` object.
pub fn reply_markup(controls: &Controls) -> Value {
    match controls {
        Controls::Buttons(rows) => inline_keyboard(rows),
        Controls::RequestLocation { label } => json!({
            "keyboard": [[{ "text": label, "request_location": true }]],
            "resize_keyboard": true,
            "one_time_keyboard": true,
        }),
        Controls::Remove => json!({ "remove_keyboard": true }),
    }
}

/// Markup for `editMessageReplyMarkup`, which only understands inline keyboards.
/// Anything else clears the buttons.
pub fn edited_markup(controls: Option<&Controls>) -> Value {
    match controls {
        Some(Controls::Buttons(rows)) => inline_keyboard(rows),
        _ => json!({ "inline_keyboard": [] }),
    }
}
