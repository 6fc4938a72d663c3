// src/domain/errors.rs
use thiserror::Error;

use crate::domain::models::{ActionVerb, DraftField, OrderId, OrderStatus};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Fulfillment error: {0}")]
    Fulfillment(#[from] FulfillmentError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while a customer is filling in a draft.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid phone number: {0:?}")]
    InvalidPhone(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart total is too large")]
    CartTooLarge,

    #[error("No active draft")]
    NoActiveDraft,

    #[error("Out of order input, expecting {expected}")]
    OutOfOrder { expected: DraftField },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Error, Debug)]
pub enum FulfillmentError {
    #[error("Order not found: #{0}")]
    OrderNotFound(OrderId),

    #[error("Order #{order_id} is {from}, cannot {verb}")]
    IllegalTransition {
        order_id: OrderId,
        from: OrderStatus,
        verb: ActionVerb,
    },

    #[error("Order #{0} was changed concurrently")]
    Conflict(OrderId),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Outbound delivery failures. Notifications are best effort, so these are logged
/// by callers and never roll back the mutation that triggered them.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request error: {0}")]
    Request(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request timed out")]
    Timeout,
}

impl From<hyper::Error> for TransportError {
    fn from(err: hyper::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type IntakeResult<T> = Result<T, IntakeError>;
pub type FulfillmentResult<T> = Result<T, FulfillmentError>;
pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type TransportResult<T> = Result<T, TransportError>;
