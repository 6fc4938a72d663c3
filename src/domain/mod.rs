// src/domain/mod.rs
pub mod catalog;
pub mod errors;
pub mod models;
pub mod repository;
pub mod service;
pub mod workflow;

// Re-export common types for convenience
pub use catalog::{Catalog, Product};
pub use errors::{
    AppError, AppResult, FulfillmentError, FulfillmentResult, IntakeError, IntakeResult,
    RepositoryError, RepositoryResult, TransportError, TransportResult,
};
pub use models::{
    ActionVerb, DeliveryPoint, Draft, DraftField, Location, NewOrder, OperatorAction, Order,
    OrderId, OrderStatus, Phone, UserId,
};
