// src/adapter/mod.rs
pub mod classifier;
pub mod coordinator;
pub mod dispatcher;

pub use coordinator::BotCoordinator;
pub use dispatcher::Dispatcher;
