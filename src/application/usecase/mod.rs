pub mod fulfillment_usecase;
pub mod history_usecase;
pub mod intake_usecase;

// Re-export public API
pub use fulfillment_usecase::{FulfillmentProcessor, FulfillmentUseCase};
pub use history_usecase::{HistoryProcessor, HistoryUseCase};
pub use intake_usecase::{IntakeProcessor, IntakeUseCase};
