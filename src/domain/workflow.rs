// src/domain/workflow.rs
// Fulfillment status transitions

use crate::domain::models::{ActionVerb, OrderStatus};

/// Status reached by applying `verb` to an order in `from`, or `None` when the
/// move is not allowed. No backward moves; `OutForDelivery` and `Cancelled` are terminal.
pub fn next_status(from: OrderStatus, verb: ActionVerb) -> Option<OrderStatus> {
    use ActionVerb::*;
    use OrderStatus::*;

    match (from, verb) {
        (New, Accept) => Some(Accepted),
        (New | Accepted, Cook) => Some(Cooking),
        (Cooking, Courier) => Some(OutForDelivery),
        (New | Accepted | Cooking, Cancel) => Some(Cancelled),
        _ => None,
    }
}

/// Controls offered to the operator for an order in `status`.
pub fn available_actions(status: OrderStatus) -> &'static [ActionVerb] {
    match status {
        OrderStatus::New | OrderStatus::Accepted => &[ActionVerb::Cook, ActionVerb::Cancel],
        OrderStatus::Cooking => &[ActionVerb::Courier, ActionVerb::Cancel],
        OrderStatus::OutForDelivery | OrderStatus::Cancelled => &[],
    }
}
