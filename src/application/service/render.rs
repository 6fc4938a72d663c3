// src/application/service/render.rs
// Message texts and controls

use crate::application::dto::Command;
use crate::domain::catalog::{Catalog, Product};
use crate::domain::errors::IntakeError;
use crate::domain::models::{DeliveryPoint, Draft, OperatorAction, Order, OrderId, OrderStatus};
use crate::domain::service::{Button, Controls};
use crate::domain::workflow;

pub const GREETING: &str =
    "👋 Hello! Welcome to the FastFood delivery bot.\n\nChoose an option below:";
pub const MENU_PROMPT: &str = "🍔 Pick products from the menu, or type a product name:";
pub const LOCATION_PROMPT: &str =
    "📍 Share your location with the button below, or type your address:";
pub const PHONE_PROMPT: &str = "📞 Enter your phone number (digits only, e.g. 998901234567):";
pub const PHONE_RETRY: &str =
    "⚠️ The phone number must contain 10 to 13 digits and nothing else. Please try again:";
pub const EMPTY_CART: &str = "🛒 Your cart is empty. Add at least one product first.";
pub const CART_TOO_LARGE: &str =
    "🛒 Your cart is too large to order at once. Finish this order or start over with /order.";
pub const NO_ORDERS: &str = "📦 You have no orders yet.";
pub const TRY_AGAIN_LATER: &str = "⚠️ Something went wrong, please try again in a moment.";
pub const NOT_ALLOWED: &str = "⛔ Only the operator can do that.";
pub const ORDER_CHANGED: &str = "🔄 The order was just updated, please try again.";
pub const INVALID_BUTTON: &str = "⚠️ This button is no longer valid.";

/// Groups digits by thousands: `35000` becomes `35 000`.
pub fn format_price(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

pub fn main_menu() -> Controls {
    Controls::Buttons(vec![
        vec![Button::new("🍔 Order", Command::StartFlow.encode())],
        vec![Button::new("📦 My orders", Command::ListMyOrders.encode())],
    ])
}

/// Two products per row, then the cart and finish buttons.
pub fn product_menu(catalog: &Catalog) -> Controls {
    let mut rows: Vec<Vec<Button>> = catalog
        .products()
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|p| {
                    Button::new(
                        format!("{} · {}", p.name, format_price(p.price)),
                        Command::SelectProduct(p.name.clone()).encode(),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![
        Button::new("🛒 Cart", Command::ViewCart.encode()),
        Button::new("✅ Finish", Command::FinishSelection.encode()),
    ]);
    Controls::Buttons(rows)
}

pub fn location_request() -> Controls {
    Controls::RequestLocation {
        label: "📍 Send location".to_string(),
    }
}

pub fn product_added(product: &Product, draft: &Draft) -> String {
    format!(
        "➕ {} added.\n🛒 Items: {}, total: {}",
        product.name,
        draft.cart().len(),
        format_price(draft.total())
    )
}

pub fn cart_summary(draft: &Draft) -> String {
    if draft.cart().is_empty() {
        return EMPTY_CART.to_string();
    }
    let mut text = String::from("🛒 Your cart:\n");
    for (i, name) in draft.cart().iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, name));
    }
    text.push_str(&format!("\n💰 Total: {}", format_price(draft.total())));
    text
}

pub fn unknown_product(text: &str) -> String {
    format!("🤷 \"{}\" is not on the menu. Please choose from the list:", text)
}

/// What the customer should be told after a recoverable intake failure, if anything.
pub fn intake_notice(err: &IntakeError) -> Option<String> {
    match err {
        IntakeError::InvalidPhone(_) => Some(PHONE_RETRY.to_string()),
        IntakeError::EmptyCart => Some(EMPTY_CART.to_string()),
        IntakeError::CartTooLarge => Some(CART_TOO_LARGE.to_string()),
        IntakeError::UnknownProduct(text) => Some(unknown_product(text)),
        IntakeError::Repository(_) => Some(TRY_AGAIN_LATER.to_string()),
        IntakeError::NoActiveDraft | IntakeError::OutOfOrder { .. } => None,
    }
}

fn delivery_line(delivery: &DeliveryPoint) -> String {
    match delivery {
        DeliveryPoint::Location(_) => "📍 Location shared (see map)".to_string(),
        DeliveryPoint::Address(address) => format!("📍 {}", address),
    }
}

pub fn operator_summary(order: &Order) -> String {
    format!(
        "📦 NEW ORDER #{}\n\n👤 {}\n🍔 {}\n💰 {}\n{}\n📞 {}",
        order.id(),
        order.owner_name(),
        order.products().join(", "),
        format_price(order.total()),
        delivery_line(order.delivery()),
        order.phone()
    )
}

pub fn customer_confirmation(order: &Order) -> String {
    format!(
        "✅ Order #{} received, total {}. The operator is reviewing it.",
        order.id(),
        format_price(order.total())
    )
}

pub fn status_update(order: &Order) -> String {
    format!("📦 #{}\n{}", order.id(), order.status().label())
}

/// Operator buttons for the order's current status; `None` once terminal.
pub fn operator_controls(order: &Order) -> Option<Controls> {
    let actions = workflow::available_actions(order.status());
    if actions.is_empty() {
        return None;
    }
    let buttons = actions
        .iter()
        .map(|&verb| {
            Button::new(
                verb.label(),
                Command::Operator(OperatorAction {
                    verb,
                    order_id: order.id(),
                })
                .encode(),
            )
        })
        .collect();
    Some(Controls::Buttons(vec![buttons]))
}

pub fn illegal_action(status: OrderStatus) -> String {
    format!("Not available. Current status: {}", status.label())
}

pub fn order_not_found(id: OrderId) -> String {
    format!("🔍 Order #{} was not found.", id)
}

/// Orders shown in one history message.
pub const HISTORY_LIMIT: usize = 20;

// Telegram rejects longer messages.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Lists the most recent orders, given oldest first.
pub fn order_history(orders: &[Order]) -> String {
    if orders.is_empty() {
        return NO_ORDERS.to_string();
    }
    let recent = &orders[orders.len().saturating_sub(HISTORY_LIMIT)..];
    let mut text = if recent.len() < orders.len() {
        format!("📦 Your last {} of {} orders:\n\n", recent.len(), orders.len())
    } else {
        String::from("📦 Your orders:\n\n")
    };
    for order in recent {
        text.push_str(&format!(
            "#{} 🍔 {} - {}\n",
            order.id(),
            order.products().join(", "),
            order.status().label()
        ));
    }
    truncate_message(text)
}

fn truncate_message(text: String) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    cut.push('…');
    cut
}
