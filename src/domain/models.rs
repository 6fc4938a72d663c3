// src/domain/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::catalog::Product;
use crate::domain::errors::{IntakeError, IntakeResult};

/// Chat identity of a customer or of the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repository-assigned order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Where the order goes: a shared geolocation, or a typed address when the
/// customer could not share one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeliveryPoint {
    Location(Location),
    Address(String),
}

impl DeliveryPoint {
    pub fn location(&self) -> Option<Location> {
        match self {
            DeliveryPoint::Location(location) => Some(*location),
            DeliveryPoint::Address(_) => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            DeliveryPoint::Location(_) => None,
            DeliveryPoint::Address(address) => Some(address),
        }
    }
}

impl fmt::Display for DeliveryPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeliveryPoint::Location(l) => write!(f, "{:.5}, {:.5}", l.latitude, l.longitude),
            DeliveryPoint::Address(address) => write!(f, "{}", address),
        }
    }
}

/// A contact phone: 10 to 13 ASCII digits, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    pub const MIN_DIGITS: usize = 10;
    pub const MAX_DIGITS: usize = 13;

    pub fn parse(raw: &str) -> IntakeResult<Self> {
        let valid = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&raw.len())
            && raw.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(IntakeError::InvalidPhone(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The next piece of information a draft is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Product,
    Delivery,
    Phone,
    Complete,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DraftField::Product => write!(f, "product"),
            DraftField::Delivery => write!(f, "delivery point"),
            DraftField::Phone => write!(f, "phone"),
            DraftField::Complete => write!(f, "nothing"),
        }
    }
}

/// An order being assembled in conversation. Fields fill strictly in
/// [`DraftField`] order and the running total always matches the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    owner: UserId,
    cart: Vec<String>,
    total: u64,
    selection_closed: bool,
    delivery: Option<DeliveryPoint>,
    phone: Option<Phone>,
    pub touched_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            owner,
            cart: Vec::new(),
            total: 0,
            selection_closed: false,
            delivery: None,
            phone: None,
            touched_at: now,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn cart(&self) -> &[String] {
        &self.cart
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn delivery(&self) -> Option<&DeliveryPoint> {
        self.delivery.as_ref()
    }

    pub fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    pub fn next_field(&self) -> DraftField {
        if !self.selection_closed {
            DraftField::Product
        } else if self.delivery.is_none() {
            DraftField::Delivery
        } else if self.phone.is_none() {
            DraftField::Phone
        } else {
            DraftField::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next_field() == DraftField::Complete
    }

    pub fn add_product(&mut self, product: &Product) -> IntakeResult<()> {
        self.require(DraftField::Product)?;
        self.total = self
            .total
            .checked_add(product.price)
            .ok_or(IntakeError::CartTooLarge)?;
        self.cart.push(product.name.clone());
        Ok(())
    }

    pub fn close_selection(&mut self) -> IntakeResult<()> {
        self.require(DraftField::Product)?;
        if self.cart.is_empty() {
            return Err(IntakeError::EmptyCart);
        }
        self.selection_closed = true;
        Ok(())
    }

    pub fn set_delivery(&mut self, delivery: DeliveryPoint) -> IntakeResult<()> {
        self.require(DraftField::Delivery)?;
        self.delivery = Some(delivery);
        Ok(())
    }

    /// Validates and stores the phone. On failure nothing is stored.
    pub fn set_phone(&mut self, raw: &str) -> IntakeResult<()> {
        self.require(DraftField::Phone)?;
        self.phone = Some(Phone::parse(raw)?);
        Ok(())
    }

    /// Snapshots a complete draft into the record that gets persisted.
    pub fn to_new_order(&self, owner_name: &str) -> IntakeResult<NewOrder> {
        match (&self.delivery, &self.phone) {
            (Some(delivery), Some(phone)) if self.selection_closed => Ok(NewOrder {
                owner: self.owner,
                owner_name: owner_name.to_string(),
                phone: phone.clone(),
                products: self.cart.clone(),
                total: self.total,
                delivery: delivery.clone(),
            }),
            _ => Err(IntakeError::OutOfOrder {
                expected: self.next_field(),
            }),
        }
    }

    fn require(&self, field: DraftField) -> IntakeResult<()> {
        let next = self.next_field();
        if next == field {
            Ok(())
        } else {
            Err(IntakeError::OutOfOrder { expected: next })
        }
    }
}

/// Everything about an order except its id and status, fixed at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub owner: UserId,
    pub owner_name: String,
    pub phone: Phone,
    pub products: Vec<String>,
    pub total: u64,
    pub delivery: DeliveryPoint,
}

/// A submitted order. Only the status ever changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    details: NewOrder,
    status: OrderStatus,
}

impl Order {
    pub fn new(id: OrderId, details: NewOrder, status: OrderStatus) -> Self {
        Self { id, details, status }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn details(&self) -> &NewOrder {
        &self.details
    }

    pub fn owner(&self) -> UserId {
        self.details.owner
    }

    pub fn owner_name(&self) -> &str {
        &self.details.owner_name
    }

    pub fn phone(&self) -> &Phone {
        &self.details.phone
    }

    pub fn products(&self) -> &[String] {
        &self.details.products
    }

    pub fn total(&self) -> u64 {
        self.details.total
    }

    pub fn delivery(&self) -> &DeliveryPoint {
        &self.details.delivery
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    Accepted,
    Cooking,
    OutForDelivery,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Accepted,
        OrderStatus::Cooking,
        OrderStatus::OutForDelivery,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Cooking => "cooking",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Customer-facing description.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::New => "🆕 New",
            OrderStatus::Accepted => "✅ Order accepted",
            OrderStatus::Cooking => "🍳 Order is being prepared",
            OrderStatus::OutForDelivery => "🛵 Order handed to the courier",
            OrderStatus::Cancelled => "❌ Order cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {}", s))
    }
}

/// Verbs the operator can apply to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionVerb {
    Accept,
    Cook,
    Courier,
    Cancel,
}

impl ActionVerb {
    pub const ALL: [ActionVerb; 4] = [
        ActionVerb::Accept,
        ActionVerb::Cook,
        ActionVerb::Courier,
        ActionVerb::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionVerb::Accept => "accept",
            ActionVerb::Cook => "cook",
            ActionVerb::Courier => "courier",
            ActionVerb::Cancel => "cancel",
        }
    }

    /// Button caption shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            ActionVerb::Accept => "✅ Accept",
            ActionVerb::Cook => "🍳 Cooking",
            ActionVerb::Courier => "🛵 To courier",
            ActionVerb::Cancel => "❌ Cancel",
        }
    }
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionVerb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| format!("unknown action: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAction {
    pub verb: ActionVerb,
    pub order_id: OrderId,
}
