// src/application/dto/parser.rs
// Button payload codec

use std::fmt;
use std::str::FromStr;

use super::{InboundEvent, ParseError};
use crate::domain::models::{ActionVerb, OperatorAction, OrderId};

const MENU_ORDER: &str = "menu_order";
const MENU_MY_ORDERS: &str = "menu_my_orders";
const VIEW_CART: &str = "cart";
const FINISH: &str = "finish";
const ADD_PREFIX: &str = "add";

/// Typed form of a button payload. Decoded once at the transport boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartFlow,
    ListMyOrders,
    SelectProduct(String),
    ViewCart,
    FinishSelection,
    Operator(OperatorAction),
}

impl Command {
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn into_event(self) -> InboundEvent {
        match self {
            Command::StartFlow => InboundEvent::StartFlow,
            Command::ListMyOrders => InboundEvent::ListMyOrders,
            Command::SelectProduct(name) => InboundEvent::SelectProduct(name),
            Command::ViewCart => InboundEvent::ViewCart,
            Command::FinishSelection => InboundEvent::FinishSelection,
            Command::Operator(action) => InboundEvent::OperatorAction(action),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::StartFlow => f.write_str(MENU_ORDER),
            Command::ListMyOrders => f.write_str(MENU_MY_ORDERS),
            Command::SelectProduct(name) => write!(f, "{}:{}", ADD_PREFIX, name),
            Command::ViewCart => f.write_str(VIEW_CART),
            Command::FinishSelection => f.write_str(FINISH),
            Command::Operator(action) => write!(f, "{}:{}", action.verb, action.order_id),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        match payload {
            MENU_ORDER => return Ok(Command::StartFlow),
            MENU_MY_ORDERS => return Ok(Command::ListMyOrders),
            VIEW_CART => return Ok(Command::ViewCart),
            FINISH => return Ok(Command::FinishSelection),
            _ => {}
        }

        let (head, tail) = payload
            .split_once(':')
            .ok_or_else(|| ParseError::UnknownCommand(payload.to_string()))?;

        if head == ADD_PREFIX {
            if tail.is_empty() {
                return Err(ParseError::MissingProduct(payload.to_string()));
            }
            return Ok(Command::SelectProduct(tail.to_string()));
        }

        let verb: ActionVerb = head
            .parse()
            .map_err(|_| ParseError::UnknownCommand(payload.to_string()))?;
        let order_id = tail
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ParseError::InvalidOrderId(payload.to_string()))?;

        Ok(Command::Operator(OperatorAction {
            verb,
            order_id: OrderId(order_id),
        }))
    }
}
