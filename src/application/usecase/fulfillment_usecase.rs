// src/application/usecase/fulfillment_usecase.rs
// Operator-driven order status changes

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::service::NotificationRouter;
use crate::domain::errors::{FulfillmentError, FulfillmentResult};
use crate::domain::models::{OperatorAction, Order};
use crate::domain::repository::OrderRepository;
use crate::domain::service::MessageRef;
use crate::domain::workflow;

#[async_trait]
pub trait FulfillmentUseCase: Send + Sync {
    /// Applies an operator action to an order. The caller is responsible for
    /// checking that the action really comes from the operator.
    ///
    /// `origin` is the operator message whose button was pressed, if any.
    async fn apply(
        &self,
        action: OperatorAction,
        origin: Option<MessageRef>,
    ) -> FulfillmentResult<Order>;
}

pub struct FulfillmentProcessor {
    orders: Arc<dyn OrderRepository>,
    router: Arc<NotificationRouter>,
}

impl FulfillmentProcessor {
    pub fn new(orders: Arc<dyn OrderRepository>, router: Arc<NotificationRouter>) -> Self {
        Self { orders, router }
    }
}

#[async_trait]
impl FulfillmentUseCase for FulfillmentProcessor {
    async fn apply(
        &self,
        action: OperatorAction,
        origin: Option<MessageRef>,
    ) -> FulfillmentResult<Order> {
        let order = self
            .orders
            .get(action.order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(action.order_id))?;

        let Some(next) = workflow::next_status(order.status(), action.verb) else {
            // Stale buttons get replaced with the ones valid now.
            self.router.refresh_controls(&order, origin).await;
            return Err(FulfillmentError::IllegalTransition {
                order_id: order.id(),
                from: order.status(),
                verb: action.verb,
            });
        };

        let updated = self
            .orders
            .update_status(order.id(), order.status(), next)
            .await?
            .ok_or(FulfillmentError::Conflict(order.id()))?;

        log::info!(
            "Order #{} moved from {} to {}",
            updated.id(),
            order.status(),
            updated.status()
        );
        self.router.status_changed(&updated, origin).await;
        Ok(updated)
    }
}
