// src/application/usecase/history_usecase.rs
// Customer order history

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::service::{render, NotificationRouter};
use crate::domain::errors::RepositoryResult;
use crate::domain::models::{Order, UserId};
use crate::domain::repository::OrderRepository;

#[async_trait]
pub trait HistoryUseCase: Send + Sync {
    /// Sends the customer a list of their orders and returns it.
    async fn list_my_orders(&self, owner: UserId) -> RepositoryResult<Vec<Order>>;
}

pub struct HistoryProcessor {
    orders: Arc<dyn OrderRepository>,
    router: Arc<NotificationRouter>,
}

impl HistoryProcessor {
    pub fn new(orders: Arc<dyn OrderRepository>, router: Arc<NotificationRouter>) -> Self {
        Self { orders, router }
    }
}

#[async_trait]
impl HistoryUseCase for HistoryProcessor {
    async fn list_my_orders(&self, owner: UserId) -> RepositoryResult<Vec<Order>> {
        let orders = self.orders.list_by_owner(owner).await?;
        self.router
            .send(
                owner,
                &render::order_history(&orders),
                Some(&render::main_menu()),
            )
            .await;
        Ok(orders)
    }
}
