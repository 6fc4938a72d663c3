// src/infrastructure/storage/mod.rs
// Order repository implementations

pub mod sqlite;

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::errors::RepositoryResult;
use crate::domain::models::{NewOrder, Order, OrderId, OrderStatus, UserId};
use crate::domain::repository::OrderRepository;

pub use sqlite::SqliteOrderRepository;

/// Orders kept in process memory. Ids start at 1 and never repeat.
pub struct InMemoryOrderRepository {
    state: RwLock<MemoryState>,
}

struct MemoryState {
    orders: BTreeMap<OrderId, Order>,
    next_id: i64,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                orders: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: NewOrder) -> RepositoryResult<Order> {
        let mut state = self.state.write().await;
        let id = OrderId(state.next_id);
        state.next_id += 1;

        let order = Order::new(id, order, OrderStatus::New);
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn list_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|order| order.owner() == owner)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> RepositoryResult<Option<Order>> {
        let mut state = self.state.write().await;
        match state.orders.get_mut(&id) {
            Some(order) if order.status() == expected => {
                order.set_status(next);
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }
}
