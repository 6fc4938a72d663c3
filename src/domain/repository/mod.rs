// src/domain/repository/mod.rs
// Repository interfaces for domain entities

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::{IntakeResult, RepositoryResult};
use crate::domain::models::{Draft, NewOrder, Order, OrderId, OrderStatus, UserId};

/// Durable store of submitted orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order with status `New` and a fresh, increasing id.
    async fn create(&self, order: NewOrder) -> RepositoryResult<Order>;

    async fn get(&self, id: OrderId) -> RepositoryResult<Option<Order>>;

    /// Orders owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Order>>;

    /// Compare-and-set status write. Returns the updated order, or `None` when the
    /// order is missing or its status is no longer `expected`.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> RepositoryResult<Option<Order>>;
}

/// Holds at most one in-progress draft per user. Ephemeral.
pub trait SessionStore: Send {
    /// Starts a fresh draft for `user`, discarding any previous one.
    fn get_or_create(&mut self, user: UserId) -> Draft;

    fn get(&self, user: UserId) -> Option<Draft>;

    /// Marks the user's draft as active now and returns it, if it is still live.
    fn touch(&mut self, user: UserId) -> Option<Draft>;

    /// Applies `mutator` to the user's draft. The change is kept only if the
    /// mutator succeeds; the updated draft is returned.
    fn update(
        &mut self,
        user: UserId,
        mutator: &mut dyn FnMut(&mut Draft) -> IntakeResult<()>,
    ) -> IntakeResult<Draft>;

    fn clear(&mut self, user: UserId) -> Option<Draft>;

    /// Drops drafts that have been idle past the store's time-to-live.
    fn evict_expired(&mut self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;
}
