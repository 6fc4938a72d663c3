// src/application/usecase/intake_usecase.rs
// Conversational order intake

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::dto::Sender;
use crate::application::service::{render, NotificationRouter};
use crate::domain::catalog::{Catalog, Product};
use crate::domain::errors::{IntakeError, IntakeResult};
use crate::domain::models::{DeliveryPoint, Draft, DraftField, Location, Order};
use crate::domain::repository::{OrderRepository, SessionStore};
use crate::domain::service::Controls;

/// Drives a customer from an empty draft to a submitted order.
#[async_trait]
pub trait IntakeUseCase: Send + Sync {
    /// Starts a fresh draft, discarding any abandoned one, and shows the menu.
    async fn start_flow(&self, sender: &Sender) -> IntakeResult<()>;

    async fn select_product(&self, sender: &Sender, name: &str) -> IntakeResult<()>;

    async fn view_cart(&self, sender: &Sender) -> IntakeResult<()>;

    async fn finish_selection(&self, sender: &Sender) -> IntakeResult<()>;

    async fn share_location(&self, sender: &Sender, location: Location) -> IntakeResult<()>;

    /// Routes text to whichever draft field is still missing.
    async fn free_text(&self, sender: &Sender, text: &str) -> IntakeResult<()>;

    /// Drops drafts that have been idle too long. Returns how many were dropped.
    async fn evict_expired(&self) -> usize;
}

pub struct IntakeProcessor {
    catalog: Arc<Catalog>,
    sessions: Mutex<Box<dyn SessionStore>>,
    orders: Arc<dyn OrderRepository>,
    router: Arc<NotificationRouter>,
}

impl IntakeProcessor {
    pub fn new(
        catalog: Arc<Catalog>,
        sessions: Box<dyn SessionStore>,
        orders: Arc<dyn OrderRepository>,
        router: Arc<NotificationRouter>,
    ) -> Self {
        Self {
            catalog,
            sessions: Mutex::new(sessions),
            orders,
            router,
        }
    }

    /// The sender's live draft. Any event that reaches a draft counts as activity.
    async fn draft(&self, sender: &Sender) -> IntakeResult<Draft> {
        self.sessions
            .lock()
            .await
            .touch(sender.id)
            .ok_or(IntakeError::NoActiveDraft)
    }

    pub async fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let evicted = sessions.evict_expired(now);
        if evicted > 0 {
            log::info!(
                "Evicted {} abandoned draft(s), {} still open",
                evicted,
                sessions.len()
            );
        }
        evicted
    }

    async fn add_to_cart(&self, sender: &Sender, product: &Product) -> IntakeResult<()> {
        let draft = self
            .sessions
            .lock()
            .await
            .update(sender.id, &mut |draft: &mut Draft| draft.add_product(product))?;

        log::debug!(
            "User {} added {} (cart total {})",
            sender.id,
            product.name,
            draft.total()
        );
        self.router
            .send(sender.id, &render::product_added(product, &draft), None)
            .await;
        Ok(())
    }

    async fn set_delivery(&self, sender: &Sender, delivery: DeliveryPoint) -> IntakeResult<()> {
        self.sessions
            .lock()
            .await
            .update(sender.id, &mut |draft: &mut Draft| {
                draft.set_delivery(delivery.clone())
            })?;
        log::debug!("User {} delivers to {}", sender.id, delivery);

        self.router
            .send(sender.id, render::PHONE_PROMPT, Some(&Controls::Remove))
            .await;
        Ok(())
    }

    /// Validates the phone on a copy of the draft and persists the order. The
    /// draft is cleared only once the order is stored, so a failed write leaves
    /// the customer still being asked for a phone.
    async fn submit(&self, sender: &Sender, draft: Draft, phone: &str) -> IntakeResult<Order> {
        let mut complete = draft;
        complete.set_phone(phone)?;
        let new_order = complete.to_new_order(&sender.display_name)?;

        let order = self.orders.create(new_order).await.map_err(|e| {
            log::error!("Failed to store order for user {}: {}", sender.id, e);
            e
        })?;
        self.sessions.lock().await.clear(sender.id);

        log::info!(
            "Order #{} created for user {}: {} item(s), total {}",
            order.id(),
            sender.id,
            order.products().len(),
            order.total()
        );
        self.router.order_submitted(&order).await;
        Ok(order)
    }
}

#[async_trait]
impl IntakeUseCase for IntakeProcessor {
    async fn start_flow(&self, sender: &Sender) -> IntakeResult<()> {
        self.sessions.lock().await.get_or_create(sender.id);
        log::debug!("User {} started a new order", sender.id);

        self.router
            .send(
                sender.id,
                render::MENU_PROMPT,
                Some(&render::product_menu(&self.catalog)),
            )
            .await;
        Ok(())
    }

    async fn select_product(&self, sender: &Sender, name: &str) -> IntakeResult<()> {
        self.draft(sender).await?;
        let product = self
            .catalog
            .get(name)
            .ok_or_else(|| IntakeError::UnknownProduct(name.to_string()))?;
        self.add_to_cart(sender, product).await
    }

    async fn view_cart(&self, sender: &Sender) -> IntakeResult<()> {
        let draft = self.draft(sender).await?;
        let controls = match draft.next_field() {
            DraftField::Product => Some(render::product_menu(&self.catalog)),
            _ => None,
        };
        self.router
            .send(sender.id, &render::cart_summary(&draft), controls.as_ref())
            .await;
        Ok(())
    }

    async fn finish_selection(&self, sender: &Sender) -> IntakeResult<()> {
        self.draft(sender).await?;
        let draft = self
            .sessions
            .lock()
            .await
            .update(sender.id, &mut |draft: &mut Draft| draft.close_selection())?;

        self.router
            .send(sender.id, &render::cart_summary(&draft), None)
            .await;
        self.router
            .send(
                sender.id,
                render::LOCATION_PROMPT,
                Some(&render::location_request()),
            )
            .await;
        Ok(())
    }

    async fn share_location(&self, sender: &Sender, location: Location) -> IntakeResult<()> {
        self.draft(sender).await?;
        self.set_delivery(sender, DeliveryPoint::Location(location))
            .await
    }

    async fn free_text(&self, sender: &Sender, text: &str) -> IntakeResult<()> {
        let draft = self.draft(sender).await?;

        match draft.next_field() {
            DraftField::Product => {
                let product = self
                    .catalog
                    .find(text)
                    .ok_or_else(|| IntakeError::UnknownProduct(text.to_string()))?;
                self.add_to_cart(sender, product).await
            }
            DraftField::Delivery => {
                let address = text.trim();
                if address.is_empty() {
                    return Err(IntakeError::OutOfOrder {
                        expected: DraftField::Delivery,
                    });
                }
                self.set_delivery(sender, DeliveryPoint::Address(address.to_string()))
                    .await
            }
            DraftField::Phone => self.submit(sender, draft, text).await.map(|_| ()),
            DraftField::Complete => Err(IntakeError::OutOfOrder {
                expected: DraftField::Complete,
            }),
        }
    }

    async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now()).await
    }
}
