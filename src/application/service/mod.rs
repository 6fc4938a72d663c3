// src/application/service/mod.rs
// Notification routing

pub mod render;

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::TransportResult;
use crate::domain::models::{DeliveryPoint, Order, OrderId, UserId};
use crate::domain::service::{Controls, MessageRef, Messenger};

/// Operator messages remembered for button refreshes. Older orders fall back to
/// the message the button was pressed on.
pub const TRACKED_ORDERS: usize = 500;

/// Decides who hears about each state change and what controls they get.
///
/// Delivery is best effort: failures are logged and never undo the change that
/// caused the notification.
pub struct NotificationRouter {
    messenger: Arc<dyn Messenger>,
    operator: UserId,
    // Operator message carrying the action buttons for each live order.
    admin_messages: Mutex<BTreeMap<OrderId, MessageRef>>,
}

impl NotificationRouter {
    pub fn new(messenger: Arc<dyn Messenger>, operator: UserId) -> Self {
        Self {
            messenger,
            operator,
            admin_messages: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn operator(&self) -> UserId {
        self.operator
    }

    /// New order: summary and action buttons to the operator, confirmation to the customer.
    pub async fn order_submitted(&self, order: &Order) {
        let summary = render::operator_summary(order);
        let controls = render::operator_controls(order);

        let admin_message = match order.delivery() {
            DeliveryPoint::Location(location) => {
                self.send(self.operator, &summary, None).await;
                self.log_failure(
                    self.messenger
                        .send_location(self.operator, *location, controls.as_ref())
                        .await,
                    self.operator,
                )
            }
            DeliveryPoint::Address(_) => {
                self.send(self.operator, &summary, controls.as_ref()).await
            }
        };
        if let Some(message) = admin_message {
            let mut messages = self.admin_messages.lock().await;
            messages.insert(order.id(), message);
            while messages.len() > TRACKED_ORDERS {
                if let Some((oldest, _)) = messages.pop_first() {
                    log::debug!("No longer tracking operator message of order #{}", oldest);
                }
            }
        }

        self.send(
            order.owner(),
            &render::customer_confirmation(order),
            Some(&render::main_menu()),
        )
        .await;
    }

    /// Status moved: tell the customer and refresh the operator's buttons.
    pub async fn status_changed(&self, order: &Order, origin: Option<MessageRef>) {
        self.send(order.owner(), &render::status_update(order), None)
            .await;
        self.refresh_controls(order, origin).await;
    }

    /// Re-renders the operator buttons for the order's current status.
    pub async fn refresh_controls(&self, order: &Order, origin: Option<MessageRef>) {
        let controls = render::operator_controls(order);
        let target = {
            let mut messages = self.admin_messages.lock().await;
            let recorded = if controls.is_none() {
                messages.remove(&order.id())
            } else {
                messages.get(&order.id()).copied()
            };
            origin.or(recorded)
        };

        let Some(message) = target else {
            log::debug!("No operator message to refresh for order #{}", order.id());
            return;
        };
        if let Err(e) = self.messenger.edit_controls(message, controls.as_ref()).await {
            log::error!(
                "Failed to refresh controls for order #{}: {}",
                order.id(),
                e
            );
        }
    }

    pub async fn send(
        &self,
        recipient: UserId,
        text: &str,
        controls: Option<&Controls>,
    ) -> Option<MessageRef> {
        let result = self.messenger.send_text(recipient, text, controls).await;
        self.log_failure(result, recipient)
    }

    pub async fn send_photo(
        &self,
        recipient: UserId,
        photo: &str,
        caption: &str,
        controls: Option<&Controls>,
    ) -> Option<MessageRef> {
        let result = self
            .messenger
            .send_photo(recipient, photo, caption, controls)
            .await;
        self.log_failure(result, recipient)
    }

    pub async fn acknowledge(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.messenger.acknowledge(callback_id, text).await {
            log::warn!("Failed to acknowledge button press: {}", e);
        }
    }

    fn log_failure<T>(&self, result: TransportResult<T>, recipient: UserId) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to notify {}: {}", recipient, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Location, NewOrder, OrderStatus, Phone};
    use crate::testing::{Outgoing, RecordingMessenger};

    const OPERATOR: UserId = UserId(1);
    const CUSTOMER: UserId = UserId(50);

    fn order(status: OrderStatus, delivery: DeliveryPoint) -> Order {
        Order::new(
            OrderId(9),
            NewOrder {
                owner: CUSTOMER,
                owner_name: "Dilnoza".into(),
                phone: Phone::parse("998901112233").unwrap(),
                products: vec!["Lavash".into()],
                total: 28000,
                delivery,
            },
            status,
        )
    }

    #[tokio::test]
    async fn submission_sends_location_with_controls_to_operator() {
        let messenger = Arc::new(RecordingMessenger::default());
        let router = NotificationRouter::new(messenger.clone(), OPERATOR);
        let location = Location::new(41.3, 69.2);

        router
            .order_submitted(&order(OrderStatus::New, DeliveryPoint::Location(location)))
            .await;

        let sent = messenger.sent().await;
        assert_eq!(sent.len(), 3);
        assert!(matches!(&sent[0], Outgoing::Text { recipient, controls: None, .. } if *recipient == OPERATOR));
        match &sent[1] {
            Outgoing::Location { recipient, location: l, controls, .. } => {
                assert_eq!(*recipient, OPERATOR);
                assert_eq!(*l, location);
                assert_eq!(controls.as_ref().unwrap().payloads(), vec!["cook:9", "cancel:9"]);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(matches!(&sent[2], Outgoing::Text { recipient, .. } if *recipient == CUSTOMER));
    }

    #[tokio::test]
    async fn status_change_edits_recorded_operator_message() {
        let messenger = Arc::new(RecordingMessenger::default());
        let router = NotificationRouter::new(messenger.clone(), OPERATOR);

        router
            .order_submitted(&order(OrderStatus::New, DeliveryPoint::Address("Yunusobod 4".into())))
            .await;
        let admin_ref = messenger.sent().await[0].message_ref();

        router
            .status_changed(&order(OrderStatus::Cooking, DeliveryPoint::Address("Yunusobod 4".into())), None)
            .await;

        let edits = messenger.edits().await;
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, admin_ref);
        assert_eq!(edits[0].1.as_ref().unwrap().payloads(), vec!["courier:9", "cancel:9"]);

        let sent = messenger.sent().await;
        assert!(matches!(sent.last(), Some(Outgoing::Text { recipient, text, .. })
            if *recipient == CUSTOMER && text.contains("prepared")));
    }

    #[tokio::test]
    async fn terminal_status_removes_controls() {
        let messenger = Arc::new(RecordingMessenger::default());
        let router = NotificationRouter::new(messenger.clone(), OPERATOR);
        let origin = MessageRef { chat: OPERATOR, message_id: 77 };

        router
            .status_changed(&order(OrderStatus::Cancelled, DeliveryPoint::Address("x".into())), Some(origin))
            .await;

        assert_eq!(messenger.edits().await, vec![(origin, None)]);
    }

    #[tokio::test]
    async fn only_the_newest_operator_messages_are_tracked() {
        let messenger = Arc::new(RecordingMessenger::default());
        let router = NotificationRouter::new(messenger.clone(), OPERATOR);
        let numbered = |id: i64, status| {
            let details = order(status, DeliveryPoint::Address("Sergeli 7".into()))
                .details()
                .clone();
            Order::new(OrderId(id), details, status)
        };

        for id in 1..=TRACKED_ORDERS as i64 + 1 {
            router.order_submitted(&numbered(id, OrderStatus::New)).await;
        }
        assert_eq!(router.admin_messages.lock().await.len(), TRACKED_ORDERS);

        router.status_changed(&numbered(1, OrderStatus::Cooking), None).await;
        assert!(messenger.edits().await.is_empty());

        router.status_changed(&numbered(2, OrderStatus::Cooking), None).await;
        assert_eq!(messenger.edits().await.len(), 1);
    }

    #[tokio::test]
    async fn delivery_failures_do_not_propagate() {
        let messenger = Arc::new(RecordingMessenger::failing());
        let router = NotificationRouter::new(messenger.clone(), OPERATOR);

        router
            .order_submitted(&order(OrderStatus::New, DeliveryPoint::Address("x".into())))
            .await;
        router
            .status_changed(&order(OrderStatus::Cooking, DeliveryPoint::Address("x".into())), None)
            .await;

        assert!(messenger.sent().await.is_empty());
    }
}
