// src/adapter/dispatcher.rs
// Routes classified events to the use cases

use std::sync::Arc;

use crate::adapter::classifier::{self, Rejected};
use crate::application::dto::{Envelope, InboundEvent, Sender};
use crate::application::service::{render, NotificationRouter};
use crate::application::usecase::{FulfillmentUseCase, HistoryUseCase, IntakeUseCase};
use crate::domain::catalog::Catalog;
use crate::domain::errors::{FulfillmentError, IntakeError, IntakeResult};
use crate::domain::models::OperatorAction;
use crate::domain::service::{Controls, MessageRef};
use crate::infrastructure::telegram::Update;

/// Handles one inbound event at a time. Failures are logged and, where the
/// user can act on them, answered with a notice; nothing here is fatal.
pub struct Dispatcher {
    intake: Arc<dyn IntakeUseCase>,
    fulfillment: Arc<dyn FulfillmentUseCase>,
    history: Arc<dyn HistoryUseCase>,
    router: Arc<NotificationRouter>,
    catalog: Arc<Catalog>,
    welcome_photo: Option<String>,
}

impl Dispatcher {
    pub fn new(
        intake: Arc<dyn IntakeUseCase>,
        fulfillment: Arc<dyn FulfillmentUseCase>,
        history: Arc<dyn HistoryUseCase>,
        router: Arc<NotificationRouter>,
        catalog: Arc<Catalog>,
        welcome_photo: Option<String>,
    ) -> Self {
        Self {
            intake,
            fulfillment,
            history,
            router,
            catalog,
            welcome_photo,
        }
    }

    pub async fn handle_update(&self, update: &Update) {
        match classifier::classify(update) {
            Some(Ok(envelope)) => self.dispatch(envelope).await,
            Some(Err(rejected)) => self.reject(rejected).await,
            None => log::debug!("Ignoring update {}", update.update_id),
        }
    }

    pub async fn dispatch(&self, envelope: Envelope) {
        let Envelope {
            sender,
            event,
            callback_id,
            origin,
        } = envelope;

        let mut ack: Option<String> = None;
        match event {
            InboundEvent::Greet => self.greet(&sender).await,
            InboundEvent::StartFlow => {
                let result = self.intake.start_flow(&sender).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::SelectProduct(name) => {
                let result = self.intake.select_product(&sender, &name).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::ViewCart => {
                let result = self.intake.view_cart(&sender).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::FinishSelection => {
                let result = self.intake.finish_selection(&sender).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::ShareLocation(location) => {
                let result = self.intake.share_location(&sender, location).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::FreeText(text) => {
                let result = self.intake.free_text(&sender, &text).await;
                self.report_intake(&sender, result).await;
            }
            InboundEvent::OperatorAction(action) => {
                ack = Some(self.operator_action(&sender, action, origin).await);
            }
            InboundEvent::ListMyOrders => {
                if let Err(e) = self.history.list_my_orders(sender.id).await {
                    log::error!("Failed to list orders of user {}: {}", sender.id, e);
                    self.router
                        .send(sender.id, render::TRY_AGAIN_LATER, None)
                        .await;
                }
            }
        }

        if let Some(callback_id) = callback_id {
            self.router.acknowledge(&callback_id, ack.as_deref()).await;
        }
    }

    pub async fn evict_expired(&self) -> usize {
        self.intake.evict_expired().await
    }

    async fn greet(&self, sender: &Sender) {
        let menu = render::main_menu();
        if let Some(photo) = &self.welcome_photo {
            let sent = self
                .router
                .send_photo(sender.id, photo, render::GREETING, Some(&menu))
                .await;
            if sent.is_some() {
                return;
            }
        }
        self.router
            .send(sender.id, render::GREETING, Some(&menu))
            .await;
    }

    async fn reject(&self, rejected: Rejected) {
        log::warn!(
            "Rejected button press from {}: {}",
            rejected.sender,
            rejected.error
        );
        self.router
            .acknowledge(&rejected.callback_id, Some(render::INVALID_BUTTON))
            .await;
    }

    async fn report_intake(&self, sender: &Sender, result: IntakeResult<()>) {
        let Err(err) = result else {
            return;
        };

        match &err {
            IntakeError::NoActiveDraft | IntakeError::OutOfOrder { .. } => {
                log::debug!("Ignoring input from {}: {}", sender.id, err);
            }
            IntakeError::InvalidPhone(_) | IntakeError::EmptyCart | IntakeError::CartTooLarge => {
                log::info!("Re-prompting {}: {}", sender.id, err);
            }
            IntakeError::UnknownProduct(_) => {
                log::warn!("User {} asked for an unknown product: {}", sender.id, err);
            }
            IntakeError::Repository(_) => {
                log::error!("Dropped event from {}: {}", sender.id, err);
            }
        }

        let Some(notice) = render::intake_notice(&err) else {
            return;
        };
        let controls: Option<Controls> = match err {
            IntakeError::UnknownProduct(_) | IntakeError::EmptyCart => {
                Some(render::product_menu(&self.catalog))
            }
            _ => None,
        };
        self.router
            .send(sender.id, &notice, controls.as_ref())
            .await;
    }

    /// Returns the text to acknowledge the button press with.
    async fn operator_action(
        &self,
        sender: &Sender,
        action: OperatorAction,
        origin: Option<MessageRef>,
    ) -> String {
        if sender.id != self.router.operator() {
            log::warn!(
                "User {} is not the operator, refusing {}:{}",
                sender.id,
                action.verb,
                action.order_id
            );
            return render::NOT_ALLOWED.to_string();
        }

        match self.fulfillment.apply(action, origin).await {
            Ok(order) => order.status().label().to_string(),
            Err(FulfillmentError::OrderNotFound(id)) => {
                log::warn!("Operator action on unknown order #{}", id);
                let text = render::order_not_found(id);
                self.router.send(sender.id, &text, None).await;
                text
            }
            Err(FulfillmentError::IllegalTransition { from, .. }) => {
                log::warn!(
                    "Refused {} on order #{} in status {}",
                    action.verb,
                    action.order_id,
                    from
                );
                render::illegal_action(from)
            }
            Err(FulfillmentError::Conflict(id)) => {
                log::warn!("Order #{} changed while applying {}", id, action.verb);
                render::ORDER_CHANGED.to_string()
            }
            Err(err @ FulfillmentError::Repository(_)) => {
                log::error!(
                    "Failed to apply {} to order #{}: {}",
                    action.verb,
                    action.order_id,
                    err
                );
                render::TRY_AGAIN_LATER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::usecase::{FulfillmentProcessor, HistoryProcessor, IntakeProcessor};
    use crate::domain::models::{ActionVerb, Location, OrderId, OrderStatus, UserId};
    use crate::domain::repository::OrderRepository;
    use crate::domain::workflow;
    use crate::infrastructure::session::InMemorySessionStore;
    use crate::infrastructure::storage::InMemoryOrderRepository;
    use crate::infrastructure::telegram::dto::{CallbackQuery, User};
    use crate::testing::{Outgoing, RecordingMessenger};

    const OPERATOR: UserId = UserId(1);
    const CUSTOMER: UserId = UserId(100);

    struct Bot {
        dispatcher: Dispatcher,
        orders: Arc<InMemoryOrderRepository>,
        messenger: Arc<RecordingMessenger>,
        presses: std::sync::atomic::AtomicUsize,
    }

    fn bot_with_photo(welcome_photo: Option<String>) -> Bot {
        let messenger = Arc::new(RecordingMessenger::default());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(Catalog::default());
        let router = Arc::new(NotificationRouter::new(messenger.clone(), OPERATOR));

        let intake = Arc::new(IntakeProcessor::new(
            catalog.clone(),
            Box::new(InMemorySessionStore::default()),
            orders.clone(),
            router.clone(),
        ));
        let fulfillment = Arc::new(FulfillmentProcessor::new(orders.clone(), router.clone()));
        let history = Arc::new(HistoryProcessor::new(orders.clone(), router.clone()));

        Bot {
            dispatcher: Dispatcher::new(intake, fulfillment, history, router, catalog, welcome_photo),
            orders,
            messenger,
            presses: Default::default(),
        }
    }

    fn bot() -> Bot {
        bot_with_photo(None)
    }

    fn person(id: UserId) -> Sender {
        Sender {
            id,
            display_name: if id == OPERATOR { "Operator" } else { "Ali Valiyev" }.to_string(),
        }
    }

    impl Bot {
        async fn say(&self, from: UserId, event: InboundEvent) {
            self.dispatcher.dispatch(Envelope::new(person(from), event)).await;
        }

        async fn press(&self, from: UserId, event: InboundEvent, origin: Option<MessageRef>) {
            let n = self
                .presses
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.dispatcher
                .dispatch(Envelope::from_button(
                    person(from),
                    event,
                    format!("cb{}", n),
                    origin,
                ))
                .await;
        }

        async fn last_ack(&self) -> Option<String> {
            self.messenger.acks().await.last().and_then(|(_, text)| text.clone())
        }

        /// Burger + Cola delivered to a shared location, ready for the phone.
        async fn fill_cart_and_location(&self) {
            self.press(CUSTOMER, InboundEvent::StartFlow, None).await;
            self.press(CUSTOMER, InboundEvent::SelectProduct("Burger".into()), None)
                .await;
            self.press(CUSTOMER, InboundEvent::SelectProduct("Cola".into()), None)
                .await;
            self.press(CUSTOMER, InboundEvent::FinishSelection, None).await;
            self.say(CUSTOMER, InboundEvent::ShareLocation(Location::new(41.3, 69.2)))
                .await;
        }

        async fn place_order(&self) -> MessageRef {
            self.fill_cart_and_location().await;
            self.say(CUSTOMER, InboundEvent::FreeText("998901234567".into()))
                .await;
            self.messenger.sent_to(OPERATOR).await[1].message_ref()
        }
    }

    fn operator_action(verb: ActionVerb, id: i64) -> InboundEvent {
        InboundEvent::OperatorAction(OperatorAction {
            verb,
            order_id: OrderId(id),
        })
    }

    fn status_messages(sent: &[Outgoing]) -> usize {
        sent.iter().filter(|m| m.text().starts_with("📦 #")).count()
    }

    #[tokio::test]
    async fn burger_and_cola_to_a_location() {
        let bot = bot();
        bot.place_order().await;

        let order = bot.orders.get(OrderId(1)).await.unwrap().unwrap();
        assert_eq!(order.total(), 35000);
        assert_eq!(order.status(), OrderStatus::New);
        assert_eq!(order.phone().as_str(), "998901234567");
        assert_eq!(order.products(), ["Burger", "Cola"]);
        assert_eq!(order.owner_name(), "Ali Valiyev");
        assert!(bot.orders.get(OrderId(2)).await.unwrap().is_none());

        let to_operator = bot.messenger.sent_to(OPERATOR).await;
        assert_eq!(to_operator.len(), 2);
        assert!(to_operator[0].text().contains("#1"));
        match &to_operator[1] {
            Outgoing::Location {
                location, controls, ..
            } => {
                assert_eq!(*location, Location::new(41.3, 69.2));
                assert_eq!(
                    controls.as_ref().unwrap().payloads(),
                    vec!["cook:1", "cancel:1"]
                );
            }
            other => panic!("expected a location message, got {:?}", other),
        }

        let to_customer = bot.messenger.sent_to(CUSTOMER).await;
        assert!(to_customer.last().unwrap().text().contains("Order #1 received"));
        assert_eq!(bot.messenger.acks().await.len(), 4);
    }

    #[tokio::test]
    async fn cook_then_repeated_cook() {
        let bot = bot();
        let admin_message = bot.place_order().await;

        bot.press(OPERATOR, operator_action(ActionVerb::Cook, 1), Some(admin_message))
            .await;

        let order = bot.orders.get(OrderId(1)).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::Cooking);
        assert_eq!(
            workflow::available_actions(order.status()),
            &[ActionVerb::Courier, ActionVerb::Cancel]
        );
        let edits = bot.messenger.edits().await;
        assert_eq!(edits.last().unwrap().0, admin_message);
        assert_eq!(
            edits.last().unwrap().1.as_ref().unwrap().payloads(),
            vec!["courier:1", "cancel:1"]
        );
        let customer_updates = status_messages(&bot.messenger.sent_to(CUSTOMER).await);
        assert_eq!(customer_updates, 1);
        assert!(bot.last_ack().await.unwrap().contains("prepared"));

        bot.press(OPERATOR, operator_action(ActionVerb::Cook, 1), Some(admin_message))
            .await;

        assert_eq!(
            bot.orders.get(OrderId(1)).await.unwrap().unwrap().status(),
            OrderStatus::Cooking
        );
        assert_eq!(status_messages(&bot.messenger.sent_to(CUSTOMER).await), 1);
        assert!(bot.last_ack().await.unwrap().starts_with("Not available"));
    }

    #[tokio::test]
    async fn short_phone_is_rejected_and_asked_again() {
        let bot = bot();
        bot.fill_cart_and_location().await;

        bot.say(CUSTOMER, InboundEvent::FreeText("12345".into())).await;
        assert!(bot.orders.get(OrderId(1)).await.unwrap().is_none());
        assert_eq!(
            bot.messenger.sent_to(CUSTOMER).await.last().unwrap().text(),
            render::PHONE_RETRY
        );

        bot.say(CUSTOMER, InboundEvent::FreeText("998901234567".into()))
            .await;
        let order = bot.orders.get(OrderId(1)).await.unwrap().unwrap();
        assert_eq!(order.phone().as_str(), "998901234567");
    }

    #[tokio::test]
    async fn customers_cannot_drive_fulfillment() {
        let bot = bot();
        bot.place_order().await;
        let sent_before = bot.messenger.sent().await.len();

        bot.press(CUSTOMER, operator_action(ActionVerb::Cancel, 1), None)
            .await;

        assert_eq!(
            bot.orders.get(OrderId(1)).await.unwrap().unwrap().status(),
            OrderStatus::New
        );
        assert_eq!(bot.messenger.sent().await.len(), sent_before);
        assert_eq!(bot.last_ack().await.as_deref(), Some(render::NOT_ALLOWED));
    }

    #[tokio::test]
    async fn unknown_order_is_reported_to_operator() {
        let bot = bot();
        bot.press(OPERATOR, operator_action(ActionVerb::Accept, 77), None)
            .await;

        let to_operator = bot.messenger.sent_to(OPERATOR).await;
        assert_eq!(to_operator.len(), 1);
        assert_eq!(to_operator[0].text(), render::order_not_found(OrderId(77)));
    }

    #[tokio::test]
    async fn malformed_button_is_acknowledged_only() {
        let bot = bot();
        let update = Update {
            update_id: 1,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "bad".into(),
                from: User {
                    id: OPERATOR.0,
                    first_name: "Operator".into(),
                    last_name: None,
                    username: None,
                },
                message: None,
                data: Some("deliver:1".into()),
            }),
        };

        bot.dispatcher.handle_update(&update).await;

        assert!(bot.messenger.sent().await.is_empty());
        assert_eq!(
            bot.messenger.acks().await,
            vec![("bad".to_string(), Some(render::INVALID_BUTTON.to_string()))]
        );
    }

    #[tokio::test]
    async fn empty_cart_gets_notice_with_menu() {
        let bot = bot();
        bot.press(CUSTOMER, InboundEvent::StartFlow, None).await;
        bot.press(CUSTOMER, InboundEvent::FinishSelection, None).await;

        let sent = bot.messenger.sent_to(CUSTOMER).await;
        let last = sent.last().unwrap();
        assert_eq!(last.text(), render::EMPTY_CART);
        assert!(last.controls().unwrap().payloads().contains(&"finish"));
    }

    #[tokio::test]
    async fn stray_text_without_draft_is_ignored() {
        let bot = bot();
        bot.say(CUSTOMER, InboundEvent::FreeText("hello".into())).await;
        bot.say(CUSTOMER, InboundEvent::ShareLocation(Location::new(0.0, 0.0)))
            .await;
        assert!(bot.messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn stale_menu_button_without_draft_is_only_acknowledged() {
        let bot = bot();
        bot.press(CUSTOMER, InboundEvent::SelectProduct("Pizza".into()), None)
            .await;
        bot.press(CUSTOMER, InboundEvent::SelectProduct("Burger".into()), None)
            .await;

        assert!(bot.messenger.sent().await.is_empty());
        assert_eq!(bot.messenger.acks().await.len(), 2);
    }

    #[tokio::test]
    async fn greeting_uses_photo_when_configured() {
        let with_photo = bot_with_photo(Some("https://example.com/menu.jpg".into()));
        with_photo.say(CUSTOMER, InboundEvent::Greet).await;
        let sent = with_photo.messenger.sent().await;
        assert!(matches!(&sent[0], Outgoing::Photo { caption, .. } if caption == render::GREETING));

        let plain = bot();
        plain.say(CUSTOMER, InboundEvent::Greet).await;
        let sent = plain.messenger.sent().await;
        assert!(matches!(&sent[0], Outgoing::Text { text, .. } if text == render::GREETING));
        assert_eq!(
            sent[0].controls().unwrap().payloads(),
            vec!["menu_order", "menu_my_orders"]
        );
    }

    #[tokio::test]
    async fn history_lists_placed_orders() {
        let bot = bot();
        bot.place_order().await;
        bot.press(CUSTOMER, InboundEvent::ListMyOrders, None).await;

        let last = bot.messenger.sent_to(CUSTOMER).await.pop().unwrap();
        assert!(last.text().contains("#1 🍔 Burger, Cola"));
    }
}
