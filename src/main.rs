// src/main.rs
use std::sync::Arc;
use tokio::signal::ctrl_c;

use delivery_bot::adapter::{BotCoordinator, Dispatcher};
use delivery_bot::application::service::NotificationRouter;
use delivery_bot::application::usecase::{FulfillmentProcessor, HistoryProcessor, IntakeProcessor};
use delivery_bot::config::{Config, StorageBackend};
use delivery_bot::domain::errors::AppResult;
use delivery_bot::domain::repository::OrderRepository;
use delivery_bot::infrastructure::session::InMemorySessionStore;
use delivery_bot::infrastructure::storage::{InMemoryOrderRepository, SqliteOrderRepository};
use delivery_bot::infrastructure::telegram::TelegramClient;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    config.init_logging()?;

    log::info!("Starting delivery_bot v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Configuration: {:?}", config);

    let catalog = Arc::new(config.load_catalog()?);
    log::info!("Menu has {} products", catalog.products().len());

    let orders = create_order_repository(&config).await?;

    let telegram = Arc::new(TelegramClient::new(
        &config.telegram.api_url,
        &config.telegram.token,
        config.poll_timeout(),
    ));
    let router = Arc::new(NotificationRouter::new(telegram.clone(), config.operator()));

    let intake = Arc::new(IntakeProcessor::new(
        catalog.clone(),
        Box::new(InMemorySessionStore::new(config.draft_ttl())),
        orders.clone(),
        router.clone(),
    ));
    let fulfillment = Arc::new(FulfillmentProcessor::new(orders.clone(), router.clone()));
    let history = Arc::new(HistoryProcessor::new(orders, router.clone()));

    let dispatcher = Arc::new(Dispatcher::new(
        intake,
        fulfillment,
        history,
        router,
        catalog,
        config.telegram.welcome_photo.clone(),
    ));

    let mut coordinator = BotCoordinator::new(
        telegram,
        dispatcher,
        config.sweep_interval(),
        config.telegram.skip_pending_updates,
    );

    // Wait for shutdown signal
    log::info!("Bot is running. Press Ctrl+C to stop.");
    coordinator
        .run(async {
            if let Err(e) = ctrl_c().await {
                log::error!("Failed to listen for control-c event: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    log::info!("Shutdown complete. Goodbye!");
    Ok(())
}

/// Create the order repository selected by configuration
async fn create_order_repository(config: &Config) -> AppResult<Arc<dyn OrderRepository>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let repo = SqliteOrderRepository::connect(&config.storage.database_url).await?;
            Ok(Arc::new(repo))
        }
        StorageBackend::Memory => {
            log::warn!("Using in-memory order storage; orders are lost on restart");
            Ok(Arc::new(InMemoryOrderRepository::new()))
        }
    }
}
