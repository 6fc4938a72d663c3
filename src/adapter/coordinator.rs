// src/adapter/coordinator.rs
// Bot coordinator: polling loop, draft sweeping and shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::adapter::dispatcher::Dispatcher;
use crate::infrastructure::telegram::UpdateSource;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

pub struct BotCoordinator {
    source: Arc<dyn UpdateSource>,
    dispatcher: Arc<Dispatcher>,
    sweep_interval: Duration,
    skip_pending: bool,
    offset: Option<i64>,
    running: bool,
}

impl BotCoordinator {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        dispatcher: Arc<Dispatcher>,
        sweep_interval: Duration,
        skip_pending: bool,
    ) -> Self {
        Self {
            source,
            dispatcher,
            sweep_interval,
            skip_pending,
            offset: None,
            running: false,
        }
    }

    /// Polls for updates and handles them one at a time, in arrival order,
    /// until `shutdown` resolves.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
        self.start().await;
        tokio::pin!(shutdown);

        let first_sweep = tokio::time::Instant::now() + self.sweep_interval;
        let mut sweep = tokio::time::interval_at(first_sweep, self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut failures: u32 = 0;

        while self.running {
            let batch = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break;
                }
                _ = sweep.tick() => {
                    self.dispatcher.evict_expired().await;
                    continue;
                }
                batch = self.source.next_batch(self.offset) => batch,
            };

            match batch {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        self.offset = Some(update.update_id + 1);
                        self.dispatcher.handle_update(&update).await;
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff(failures);
                    log::error!(
                        "Failed to fetch updates ({} in a row), retrying in {:?}: {}",
                        failures,
                        delay,
                        e
                    );
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.stop();
    }

    async fn start(&mut self) {
        if self.skip_pending {
            match self.source.skip_pending().await {
                Ok(next) => self.offset = next.or(self.offset),
                Err(e) => log::warn!("Could not skip pending updates: {}", e),
            }
        }
        self.running = true;
        log::info!("Bot coordinator started");
    }

    fn stop(&mut self) {
        self.running = false;
        log::info!("Bot coordinator stopped");
    }
}

fn backoff(failures: u32) -> Duration {
    let secs = 1u64 << failures.saturating_sub(1).min(6);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
