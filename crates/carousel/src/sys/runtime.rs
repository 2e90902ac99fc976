use crate::animator::{RunId, TickScheduler};
use crate::config;
use crate::events::CarouselEvent;
use async_channel::Sender;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Owns the tokio runtime that feeds timer ticks and config reloads to the UI thread.
pub struct BackgroundServices {
    runtime: Runtime,
}

impl BackgroundServices {
    pub fn start() -> std::io::Result<Self> {
        Ok(Self {
            runtime: Runtime::new()?,
        })
    }

    pub fn scheduler(&self, tx: Sender<CarouselEvent>) -> TokioScheduler {
        TokioScheduler::new(self.runtime.handle().clone(), tx)
    }

    /// Reports changes to `config_path` as [`CarouselEvent::ConfigReload`].
    pub fn watch_config(
        &self,
        config_path: PathBuf,
        tx: Sender<CarouselEvent>,
    ) -> JoinHandle<()> {
        self.runtime.spawn(async move {
            if let Err(e) = config::run_async_watcher(config_path, tx).await {
                log::error!("Config watcher error: {}", e);
            }
        })
    }
}

/// One interval task per animation run. Ticks are sent as [`CarouselEvent::Tick`]; a task
/// whose receiver is gone stops by itself.
#[derive(Debug)]
pub struct TokioScheduler {
    handle: Handle,
    tx: Sender<CarouselEvent>,
    tasks: HashMap<RunId, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(handle: Handle, tx: Sender<CarouselEvent>) -> Self {
        Self {
            handle,
            tx,
            tasks: HashMap::new(),
        }
    }

    pub fn is_running(&self, run: RunId) -> bool {
        self.tasks.get(&run).is_some_and(|t| !t.is_finished())
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule(&mut self, run: RunId, interval: Duration) {
        self.tasks.retain(|_, task| !task.is_finished());

        let tx = self.tx.clone();
        let task = self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if tx.send(CarouselEvent::Tick(run)).await.is_err() {
                    log::debug!("{} timer stopped, carousel is gone", run);
                    break;
                }
            }
        });
        self.tasks.insert(run, task);
    }

    fn cancel(&mut self, run: RunId) {
        if let Some(task) = self.tasks.remove(&run) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
