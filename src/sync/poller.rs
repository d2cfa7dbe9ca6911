use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};

use super::RoomSync;
use crate::api::Subscription;
use crate::error::AppError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// What a pull tick does when the previous fetch has not come back yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Overlap {
    /// Single-flight: skip the tick.
    #[default]
    Skip,
    /// Issue another fetch anyway; whichever completes last wins.
    Allow,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub interval: Duration,
    pub overlap: Overlap,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            overlap: Overlap::default(),
        }
    }
}

/// Owner of a running sync loop. Dropping or stopping it cancels the
/// timer, or releases the store subscription.
pub struct SyncHandle {
    task: Option<JoinHandle<Result<(), AppError>>>,
}

impl SyncHandle {
    /// Resolves when the loop ends by itself: the session went away
    /// (`NotConnected`) or the store closed the subscription.
    pub async fn finished(&mut self) -> Result<(), AppError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let result = task.await;
        self.task = None;
        flatten(result)
    }

    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

fn flatten(result: Result<Result<(), AppError>, JoinError>) -> Result<(), AppError> {
    match result {
        Ok(inner) => inner,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(AppError::Task(e.to_string())),
    }
}

impl RoomSync {
    /// Start keeping the snapshot fresh: a push subscription when the store
    /// offers one, otherwise an immediate fetch followed by one per
    /// `interval`.
    pub async fn start(self: &Arc<Self>, options: LoopOptions) -> Result<SyncHandle, AppError> {
        self.session.require()?;

        let sync = Arc::clone(self);
        let task = match self.store.subscribe().await? {
            Some(subscription) => {
                tracing::debug!("listening for store changes");
                tokio::spawn(listen(sync, subscription))
            }
            None => {
                tracing::debug!("polling every {:?} ({:?})", options.interval, options.overlap);
                tokio::spawn(poll(sync, options))
            }
        };

        Ok(SyncHandle { task: Some(task) })
    }
}

async fn poll(sync: Arc<RoomSync>, options: LoopOptions) -> Result<(), AppError> {
    let mut ticker = time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut fetches = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            Some(done) = fetches.join_next() => match done {
                Ok(Ok(())) => {}
                Ok(Err(AppError::NotConnected)) => return Err(AppError::NotConnected),
                Ok(Err(e)) if e.is_connectivity() => tracing::error!("Error fetching rooms: {}", e),
                Ok(Err(e)) => tracing::warn!("Fetched rooms could not be applied: {}", e),
                Err(e) => tracing::error!("Fetch task failed: {}", e),
            },

            _ = ticker.tick() => {
                if options.overlap == Overlap::Skip && !fetches.is_empty() {
                    tracing::debug!("previous fetch still in flight, skipping tick");
                    continue;
                }
                let sync = Arc::clone(&sync);
                fetches.spawn(async move { sync.refresh().await });
            }
        }
    }
}

async fn listen(sync: Arc<RoomSync>, mut subscription: Subscription) -> Result<(), AppError> {
    while let Some(update) = subscription.next().await {
        sync.session.require()?;
        if let Err(e) = update.and_then(|payload| sync.apply(&payload)) {
            tracing::error!("Error applying store update: {}", e);
        }
    }
    tracing::warn!("store subscription ended");
    Ok(())
}
