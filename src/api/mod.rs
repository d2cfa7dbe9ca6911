pub mod device_client;
#[cfg(test)]
pub mod mock;
pub mod realtime;
pub mod sse;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::models::{KeyScheme, RawPayload};
use crate::session::ConnectionContext;

use device_client::DeviceClient;
use realtime::RealtimeClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The store notifies on change; no polling needed.
    pub push: bool,
    /// `write_many` sets sibling keys atomically.
    pub bulk_write: bool,
}

/// Uniform access to whichever backend holds the room states.
///
/// Keys passed to `write_one` are backend-native: the bare unit number for
/// the device API, the full `Room<N>` key for the realtime store.
#[async_trait]
pub trait BackingStore: Send + Sync {
    fn key_scheme(&self) -> KeyScheme;

    fn capabilities(&self) -> Capabilities;

    async fn fetch_all(&self) -> Result<RawPayload, AppError>;

    /// Returns the backend's acknowledgment; `false` means the write was refused.
    async fn write_one(&self, key: &str, on: bool) -> Result<bool, AppError>;

    async fn write_many(&self, _updates: &BTreeMap<String, bool>) -> Result<(), AppError> {
        Err(AppError::UnsupportedOperation(
            "bulk write (toggle rooms one at a time)".into(),
        ))
    }

    /// Push stores hand back a live subscription; pull stores return `None`.
    async fn subscribe(&self) -> Result<Option<Subscription>, AppError> {
        Ok(None)
    }
}

/// A live push subscription. Dropping it releases the underlying stream.
pub struct Subscription {
    updates: mpsc::Receiver<Result<RawPayload, AppError>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn new(updates: mpsc::Receiver<Result<RawPayload, AppError>>, task: JoinHandle<()>) -> Self {
        Self { updates, task }
    }

    /// Next full payload (or failure) from the store. `None` once the
    /// subscription has ended.
    pub async fn next(&mut self) -> Option<Result<RawPayload, AppError>> {
        self.updates.recv().await
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Pick the adapter for a session. Chosen once; everything downstream only
/// sees the trait.
pub fn open_store(ctx: &ConnectionContext) -> Result<Arc<dyn BackingStore>, AppError> {
    match ctx {
        ConnectionContext::Device { address } => Ok(Arc::new(DeviceClient::new(*address)?)),
        ConnectionContext::User {
            store_url, auth, ..
        } => Ok(Arc::new(RealtimeClient::new(store_url, auth.clone())?)),
    }
}
