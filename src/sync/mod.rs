//! Room state synchronization: fetch, normalize, derive, publish.
//!
//! [`RoomSync`] owns the only copy of the render model. The poll loop or
//! push subscription writes it (`poller`), user intents go out through the
//! dispatcher (`dispatch`), and readers get snapshots or a `watch`
//! receiver.

pub mod dispatch;
pub mod normalize;
pub mod poller;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::api::BackingStore;
use crate::error::AppError;
use crate::models::payload::{self, RawPayload};
use crate::models::{AggregateView, KeyScheme, RoomCollection};
use crate::session::SessionSource;

pub use normalize::normalize;
pub use poller::{LoopOptions, Overlap, SyncHandle};

/// The render model: rooms plus what is derived from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub rooms: RoomCollection,
    #[serde(flatten)]
    pub aggregate: AggregateView,
    /// Set once a fetch has succeeded.
    #[serde(skip)]
    pub synced: bool,
}

pub struct RoomSync {
    store: Arc<dyn BackingStore>,
    session: Arc<dyn SessionSource>,
    state: watch::Sender<Snapshot>,
}

impl RoomSync {
    pub fn new(store: Arc<dyn BackingStore>, session: Arc<dyn SessionSource>) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            store,
            session,
            state,
        }
    }

    pub fn key_scheme(&self) -> KeyScheme {
        self.store.key_scheme()
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every published change.
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// One fetch cycle. The session is checked before anything goes on the
    /// wire; on any failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.session.require()?;
        let payload = self.store.fetch_all().await?;
        self.apply(&payload)
    }

    /// Replace the model wholesale from a payload.
    pub fn apply(&self, payload: &RawPayload) -> Result<(), AppError> {
        let rooms = normalize(payload, self.store.key_scheme())?;
        let aggregate = AggregateView::derive(&rooms, payload::logged_in_users(payload));
        tracing::debug!(
            "synced {} rooms ({} on, {} off)",
            rooms.len(),
            aggregate.on_count,
            aggregate.off_count
        );
        self.publish(Snapshot {
            rooms,
            aggregate,
            synced: true,
        });
        Ok(())
    }

    fn publish(&self, next: Snapshot) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Optimistic all-on indicator, ahead of the store confirming.
    fn assume_all(&self, on: bool) {
        self.state.send_if_modified(|current| {
            if current.aggregate.all_on == on {
                return false;
            }
            current.aggregate.all_on = on;
            true
        });
    }
}
