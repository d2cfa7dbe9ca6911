//! In-memory `BackingStore` for unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{BackingStore, Capabilities, Subscription};
use crate::error::AppError;
use crate::models::payload::{self, RawPayload};
use crate::models::KeyScheme;
use crate::session::context::parse_device_address;
use crate::session::ConnectionContext;

pub struct MockStore {
    scheme: KeyScheme,
    state: Mutex<Value>,
    writes: Mutex<Vec<(String, bool)>>,
    bulk_writes: Mutex<Vec<BTreeMap<String, bool>>>,
    listener: Mutex<Option<mpsc::Sender<Result<RawPayload, AppError>>>>,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    ack: AtomicBool,
    fail: AtomicBool,
    fetch_delay: Mutex<Duration>,
}

impl MockStore {
    fn with_scheme(scheme: KeyScheme, state: Value) -> Self {
        Self {
            scheme,
            state: Mutex::new(state),
            writes: Mutex::new(Vec::new()),
            bulk_writes: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            ack: AtomicBool::new(true),
            fail: AtomicBool::new(false),
            fetch_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Pull-style store holding `room<N>` → 0/1.
    pub fn device(state: Value) -> Self {
        Self::with_scheme(KeyScheme::Device, state)
    }

    /// Push-style store holding `Room<N>` → bool.
    pub fn realtime(state: Value) -> Self {
        Self::with_scheme(KeyScheme::Realtime, state)
    }

    pub fn context(&self) -> ConnectionContext {
        match self.scheme {
            KeyScheme::Device => ConnectionContext::Device {
                address: parse_device_address("127.0.0.1").unwrap(),
            },
            KeyScheme::Realtime => ConnectionContext::User {
                store_url: "http://127.0.0.1".into(),
                auth: None,
                session_id: "test".into(),
                connected_at: Utc::now(),
            },
        }
    }

    /// Change the stored state as another client would.
    pub fn replace(&self, state: Value) {
        *self.state.lock().unwrap() = state;
        self.notify();
    }

    pub fn acknowledge(&self, ack: bool) {
        self.ack.store(ack, Ordering::SeqCst);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(String, bool)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn bulk_writes(&self) -> Vec<BTreeMap<String, bool>> {
        self.bulk_writes.lock().unwrap().clone()
    }

    fn current(&self) -> Result<RawPayload, AppError> {
        payload::from_value(self.state.lock().unwrap().clone())
    }

    fn set(&self, key: String, on: bool) {
        let value = match self.scheme {
            KeyScheme::Device => Value::from(on as i64),
            KeyScheme::Realtime => Value::Bool(on),
        };
        let mut state = self.state.lock().unwrap();
        if !state.is_object() {
            *state = Value::Object(Default::default());
        }
        state[key] = value;
    }

    fn notify(&self) {
        if let Some(tx) = self.listener.lock().unwrap().as_ref() {
            let _ = tx.try_send(self.current());
        }
    }
}

#[async_trait]
impl BackingStore for MockStore {
    fn key_scheme(&self) -> KeyScheme {
        self.scheme
    }

    fn capabilities(&self) -> Capabilities {
        let realtime = self.scheme == KeyScheme::Realtime;
        Capabilities {
            push: realtime,
            bulk_write: realtime,
        }
    }

    async fn fetch_all(&self) -> Result<RawPayload, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Api {
                message: "mock fetch failure".into(),
                status: Some(503),
            });
        }
        self.current()
    }

    async fn write_one(&self, key: &str, on: bool) -> Result<bool, AppError> {
        if !self.ack.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.writes.lock().unwrap().push((key.to_string(), on));
        let key = match self.scheme {
            KeyScheme::Device => format!("{}{}", self.scheme.prefix(), key),
            KeyScheme::Realtime => key.to_string(),
        };
        self.set(key, on);
        self.notify();
        Ok(true)
    }

    async fn write_many(&self, updates: &BTreeMap<String, bool>) -> Result<(), AppError> {
        if !self.capabilities().bulk_write {
            return Err(AppError::UnsupportedOperation("bulk write".into()));
        }
        self.bulk_writes.lock().unwrap().push(updates.clone());
        for (key, on) in updates {
            self.set(key.clone(), *on);
        }
        self.notify();
        Ok(())
    }

    async fn subscribe(&self) -> Result<Option<Subscription>, AppError> {
        if !self.capabilities().push {
            return Ok(None);
        }
        let (tx, rx) = mpsc::channel(16);
        let _ = tx.try_send(self.current());
        *self.listener.lock().unwrap() = Some(tx);
        let task = tokio::spawn(async {});
        Ok(Some(Subscription::new(rx, task)))
    }
}
