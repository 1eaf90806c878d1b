//! In-process realtime store.
//!
//! Holds the whole tree behind a mutex and pushes changes to subscribers
//! synchronously, so a write is visible to every listener before the call
//! returns. Writes can be made to fail on demand.

use super::{
    child_path, path_segments, read_at, write_at, RealtimeError, RealtimeStore, ServerValue,
    Subscription, SubscriptionEvent,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[derive(Debug)]
struct Listener {
    path: String,
    last: Option<Value>,
    sender: mpsc::UnboundedSender<SubscriptionEvent>,
}

#[derive(Debug, Default)]
struct State {
    root: Value,
    listeners: Vec<Listener>,
    operations: usize,
    fail_next_set: bool,
    fail_next_update: bool,
}

impl State {
    fn notify(&mut self) {
        let root = &self.root;
        self.listeners.retain_mut(|listener| {
            if listener.sender.is_closed() {
                return false;
            }
            let current = read_at(root, &path_segments(&listener.path)).cloned();
            if current == listener.last {
                return true;
            }
            trace!("Notifying listener on {}", listener.path);
            listener.last = current.clone();
            listener.sender.send(Ok(current)).is_ok()
        });
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RealtimeError> {
        self.state
            .lock()
            .map_err(|_| RealtimeError::Unavailable("memory store lock poisoned".to_string()))
    }

    /// The value currently stored at `path`
    pub fn value_at(&self, path: &str) -> Option<Value> {
        let state = self.lock().ok()?;
        read_at(&state.root, &path_segments(path)).cloned()
    }

    /// Number of live subscriptions on exactly `path`
    pub fn listener_count(&self, path: &str) -> usize {
        let wanted = path_segments(path);
        match self.lock() {
            Ok(state) => state
                .listeners
                .iter()
                .filter(|l| !l.sender.is_closed() && path_segments(&l.path) == wanted)
                .count(),
            Err(_) => 0,
        }
    }

    /// Number of set, update and subscribe calls served so far
    pub fn operation_count(&self) -> usize {
        self.lock().map(|state| state.operations).unwrap_or(0)
    }

    /// Make the next `set` fail without touching the tree
    pub fn fail_next_set(&self) {
        if let Ok(mut state) = self.lock() {
            state.fail_next_set = true;
        }
    }

    /// Make the next `update` fail without touching the tree
    pub fn fail_next_update(&self) {
        if let Ok(mut state) = self.lock() {
            state.fail_next_update = true;
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Replace every server value placeholder with its resolved value
fn resolve_server_values(value: Value, timestamp: u64) -> Value {
    if let Some(ServerValue::Timestamp) = ServerValue::from_value(&value) {
        return Value::from(timestamp);
    }
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, resolve_server_values(v, timestamp)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| resolve_server_values(v, timestamp))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn set(&self, path: &str, value: Value) -> Result<(), RealtimeError> {
        let mut state = self.lock()?;
        state.operations += 1;
        if std::mem::take(&mut state.fail_next_set) {
            return Err(RealtimeError::Unavailable(format!("set {} failed", path)));
        }

        debug!("Setting {}", path);
        let value = resolve_server_values(value, now_millis());
        write_at(&mut state.root, &path_segments(path), value);
        state.notify();
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), RealtimeError> {
        let mut state = self.lock()?;
        state.operations += 1;
        if std::mem::take(&mut state.fail_next_update) {
            return Err(RealtimeError::Unavailable(format!("update {} failed", path)));
        }

        debug!("Updating {} fields at {}", fields.len(), path);
        let timestamp = now_millis();
        for (key, value) in fields {
            let target = child_path(path, &key);
            let value = resolve_server_values(value, timestamp);
            write_at(&mut state.root, &path_segments(&target), value);
        }
        state.notify();
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, RealtimeError> {
        let mut state = self.lock()?;
        state.operations += 1;

        let (sender, receiver) = mpsc::unbounded_channel();
        let current = read_at(&state.root, &path_segments(path)).cloned();
        let _ = sender.send(Ok(current.clone()));
        state.listeners.push(Listener {
            path: path.to_string(),
            last: current,
            sender,
        });

        debug!("Subscribed to {}", path);
        Ok(Subscription::new(path.to_string(), receiver, None))
    }
}
