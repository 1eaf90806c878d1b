//! Access to the realtime database used as the pairing channel.
//!
//! The database is a path-addressed JSON tree. Callers write whole values,
//! apply multi-field updates atomically, and subscribe to the value stored
//! at a path. [`RealtimeClient`] talks to the hosted service over REST and
//! server-sent events; [`MemoryStore`] keeps the tree in process.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

pub mod client;
pub mod memory;

pub use client::RealtimeClient;
pub use memory::MemoryStore;

/// Error emitted by a realtime store
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("request to {path} failed with status {status}: {body}")]
    StatusError {
        path: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid database path {0:?}")]
    InvalidPath(String),
    #[error("event stream error: {0}")]
    StreamError(String),
    #[error("subscription to {0} was cancelled by the server")]
    Cancelled(String),
    #[error("subscription to {0} closed before a value arrived")]
    SubscriptionClosed(String),
    #[error("{0}")]
    Unavailable(String),
}

/// Placeholders resolved by the database when a write is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerValue {
    /// Milliseconds since the Unix epoch on the server clock
    Timestamp,
}

impl ServerValue {
    pub fn to_value(&self) -> Value {
        match self {
            ServerValue::Timestamp => json!({ ".sv": "timestamp" }),
        }
    }

    /// Recognise a placeholder inside a value about to be written
    pub fn from_value(value: &Value) -> Option<ServerValue> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        match map.get(".sv").and_then(Value::as_str) {
            Some("timestamp") => Some(ServerValue::Timestamp),
            _ => None,
        }
    }
}

impl From<ServerValue> for Value {
    fn from(server_value: ServerValue) -> Self {
        server_value.to_value()
    }
}

/// A change notification: the value now stored at the subscribed path, or
/// `None` when nothing is stored there.
pub type SubscriptionEvent = Result<Option<Value>, RealtimeError>;

/// Live subscription to the value at one path.
///
/// The first event describes the value at the moment of subscribing. The
/// subscription is torn down by [`Subscription::unsubscribe`] or on drop.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    receiver: mpsc::UnboundedReceiver<SubscriptionEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        path: String,
        receiver: mpsc::UnboundedReceiver<SubscriptionEvent>,
        reader: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            path,
            receiver,
            reader,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next change. `None` means the subscription has ended.
    pub async fn next_value(&mut self) -> Option<SubscriptionEvent> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.receiver.close();
        trace!("Unsubscribed from {}", self.path);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// A path-addressed, subscribable JSON tree
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Replace the value at `path`. Server values are resolved on write.
    async fn set(&self, path: &str, value: Value) -> Result<(), RealtimeError>;

    /// Write several children of `path` in one atomic operation. A `null`
    /// field removes that child.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), RealtimeError>;

    /// Subscribe to the value stored at `path`
    async fn subscribe(&self, path: &str) -> Result<Subscription, RealtimeError>;
}

/// Split a database path into its non-empty segments
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join two database paths
pub fn child_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_matches('/');
    let child = child.trim_matches('/');
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{}/{}", parent, child),
    }
}

/// Read the value stored under `segments`, treating `null` as absent
pub fn read_at<'a>(node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = node;
    for segment in segments {
        current = current.as_object()?.get(*segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Store `value` under `segments`, creating intermediate objects.
///
/// Writing `null` removes the child, and objects left empty collapse to
/// `null`, so an empty subtree is indistinguishable from a missing one.
pub fn write_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = &mut *node else {
        return;
    };

    let child = map.entry(head.to_string()).or_insert(Value::Null);
    write_at(child, rest, value);
    if child.is_null() {
        map.remove(*head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}
