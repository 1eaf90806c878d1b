//! Realtime database client over the REST streaming protocol.
//!
//! Writes are plain `PUT`/`PATCH` requests against `<origin>/<path>.json`.
//! Subscriptions open a `text/event-stream` GET on the same URL; the server
//! answers with `put` and `patch` events relative to the subscribed path,
//! which a background task folds into a local copy of the value.

use super::{
    path_segments, write_at, RealtimeError, RealtimeStore, Subscription, SubscriptionEvent,
};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use url::Url;

const CLIENT_USER_AGENT: &str = "fbcli";

/// Payload of `put` and `patch` stream events
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamPayload {
    pub path: String,
    pub data: Value,
}

/// What a single server-sent event means for the subscribed value
#[derive(Debug, PartialEq)]
pub enum StreamOutcome {
    /// The cached value changed and must be published
    Changed,
    /// Nothing to publish
    Ignored,
    /// The server ended the subscription
    Closed(String),
}

/// Fold one stream event into `cache`, the current value at the subscribed path
pub fn apply_stream_event(
    cache: &mut Value,
    event: &str,
    data: &str,
) -> Result<StreamOutcome, RealtimeError> {
    match event {
        "put" => {
            let payload: StreamPayload = serde_json::from_str(data)?;
            write_at(cache, &path_segments(&payload.path), payload.data);
            Ok(StreamOutcome::Changed)
        }
        "patch" => {
            let payload: StreamPayload = serde_json::from_str(data)?;
            let base = path_segments(&payload.path);
            let Value::Object(fields) = payload.data else {
                return Err(RealtimeError::StreamError(format!(
                    "patch at {} does not carry an object",
                    payload.path
                )));
            };
            for (key, value) in fields {
                let mut target = base.clone();
                target.extend(path_segments(&key));
                write_at(cache, &target, value);
            }
            Ok(StreamOutcome::Changed)
        }
        "keep-alive" => Ok(StreamOutcome::Ignored),
        "cancel" | "auth_revoked" => Ok(StreamOutcome::Closed(data.to_string())),
        other => {
            trace!("Ignoring unknown stream event {}", other);
            Ok(StreamOutcome::Ignored)
        }
    }
}

pub struct RealtimeClient {
    origin: Url,
    client: Client,
}

impl RealtimeClient {
    pub fn new(origin: Url) -> Result<Self, RealtimeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { origin, client })
    }

    /// REST URL of a database path
    pub fn url_for(&self, path: &str) -> Result<Url, RealtimeError> {
        let segments = path_segments(path);
        let Some((last, parents)) = segments.split_last() else {
            return Err(RealtimeError::InvalidPath(path.to_string()));
        };

        let mut url = self.origin.clone();
        url.path_segments_mut()
            .map_err(|_| RealtimeError::InvalidPath(path.to_string()))?
            .pop_if_empty()
            .extend(parents)
            .push(&format!("{}.json", last));
        Ok(url)
    }

    async fn check_status(
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RealtimeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read error response body: {}", e);
                String::new()
            }
        };
        Err(RealtimeError::StatusError {
            path: path.to_string(),
            status,
            body,
        })
    }
}

#[async_trait]
impl RealtimeStore for RealtimeClient {
    async fn set(&self, path: &str, value: Value) -> Result<(), RealtimeError> {
        let url = self.url_for(path)?;
        debug!("PUT {}", url);

        let response = self.client.put(url).json(&value).send().await?;
        Self::check_status(path, response).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), RealtimeError> {
        let url = self.url_for(path)?;
        debug!("PATCH {}", url);

        let response = self.client.patch(url).json(&fields).send().await?;
        Self::check_status(path, response).await?;
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, RealtimeError> {
        let url = self.url_for(path)?;
        debug!("Opening event stream on {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = Self::check_status(path, response).await?;

        let (sender, receiver) = mpsc::unbounded_channel::<SubscriptionEvent>();
        let stream_path = path.to_string();
        let reader = tokio::spawn(async move {
            let mut cache = Value::Null;
            let mut stream = response.bytes_stream().eventsource();

            while let Some(event) = stream.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Event stream error on {}: {}", stream_path, e);
                        let _ = sender.send(Err(RealtimeError::StreamError(e.to_string())));
                        return;
                    }
                };

                let delivered = match apply_stream_event(&mut cache, &event.event, &event.data) {
                    Ok(StreamOutcome::Changed) => {
                        let current = if cache.is_null() {
                            None
                        } else {
                            Some(cache.clone())
                        };
                        sender.send(Ok(current))
                    }
                    Ok(StreamOutcome::Ignored) => continue,
                    Ok(StreamOutcome::Closed(reason)) => {
                        warn!("Server closed event stream on {}: {}", stream_path, reason);
                        let _ = sender.send(Err(RealtimeError::Cancelled(stream_path.clone())));
                        return;
                    }
                    Err(e) => sender.send(Err(e)),
                };

                if delivered.is_err() {
                    trace!("Subscriber for {} went away", stream_path);
                    return;
                }
            }

            debug!("Event stream on {} ended", stream_path);
        });

        Ok(Subscription::new(path.to_string(), receiver, Some(reader)))
    }
}
