use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use super::sse::EventParser;
use super::{BackingStore, Capabilities, Subscription};
use crate::error::AppError;
use crate::models::payload::{self, RawPayload};
use crate::models::KeyScheme;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const UPDATE_BUFFER: usize = 16;

/// Push-variant adapter: a hosted realtime database reached through its
/// REST and event-stream endpoints. Room keys live at the root.
#[derive(Clone)]
pub struct RealtimeClient {
    client: reqwest::Client,
    base_url: String,
    auth: Option<String>,
}

/// Body of a `put`/`patch` stream event.
#[derive(Debug, Deserialize)]
struct Change {
    path: String,
    data: Value,
}

enum StreamEnd {
    Closed,
    Revoked(String),
}

impl RealtimeClient {
    pub fn new(base_url: &str, auth: Option<String>) -> Result<Self, AppError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::InvalidInput(format!(
                "Store URL must start with http:// or https://: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("roomctl/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            auth,
        })
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}.json", self.base_url, key)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, AppError> {
        let response = self.authorize(request).send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Api {
                message: format!("{}: {}", status, body),
                status: Some(status.as_u16()),
            })
        }
    }

    /// Cheap reachability check: shallow read of the root.
    pub async fn probe(&self) -> Result<(), AppError> {
        let url = self.url("");
        tracing::debug!("GET {} (shallow)", url);
        self.send(self.client.get(&url).query(&[("shallow", "true")]))
            .await
            .map(|_| ())
    }

    /// Server-side increment of a counter key; `delta` may be negative.
    pub async fn adjust_counter(&self, key: &str, delta: i64) -> Result<(), AppError> {
        let url = self.url(key);
        tracing::debug!("PUT {} increment {}", url, delta);
        self.send(
            self.client
                .put(&url)
                .json(&json!({".sv": {"increment": delta}})),
        )
        .await
        .map(|_| ())
    }

    async fn stream_once(
        &self,
        updates: &mpsc::Sender<Result<RawPayload, AppError>>,
    ) -> Result<StreamEnd, AppError> {
        let url = self.url("");
        tracing::debug!("GET {} (event stream)", url);
        let response = self
            .send(self.client.get(&url).header(ACCEPT, "text/event-stream"))
            .await?;

        let mut parser = EventParser::new();
        let mut mirror = Value::Null;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            for event in parser.push(&chunk?) {
                match event.event.as_str() {
                    "put" | "patch" => {
                        let change: Change = serde_json::from_str(&event.data)?;
                        tracing::debug!("{} {}", event.event, change.path);
                        apply_change(&mut mirror, &change.path, change.data, event.event == "patch");
                        if updates.send(payload::from_value(mirror.clone())).await.is_err() {
                            return Ok(StreamEnd::Closed);
                        }
                    }
                    "keep-alive" => {}
                    "cancel" | "auth_revoked" => return Ok(StreamEnd::Revoked(event.event)),
                    other => tracing::debug!("ignoring stream event {:?}", other),
                }
            }
        }

        Ok(StreamEnd::Closed)
    }

    /// Keeps the stream open until the subscriber goes away, reconnecting
    /// after the server closes it.
    async fn stream_forever(self, updates: mpsc::Sender<Result<RawPayload, AppError>>) {
        loop {
            match self.stream_once(&updates).await {
                Ok(StreamEnd::Closed) => tracing::debug!("event stream closed"),
                Ok(StreamEnd::Revoked(reason)) => {
                    let _ = updates
                        .send(Err(AppError::Api {
                            message: format!("subscription ended by store: {}", reason),
                            status: None,
                        }))
                        .await;
                    return;
                }
                Err(e) => {
                    if updates.send(Err(e)).await.is_err() {
                        return;
                    }
                }
            }
            if updates.is_closed() {
                return;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

/// Apply a stream event to the local copy of the tree. `put` replaces the
/// value at `path` (null deletes it); `patch` merges child keys.
fn apply_change(root: &mut Value, path: &str, data: Value, merge: bool) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        if merge {
            merge_into(root, data);
        } else {
            *root = data;
        }
        return;
    };

    let mut node = root;
    for segment in parents {
        node = child(node, segment);
    }

    if merge {
        merge_into(child(node, last), data);
    } else if data.is_null() {
        if let Value::Object(map) = node {
            map.remove(*last);
        }
    } else {
        *child(node, last) = data;
    }
}

fn child<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    &mut node[key]
}

fn merge_into(target: &mut Value, data: Value) {
    let Value::Object(entries) = data else {
        *target = data;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        for (key, value) in entries {
            if value.is_null() {
                map.remove(&key);
            } else {
                map.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl BackingStore for RealtimeClient {
    fn key_scheme(&self) -> KeyScheme {
        KeyScheme::Realtime
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            push: true,
            bulk_write: true,
        }
    }

    async fn fetch_all(&self) -> Result<RawPayload, AppError> {
        let url = self.url("");
        tracing::debug!("GET {}", url);
        let body: Value = self.send(self.client.get(&url)).await?.json().await?;
        payload::from_value(body)
    }

    async fn write_one(&self, key: &str, on: bool) -> Result<bool, AppError> {
        let url = self.url(key);
        tracing::debug!("PUT {} = {}", url, on);
        self.send(self.client.put(&url).json(&on)).await?;
        Ok(true)
    }

    /// One PATCH at the root: every listed key changes together and
    /// unlisted siblings (the user counter) are left alone.
    async fn write_many(&self, updates: &BTreeMap<String, bool>) -> Result<(), AppError> {
        let url = self.url("");
        tracing::debug!("PATCH {} ({} keys)", url, updates.len());
        self.send(self.client.patch(&url).json(updates)).await?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<Option<Subscription>, AppError> {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let task = tokio::spawn(self.clone().stream_forever(tx));
        Ok(Some(Subscription::new(rx, task)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_put_replaces_tree() {
        let mut root = json!({"Room1": true});
        apply_change(&mut root, "/", json!({"Room2": false}), false);
        assert_eq!(root, json!({"Room2": false}));
    }

    #[test]
    fn test_key_put_and_delete() {
        let mut root = json!({"Room1": true, "Room2": true});
        apply_change(&mut root, "/Room2", json!(false), false);
        assert_eq!(root, json!({"Room1": true, "Room2": false}));
        apply_change(&mut root, "/Room1", Value::Null, false);
        assert_eq!(root, json!({"Room2": false}));
    }

    #[test]
    fn test_root_patch_merges() {
        let mut root = json!({"Room1": true, "loggedInUsers": 2});
        apply_change(&mut root, "/", json!({"Room1": false, "Room2": false}), true);
        assert_eq!(root, json!({"Room1": false, "Room2": false, "loggedInUsers": 2}));
    }

    #[test]
    fn test_put_into_empty_tree() {
        let mut root = Value::Null;
        apply_change(&mut root, "/Room4", json!(true), false);
        assert_eq!(root, json!({"Room4": true}));
    }

    #[test]
    fn test_nested_path() {
        let mut root = json!({});
        apply_change(&mut root, "/meta/site", json!("north"), false);
        assert_eq!(root, json!({"meta": {"site": "north"}}));
    }

    #[test]
    fn test_rejects_bare_host() {
        assert!(RealtimeClient::new("lights.example.com", None).is_err());
        let client = RealtimeClient::new("https://lights.example.com/", None).unwrap();
        assert_eq!(client.url(""), "https://lights.example.com/.json");
        assert_eq!(client.url("Room1"), "https://lights.example.com/Room1.json");
    }
}
