//! Shared fixtures for end-to-end tests: a canned-response transport and
//! payload builders for the consumed endpoints.

use async_trait::async_trait;
use mirrortube::upstream::{FetchResponse, Transport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const DIRECTORY_URL: &str = "https://directory.test/instances.json";

/// Transport serving queued canned responses per URL. The last queued
/// response for a URL repeats; unknown URLs fail like a dead host.
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Result<FetchResponse, TransportError>>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
        }
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(FetchResponse {
                status,
                body: body.to_string(),
            }));
    }

    pub fn fail(&self, url: &str) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Err(TransportError::Timeout));
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<FetchResponse, TransportError> {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| {
                Err(TransportError::Connection(format!("drained route {}", url)))
            }),
            None => Err(TransportError::Connection(format!("no route for {}", url))),
        }
    }
}

/// Directory payload listing https API instances with the given host names.
pub fn directory_body(names: &[&str]) -> String {
    let entries: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!([
                name,
                {
                    "api": true,
                    "type": "https",
                    "uri": format!("https://{}", name),
                    "region": "US",
                    "monitor": {"90dRatio": {"ratio": "99.5"}}
                }
            ])
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

/// Feed payload of `(videoId, published)` items.
pub fn feed_body(items: &[(&str, i64)]) -> String {
    let entries: Vec<serde_json::Value> = items
        .iter()
        .map(|(id, published)| {
            serde_json::json!({
                "videoId": id,
                "title": format!("video {}", id),
                "author": "someone",
                "authorId": "UCsomeone",
                "lengthSeconds": 100,
                "published": published,
                "viewCount": 7,
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

pub fn popular_url(instance: &str) -> String {
    format!("https://{}/api/v1/popular", instance)
}
