/// In-process stand-in for the Kick API, served by axum on an ephemeral port.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use chatlog_shared::config::Config;

use crate::client::KickClient;

#[derive(Clone, Default)]
pub struct MockUpstream {
    channels: HashMap<String, u64>,
    /// Page bodies keyed by the `start_time` query value.
    pages: HashMap<String, Value>,
    failures: HashSet<String>,
    stalls: HashSet<String>,
    requests: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, username: &str, id: u64) -> Self {
        self.channels.insert(username.to_string(), id);
        self
    }

    pub fn with_page(mut self, start_time: &str, body: Value) -> Self {
        self.pages.insert(start_time.to_string(), body);
        self
    }

    /// Answer this second with a 500.
    pub fn with_failure(mut self, start_time: &str) -> Self {
        self.failures.insert(start_time.to_string());
        self
    }

    /// Never answer this second within a test's lifetime.
    pub fn with_stall(mut self, start_time: &str) -> Self {
        self.stalls.insert(start_time.to_string());
        self
    }

    /// `start_time` values of every message page request seen so far.
    pub fn page_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Arrival time of every message page request seen so far.
    pub fn page_request_times(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    /// Bind, spawn the server and return a client pointed at it.
    pub async fn serve(self) -> (KickClient, JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route("/api/v2/channels/:channel", get(channel))
            .route("/api/v2/channels/:channel/messages", get(messages))
            .with_state(Arc::new(self));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = Config {
            api_base: format!("http://{}/api/v2", addr),
            ..Config::default()
        };
        (KickClient::new(&config).unwrap(), handle)
    }
}

/// Build a page body from `(sender, content, created_at)` triples.
pub fn page_json(messages: &[(&str, &str, &str)]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|(sender, content, created_at)| {
            json!({
                "content": content,
                "created_at": created_at,
                "sender": { "username": sender },
            })
        })
        .collect();
    json!({ "data": { "messages": messages } })
}

async fn channel(
    State(upstream): State<Arc<MockUpstream>>,
    Path(name): Path<String>,
) -> Response {
    match upstream.channels.get(&name) {
        Some(id) => Json(json!({ "id": id, "slug": name })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" }))).into_response(),
    }
}

async fn messages(
    State(upstream): State<Arc<MockUpstream>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let start_time = query.get("start_time").cloned().unwrap_or_default();
    upstream
        .requests
        .lock()
        .unwrap()
        .push((start_time.clone(), Instant::now()));

    if upstream.stalls.contains(&start_time) {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    if upstream.failures.contains(&start_time) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let body = upstream
        .pages
        .get(&start_time)
        .cloned()
        .unwrap_or_else(|| json!({ "data": { "messages": [] } }));
    Json(body).into_response()
}
