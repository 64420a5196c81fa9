#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use inventory_check::{
    client::ApiClient,
    events::{EventSender, Notification},
    workflow::{CheckDependencies, CheckSession},
};
use serde_json::Value;
use tokio::sync::mpsc;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "test-token-123";

/// Harness around a mock backend serving the REST API under `/api/v1`.
pub struct TestBackend {
    pub server: MockServer,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}/api/v1", self.server.uri())
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url(), Some(TEST_TOKEN), Duration::from_secs(5))
            .expect("client should build")
    }

    pub fn session(&self) -> CheckSession {
        CheckSession::new(CheckDependencies::from_client(Arc::new(self.client())))
    }

    /// Session wired to a notification channel.
    pub fn session_with_events(&self) -> (CheckSession, mpsc::Receiver<Notification>) {
        let (events, rx) = EventSender::channel(64);
        (self.session().with_events(events), rx)
    }

    /// Serve `body` with status 200 for `GET /api/v1/{route}`.
    pub async fn mock_get(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{route}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_get_status(&self, route: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/{route}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mount the warehouse list and product catalog most scenarios start from.
    pub async fn mock_catalog(&self) {
        self.mock_get(
            "warehouses",
            serde_json::json!({ "data": [{ "id": "W1", "name": "Main Store" }] }),
        )
        .await;
        self.mock_get(
            "products",
            serde_json::json!([
                { "id": "P1", "name": "Rice" },
                { "id": "P2", "name": "Oil", "image": "https://cdn.example.com/oil.png" }
            ]),
        )
        .await;
    }
}

/// Drain notifications already delivered.
pub fn drain(rx: &mut mpsc::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        out.push(notice);
    }
    out
}
