//! Shared harness: the real router on an ephemeral port, in-memory storage,
//! a mock completion backend, and a clock pinned to Sat 2025-02-01 09:00.

#![allow(dead_code)]

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use steward_api::{build_router, AppState, ServerConfig};
use steward_core::parse_canonical;
use steward_db::Database;
use steward_inference::{CompletionSettings, MockGenerationBackend};

pub const ORG: &str = "org@x.io";
pub const BOB: &str = "bob@x.io";
pub const CAROL: &str = "carol@x.io";
pub const NOW: &str = "2025-02-01T09:00";

pub struct TestServer {
    pub base: String,
    pub client: reqwest::Client,
    pub backend: MockGenerationBackend,
    pub db: Database,
}

impl TestServer {
    pub async fn spawn(backend: MockGenerationBackend) -> Self {
        Self::spawn_with_db(backend, Database::in_memory()).await
    }

    /// Serve from `db`, which tests may have rewired with their own repositories.
    pub async fn spawn_with_db(backend: MockGenerationBackend, db: Database) -> Self {
        let config = ServerConfig {
            rate_limit_enabled: false,
            ..ServerConfig::default()
        };
        let state = AppState::new(
            db.clone(),
            Arc::new(backend.clone()),
            CompletionSettings::default(),
            &config,
        )
        .with_clock(Arc::new(|| parse_canonical(NOW).unwrap()));
        let app = build_router(state, &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            backend,
            db,
        }
    }

    pub fn request(&self, method: Method, path: &str, who: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base, path))
            .header("x-user-email", who)
    }

    pub async fn get(&self, path: &str, who: &str) -> (StatusCode, Value) {
        send(self.request(Method::GET, path, who)).await
    }

    pub async fn post(&self, path: &str, who: &str, body: Value) -> (StatusCode, Value) {
        send(self.request(Method::POST, path, who).json(&body)).await
    }

    pub async fn post_empty(&self, path: &str, who: &str) -> (StatusCode, Value) {
        send(self.request(Method::POST, path, who)).await
    }
}

pub async fn send(request: RequestBuilder) -> (StatusCode, Value) {
    let response = request.send().await.unwrap();
    let status = response.status();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}
