// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::post};
use chirp::{
    annotator::HttpAnnotator,
    config::Config,
    models::account::NewAccount,
    routes,
    state::AppState,
    store::{MemoryStore, Store},
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh identity and claims `username` for it.
    pub async fn register(&self, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let token = token_for(id);

        let response = self
            .client
            .post(self.url("/api/accounts"))
            .bearer_auth(&token)
            .json(&json!({ "username": username }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        (id, token)
    }

    /// Inserts an admin account straight into the store.
    pub async fn seed_admin(&self, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.store
            .insert_account(NewAccount {
                id,
                username: Some(username.to_string()),
                is_admin: true,
            })
            .await
            .expect("Failed to seed admin");
        (id, token_for(id))
    }

    pub async fn create_post(&self, token: &str, content: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/posts"))
            .bearer_auth(token)
            .json(&json!({ "content": content }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse post")
    }
}

pub fn token_for(id: Uuid) -> String {
    sign_jwt(id, JWT_SECRET, 600).expect("Failed to sign token")
}

/// Stand-in annotator service: topics are the `#hashtags` of the content,
/// and content containing `!fail` gets a 500.
async fn mock_analyze(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    let content = body["content"].as_str().unwrap_or_default();
    if content.contains("!fail") {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let topics: Vec<&str> = content
        .split_whitespace()
        .filter_map(|w| w.strip_prefix('#'))
        .filter(|t| !t.is_empty())
        .collect();

    Ok(Json(json!({
        "topics": topics,
        "sentiment": "neutral",
        "tone": "casual",
    })))
}

async fn spawn_annotator() -> String {
    let app = Router::new().route("/analyze", post(mock_analyze));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}/analyze", port)
}

/// Spawns the app on a random port, backed by an in-memory store and a
/// local mock annotator.
pub async fn spawn_app() -> TestApp {
    let annotator_url = spawn_annotator().await;

    let config = Config {
        database_url: String::new(),
        jwt_secret: JWT_SECRET.to_string(),
        rust_log: "error".to_string(),
        annotator_url: annotator_url.clone(),
        annotator_timeout_secs: 5,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let store = Arc::new(MemoryStore::new());
    let annotator = HttpAnnotator::new(annotator_url, Duration::from_secs(5))
        .expect("Failed to build annotator");

    let state = AppState {
        store: store.clone(),
        annotator: Arc::new(annotator),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}
