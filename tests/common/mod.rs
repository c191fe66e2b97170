#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use tours_api_rust::mail::MockMailer;
use tours_api_rust::routes;
use tours_api_rust::state::AppState;
use tours_api_rust::store::{Document, MemoryStore, Store};

pub struct TestServer {
    pub base_url: String,
    pub mailer: MockMailer,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// In-process server on an ephemeral port, backed by the in-memory store and
/// a capturing mailer.
pub async fn spawn_server() -> TestServer {
    let store = Arc::new(MemoryStore::with_default_indexes());
    let mailer = MockMailer::new();
    let state = AppState::new(store.clone(), Arc::new(mailer.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, routes::app(state))
            .await
            .expect("test server");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        mailer,
        store,
    }
}

pub fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected JSON object"),
    }
}

/// Register an account through the API and return (token, user id).
pub async fn register_user(
    client: &reqwest::Client,
    server: &TestServer,
    name: &str,
    email: &str,
    password: &str,
) -> (String, String) {
    let response = client
        .post(server.url("/api/users/register"))
        .json(&json!({"name": name, "email": email, "password": password}))
        .send()
        .await
        .expect("register request");
    assert_eq!(response.status(), 201, "register should succeed");
    let body: Value = response.json().await.expect("register body");
    let token = body["data"]["token"].as_str().expect("token").to_string();
    let id = body["data"]["user"]["id"].as_str().expect("id").to_string();
    (token, id)
}

/// Rewrite an account's role directly in the store.
pub async fn set_role(server: &TestServer, user_id: &str, role: &str) {
    let id: Uuid = user_id.parse().expect("uuid");
    let mut doc = server
        .store
        .find_by_id("users", id)
        .await
        .expect("load user")
        .expect("user exists");
    doc.insert("role".to_string(), json!(role));
    server
        .store
        .update_by_id("users", id, doc)
        .await
        .expect("update user");
}

/// Seed a tour directly in the store, bypassing the admin route.
pub async fn seed_tour(server: &TestServer, fields: Value) -> String {
    let doc = server
        .store
        .insert("tours", object(fields))
        .await
        .expect("seed tour");
    doc["id"].as_str().expect("tour id").to_string()
}
