mod common;

use serde_json::{json, Value};

use common::{register_user, spawn_server};

fn extract_secret(mail_text: &str) -> String {
    let marker = "/api/users/reset-password/";
    let start = mail_text.find(marker).expect("reset link in mail") + marker.len();
    mail_text[start..start + 64].to_string()
}

#[tokio::test]
async fn forgot_reset_login_round_trip() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &server, "Lena", "lena@example.test", "pass1234").await;

    let response = client
        .post(server.url("/api/users/forgot-password"))
        .json(&json!({"email": "lena@example.test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "lena@example.test");
    let secret = extract_secret(&sent[0].text);

    let reset = client
        .patch(server.url(&format!("/api/users/reset-password/{secret}")))
        .json(&json!({"password": "brand-new-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status(), 200);
    let body: Value = reset.json().await.unwrap();
    assert!(body["data"]["token"].is_string());

    let old_login = client
        .post(server.url("/api/users/login"))
        .json(&json!({"email": "lena@example.test", "password": "pass1234"}))
        .send()
        .await
        .unwrap();
    assert_eq!(old_login.status(), 401);

    let new_login = client
        .post(server.url("/api/users/login"))
        .json(&json!({"email": "lena@example.test", "password": "brand-new-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(new_login.status(), 200);
}

#[tokio::test]
async fn reset_secret_is_single_use() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &server, "Lena", "lena@example.test", "pass1234").await;

    client
        .post(server.url("/api/users/forgot-password"))
        .json(&json!({"email": "lena@example.test"}))
        .send()
        .await
        .unwrap();
    let secret = extract_secret(&server.mailer.sent()[0].text);

    let first = client
        .patch(server.url(&format!("/api/users/reset-password/{secret}")))
        .json(&json!({"password": "first-new-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .patch(server.url(&format!("/api/users/reset-password/{secret}")))
        .json(&json!({"password": "second-new-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 403);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], json!("Reset token is invalid or has expired"));
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/api/users/forgot-password"))
        .json(&json!({"email": "ghost@example.test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(server.mailer.sent().is_empty());
}

#[tokio::test]
async fn bogus_secret_is_rejected() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &server, "Lena", "lena@example.test", "pass1234").await;

    let response = client
        .patch(server.url(&format!("/api/users/reset-password/{}", "ab".repeat(32))))
        .json(&json!({"password": "new-pass"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn delivery_failure_reports_a_server_error() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    register_user(&client, &server, "Lena", "lena@example.test", "pass1234").await;

    server.mailer.fail_next();
    let response = client
        .post(server.url("/api/users/forgot-password"))
        .json(&json!({"email": "lena@example.test"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
}
