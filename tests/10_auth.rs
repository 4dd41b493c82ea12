mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_and_index_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "ok");

    let (status, body) = app.request(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn login_whoami_logout_cycle() {
    let app = TestApp::new().await;
    app.register("ada", "student").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let token = app.login("ada").await;
    let (status, body) = app.get("/api/auth/whoami", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "ada");
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["is_admin"], false);

    let (status, _) = app.post("/api/auth/logout", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/auth/whoami", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn refresh_replaces_the_token() {
    let app = TestApp::new().await;
    let (_, token) = app.user("ada", "student").await;

    let (status, body) = app.post("/api/auth/refresh", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = app.get("/api/auth/whoami", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/auth/whoami", &fresh).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_tampered_tokens_are_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.user("ada", "student").await;

    let (status, _) = app.request(Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let tampered = format!("{}x", token);
    let (status, _) = app.get("/api/projects", &tampered).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("ada", "student").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "ada", "email": "other@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already taken.");

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "grace", "email": "ADA@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered.");
}

#[tokio::test]
async fn short_passwords_are_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "ada", "email": "ada@example.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["password"].is_string());
}

#[tokio::test]
async fn registration_can_be_disabled() {
    let mut config = common::test_config();
    config.security.allow_registration = false;
    let app = TestApp::with_config(config).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "ada", "email": "ada@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn username_may_not_shadow_an_email() {
    let app = TestApp::new().await;
    app.register("ada", "student").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "ada@example.com", "email": "mallory@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["username"].is_string());

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
