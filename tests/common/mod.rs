#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use cohort_api::config::AppConfig;
use cohort_api::database::DatabaseManager;
use cohort_api::{app, AppState};

/// Router over a fresh, migrated in-memory database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = DatabaseManager::connect_in_memory().await.expect("in-memory pool");
        DatabaseManager::migrate(&pool).await.expect("migrations");

        let state = AppState::new(pool, config);
        Self {
            router: app(state.clone()),
            state,
        }
    }

    /// Send one request and return the status with the decoded JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Register an account and return its id.
    pub async fn register(&self, username: &str, role: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "password123",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
        body["data"]["id"].as_i64().expect("user id")
    }

    pub async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);
        body["data"]["token"].as_str().expect("token").to_string()
    }

    /// Register and log in; returns `(user_id, token)`.
    pub async fn user(&self, username: &str, role: &str) -> (i64, String) {
        let id = self.register(username, role).await;
        (id, self.login(username).await)
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config
}

pub fn project_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "A tracker for cohort projects",
        "github_link": format!("https://github.com/acme/{}", name.to_lowercase()),
    })
}
