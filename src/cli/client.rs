use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::config::{clear_session, load_server_config, require_session, Session};

/// Thin JSON client for the API: unwraps the success envelope and turns the
/// error envelope into an `anyhow` error.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    /// Anonymous client for the configured server.
    pub fn anonymous() -> anyhow::Result<Self> {
        Ok(Self::new(load_server_config()?.url, None))
    }

    /// Client carrying the stored session's token. Fails when not logged in.
    pub fn authenticated() -> anyhow::Result<(Self, Session)> {
        let session = require_session()?;
        if session.is_expired() {
            clear_session()?;
            anyhow::bail!("Session expired. Run 'cohort auth login <email>' again");
        }
        Ok((Self::new(session.server.clone(), Some(session.token.clone())), session))
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Could not reach {}: {}", self.base_url, e))?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status == StatusCode::UNAUTHORIZED && self.token.is_some() {
            clear_session()?;
            anyhow::bail!(
                "{} (session cleared, log in again)",
                error_message(&body).unwrap_or_else(|| "Unauthorized".to_string())
            );
        }

        unwrap_envelope(status, body)
    }
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error").and_then(Value::as_str).map(String::from)
}

/// Pull `data` out of a success envelope, or build an error from a failure one.
pub fn unwrap_envelope(status: StatusCode, body: Value) -> anyhow::Result<Value> {
    if status.is_success() && body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let mut message = error_message(&body).unwrap_or_else(|| format!("Request failed with status {}", status));
    if let Some(fields) = body.get("field_errors").and_then(Value::as_object) {
        let mut details: Vec<String> = fields
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg.as_str().unwrap_or_default()))
            .collect();
        details.sort();
        message = format!("{} ({})", message, details.join("; "));
    }
    anyhow::bail!(message)
}
