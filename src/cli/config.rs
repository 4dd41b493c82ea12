use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

const SERVER_FILE: &str = "server.json";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub updated_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// What `auth login` leaves behind for later commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub server: String,
    pub logged_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ServerConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            updated_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL.to_string())
    }
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(crate::auth::policy::ADMIN_ROLE)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Accept `host:port` or a full URL; store it without a trailing slash.
pub fn normalize_server_url(input: &str) -> anyhow::Result<String> {
    let input = input.trim();
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    let url = Url::parse(&with_scheme).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", input, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must use http or https, got '{}'", url.scheme());
    }
    if url.host_str().is_none() {
        anyhow::bail!("Server URL '{}' has no host", input);
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("COHORT_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("cohort").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Corrupt {}: {}", path.display(), e))?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn load_server_config_in(dir: &Path) -> anyhow::Result<ServerConfig> {
    Ok(read_json(&dir.join(SERVER_FILE))?.unwrap_or_default())
}

pub fn save_server_config_in(dir: &Path, config: &ServerConfig) -> anyhow::Result<()> {
    write_json(&dir.join(SERVER_FILE), config)
}

pub fn load_session_in(dir: &Path) -> anyhow::Result<Option<Session>> {
    read_json(&dir.join(SESSION_FILE))
}

pub fn save_session_in(dir: &Path, session: &Session) -> anyhow::Result<()> {
    write_json(&dir.join(SESSION_FILE), session)
}

/// Returns whether a session file was removed.
pub fn clear_session_in(dir: &Path) -> anyhow::Result<bool> {
    let path = dir.join(SESSION_FILE);
    if path.exists() {
        fs::remove_file(path)?;
        return Ok(true);
    }
    Ok(false)
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_server_config_in(&get_config_dir()?)
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_server_config_in(&get_config_dir()?, config)
}

pub fn load_session() -> anyhow::Result<Option<Session>> {
    load_session_in(&get_config_dir()?)
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    save_session_in(&get_config_dir()?, session)
}

pub fn clear_session() -> anyhow::Result<bool> {
    clear_session_in(&get_config_dir()?)
}

/// The stored session, or an error telling the user to log in.
pub fn require_session() -> anyhow::Result<Session> {
    load_session()?.ok_or_else(|| anyhow::anyhow!("Not logged in. Run 'cohort auth login <email>' first"))
}

pub async fn ping_server(url: &str) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}
