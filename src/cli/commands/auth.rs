use chrono::{Duration, Utc};
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::*;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Role name, if the server allows choosing one")]
        role: Option<String>,
    },

    #[command(about = "Login and store the session token")]
    Login {
        #[arg(help = "Email or username")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Revoke the token and forget the session")]
    Logout,

    #[command(about = "Show the stored session")]
    Status,

    #[command(about = "Ask the server who the stored token belongs to")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Register { username, email, password, role } => {
            let password = resolve_password(password)?;
            let client = ApiClient::anonymous()?;
            let user = client
                .post(
                    "/auth/register",
                    &json!({ "username": username, "email": email, "password": password, "role": role }),
                )
                .await?;

            output_success(
                output_format,
                &format!("Registered '{}'. Run 'cohort auth login {}' next", username, email),
                Some(user),
            )
        }
        AuthCommands::Login { email, password } => {
            let password = resolve_password(password)?;
            let server = load_server_config()?.url;
            let client = ApiClient::new(server.clone(), None);
            let data = client
                .post("/auth/login", &json!({ "email": email, "password": password }))
                .await?;

            let session = session_from_login(&data, server)?;
            save_session(&session)?;

            output_success(
                output_format,
                &format!("Logged in as '{}' ({})", session.username, session.role),
                Some(json!({ "username": session.username, "role": session.role, "expires_at": session.expires_at })),
            )
        }
        AuthCommands::Logout => {
            let had_session = load_session()?.is_some();
            match ApiClient::authenticated() {
                Ok((client, _)) => {
                    // The token may already be dead server-side; forget it either way.
                    if let Err(e) = client.post("/api/auth/logout", &json!({})).await {
                        tracing::debug!("Server logout failed: {}", e);
                    }
                }
                Err(e) => tracing::debug!("No usable session: {}", e),
            }
            clear_session()?;

            output_success(
                output_format,
                if had_session { "Logged out" } else { "Not logged in" },
                None,
            )
        }
        AuthCommands::Status => match load_session()? {
            Some(session) => output_record(
                output_format,
                &json!({
                    "username": session.username,
                    "user_id": session.user_id,
                    "role": session.role,
                    "server": session.server,
                    "logged_in_at": session.logged_in_at,
                    "expires_at": session.expires_at,
                    "expired": session.is_expired(),
                }),
            ),
            None => output_success(output_format, "Not logged in", Some(json!({ "logged_in": false }))),
        },
        AuthCommands::Whoami => {
            let (client, _) = ApiClient::authenticated()?;
            let me = client.get("/api/auth/whoami").await?;
            output_record(output_format, &me)
        }
    }
}

/// Build the stored session from a `/auth/login` response body.
fn session_from_login(data: &Value, server: String) -> anyhow::Result<Session> {
    let token = data["token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Login response carried no token"))?;
    let user = &data["user"];
    let expires_in = data["expires_in"].as_i64().unwrap_or(0);
    let now = Utc::now();

    Ok(Session {
        token: token.to_string(),
        user_id: user["id"].as_i64().unwrap_or_default(),
        username: user["username"].as_str().unwrap_or_default().to_string(),
        role: user["role"].as_str().unwrap_or_default().to_string(),
        server,
        logged_in_at: now,
        expires_at: now + Duration::seconds(expires_in),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_becomes_session() {
        let data = json!({
            "token": "abc.def.ghi",
            "token_type": "Bearer",
            "expires_in": 3600,
            "user": { "id": 4, "username": "ada", "email": "ada@example.com", "role": "admin" }
        });

        let session = session_from_login(&data, "http://localhost:5000".to_string()).unwrap();
        assert_eq!(session.token, "abc.def.ghi");
        assert_eq!(session.user_id, 4);
        assert!(session.is_admin());
        assert!(!session.is_expired());
    }

    #[test]
    fn login_response_without_token_is_rejected() {
        assert!(session_from_login(&json!({ "user": {} }), String::new()).is_err());
    }
}
