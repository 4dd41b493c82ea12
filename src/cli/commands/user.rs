use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Show one user")]
    Show { id: i64 },

    #[command(about = "Update your own profile (admins: anyone's)")]
    Update {
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    #[command(about = "Delete a user; their projects move to you (admin)")]
    Delete { id: i64 },

    #[command(about = "Change a user's role (admin)")]
    Role { id: i64, role: String },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, session) = ApiClient::authenticated()?;

    match cmd {
        UserCommands::List => {
            let users = client.get("/api/users").await?;
            output_table(
                output_format,
                "users",
                &users,
                &[("id", "id"), ("username", "username"), ("email", "email"), ("role", "role")],
            )
        }
        UserCommands::Show { id } => {
            let user = client.get(&format!("/api/users/{}", id)).await?;
            output_record(output_format, &user)
        }
        UserCommands::Update { id, username, email, password } => {
            if id != session.user_id {
                require_admin(&session, "update other users")?;
            }
            let changes = json_body(vec![
                ("username", username.map(Value::from)),
                ("email", email.map(Value::from)),
                ("password", password.map(Value::from)),
            ]);
            let user = client.patch(&format!("/api/users/{}", id), &changes).await?;
            output_success(output_format, &format!("User {} updated", id), Some(user))
        }
        UserCommands::Delete { id } => {
            require_admin(&session, "delete users")?;
            let result = client.delete(&format!("/api/admin/users/{}", id)).await?;
            output_success(output_format, &format!("User {} deleted", id), Some(result))
        }
        UserCommands::Role { id, role } => {
            require_admin(&session, "change roles")?;
            let user = client
                .put(&format!("/api/admin/users/{}/role", id), &json!({ "role": role }))
                .await?;
            output_success(
                output_format,
                &format!("User {} is now '{}'", id, role),
                Some(user),
            )
        }
    }
}
