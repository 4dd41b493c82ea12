use clap::Args;
use serde_json::json;
use tracing::info;

use crate::auth::policy::{ADMIN_ROLE, STUDENT_ROLE};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::DatabaseManager;
use crate::services::user_service::RegisterUser;
use crate::services::UserService;

#[derive(Args)]
pub struct SeedArgs {
    #[arg(long, default_value = "admin", help = "Username of the admin account")]
    pub admin_username: String,

    #[arg(long, default_value = "admin@example.com", help = "Email of the admin account")]
    pub admin_email: String,

    #[arg(long, help = "Admin password (prompted on stdin when omitted)")]
    pub admin_password: Option<String>,
}

/// Migrate the database named by `DATABASE_URL`, make sure the built-in
/// roles exist, and create the admin account unless it is already there.
pub async fn handle(args: SeedArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;

    for role in [ADMIN_ROLE, STUDENT_ROLE] {
        sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?)")
            .bind(role)
            .execute(&pool)
            .await?;
    }

    let email = args.admin_email.trim().to_lowercase();
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ? OR email = ?")
        .bind(&args.admin_username)
        .bind(&email)
        .fetch_optional(&pool)
        .await?;

    if let Some((id,)) = existing {
        info!(id, "Admin account already present");
        return output_success(
            output_format,
            &format!("Database ready; '{}' already exists (id {})", args.admin_username, id),
            Some(json!({ "id": id, "created": false })),
        );
    }

    let password = resolve_password(args.admin_password)?;
    let users = UserService::new(pool, config.security.clone(), config.validation.clone());
    let admin = users
        .register(
            RegisterUser {
                username: args.admin_username,
                email,
                password,
                role: Some(ADMIN_ROLE.to_string()),
            },
            true,
        )
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    output_success(
        output_format,
        &format!("Database ready; admin '{}' created (id {})", admin.username, admin.id),
        Some(json!({ "id": admin.id, "created": true })),
    )
}
