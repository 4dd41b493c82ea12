use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::auth::policy::{authorize, Action, Actor, STUDENT_ROLE};
use crate::auth::{generate_jwt, hash_password, verify_password, AuthError, Claims};
use crate::config::{SecurityConfig, ValidationConfig};
use crate::database::models::{Role, User, UserProfile};
use crate::database::Repository;

use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub password: String,
    /// Role name; defaults to `student`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserChanges {
    #[validate(length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A freshly issued token and what it says about its holder.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Outcome of removing a user.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedUser {
    pub id: i64,
    pub reassigned_projects: u64,
    pub removed_memberships: u64,
    pub new_owner_id: i64,
}

pub struct UserService {
    pool: SqlitePool,
    security: SecurityConfig,
    rules: ValidationConfig,
}

impl UserService {
    pub fn new(pool: SqlitePool, security: SecurityConfig, rules: ValidationConfig) -> Self {
        Self { pool, security, rules }
    }

    fn profiles(&self) -> Repository<UserProfile> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self) -> ServiceResult<Vec<UserProfile>> {
        Ok(self.profiles().select_any(&[]).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<UserProfile> {
        Ok(self.profiles().select_404(id).await?)
    }

    async fn find_role(&self, name: &str) -> ServiceResult<Role> {
        sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                ServiceError::Validation(HashMap::from([(
                    "role".to_string(),
                    format!("Unknown role '{}'", name),
                )]))
            })
    }

    /// Fail with a 409 if `username` or `email` belongs to anyone but `except`.
    async fn ensure_unique(&self, username: Option<&str>, email: Option<&str>, except: i64) -> ServiceResult<()> {
        if let Some(username) = username {
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ? AND id != ?")
                .bind(username)
                .bind(except)
                .fetch_optional(&self.pool)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict("Username already taken.".to_string()));
            }
        }
        if let Some(email) = email {
            let taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                .bind(email)
                .bind(except)
                .fetch_optional(&self.pool)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict("Email already registered.".to_string()));
            }
        }
        Ok(())
    }

    /// Create an account. `allow_role` gates picking a role other than student.
    pub async fn register(&self, input: RegisterUser, allow_role: bool) -> ServiceResult<UserProfile> {
        let mut errors = FieldErrors::check(&input);
        errors.username(&input.username);
        errors.password(&input.password, &self.rules);

        let role_name = input.role.as_deref().unwrap_or(STUDENT_ROLE).trim().to_lowercase();
        if role_name != STUDENT_ROLE && !allow_role {
            errors.add("role", "Choosing a role at registration is disabled");
        }
        errors.into_result()?;

        let role = self.find_role(&role_name).await?;
        let email = input.email.trim().to_lowercase();
        self.ensure_unique(Some(&input.username), Some(&email), 0).await?;

        let password_hash = hash_password(&input.password, self.security.bcrypt_cost)?;
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.username)
        .bind(&email)
        .bind(&password_hash)
        .bind(role.id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(username = %input.username, role = %role.name, "User registered");
        self.get(result.last_insert_rowid()).await
    }

    /// Check credentials; `identifier` may be an email or a username.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> ServiceResult<UserProfile> {
        let identifier = identifier.trim();
        let user = if identifier.contains('@') {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
                .bind(identifier.to_lowercase())
                .fetch_optional(&self.pool)
                .await?
        } else {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?
        };

        match user {
            Some(user) if verify_password(password, &user.password_hash) => self.get(user.id).await,
            _ => {
                tracing::warn!(identifier = %identifier, "Failed login attempt");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    pub fn issue_token(&self, user: UserProfile) -> ServiceResult<IssuedToken> {
        let claims = Claims::new(
            user.id,
            user.username.clone(),
            user.role.clone(),
            self.security.jwt_expiry_hours,
        );
        let token = generate_jwt(&claims, &self.security)?;

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: claims.exp - claims.iat,
            user,
        })
    }

    /// Invalidate a token before its expiry. Also drops entries that have expired anyway.
    pub async fn revoke(&self, claims: &Claims) -> ServiceResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(claims.jti.to_string())
            .bind(claims.exp)
            .execute(&self.pool)
            .await?;

        info!(user_id = claims.user_id, "Token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, claims: &Claims) -> ServiceResult<bool> {
        let found: Option<(String,)> = sqlx::query_as("SELECT jti FROM revoked_tokens WHERE jti = ?")
            .bind(claims.jti.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn update(&self, actor: &Actor, id: i64, changes: UserChanges) -> ServiceResult<UserProfile> {
        authorize(actor, Action::UpdateUser { user_id: id })?;
        let current = self.get(id).await?;

        let mut errors = FieldErrors::check(&changes);
        if let Some(username) = &changes.username {
            errors.username(username);
        }
        if let Some(password) = &changes.password {
            errors.password(password, &self.rules);
        }
        errors.into_result()?;

        let email = changes.email.map(|e| e.trim().to_lowercase());
        self.ensure_unique(changes.username.as_deref(), email.as_deref(), id).await?;

        let password_hash = match &changes.password {
            Some(password) => Some(hash_password(password, self.security.bcrypt_cost)?),
            None => None,
        };

        sqlx::query(
            "UPDATE users
             SET username = ?, email = ?, password_hash = COALESCE(?, password_hash)
             WHERE id = ?",
        )
        .bind(changes.username.unwrap_or(current.username))
        .bind(email.unwrap_or(current.email))
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn change_role(&self, actor: &Actor, id: i64, role_name: &str) -> ServiceResult<UserProfile> {
        authorize(actor, Action::ChangeUserRole)?;
        self.get(id).await?;

        let role = self.find_role(&role_name.trim().to_lowercase()).await?;
        sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
            .bind(role.id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(user_id = id, role = %role.name, "User role changed");
        self.get(id).await
    }

    /// Remove a user, handing their projects to the acting admin.
    pub async fn delete(&self, actor: &Actor, id: i64) -> ServiceResult<DeletedUser> {
        authorize(actor, Action::DeleteUser)?;
        if actor.user_id == id {
            return Err(ServiceError::Conflict(
                "Cannot delete your own account; its projects would have no owner".to_string(),
            ));
        }
        self.get(id).await?;

        let mut tx = self.pool.begin().await?;

        let reassigned = sqlx::query("UPDATE projects SET owner_id = ? WHERE owner_id = ?")
            .bind(actor.user_id)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let memberships = sqlx::query("DELETE FROM project_members WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id = id, reassigned, memberships, "User deleted");
        Ok(DeletedUser {
            id,
            reassigned_projects: reassigned,
            removed_memberships: memberships,
            new_owner_id: actor.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role as PolicyRole;
    use crate::config::AppConfig;
    use crate::database::DatabaseManager;

    async fn service() -> UserService {
        let pool = DatabaseManager::connect_in_memory().await.unwrap();
        DatabaseManager::migrate(&pool).await.unwrap();
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        UserService::new(pool, config.security, config.validation)
    }

    fn register(username: &str, role: Option<&str>) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "password123".to_string(),
            role: role.map(String::from),
        }
    }

    #[tokio::test]
    async fn register_and_authenticate() {
        let users = service().await;
        let created = users.register(register("ada", None), false).await.unwrap();
        assert_eq!(created.role, "student");

        let by_email = users.authenticate("ADA@example.com", "password123").await.unwrap();
        assert_eq!(by_email.id, created.id);
        let by_name = users.authenticate("ada", "password123").await.unwrap();
        assert_eq!(by_name.id, created.id);

        let wrong = users.authenticate("ada", "nope").await.unwrap_err();
        assert!(matches!(wrong, ServiceError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn duplicates_conflict() {
        let users = service().await;
        users.register(register("ada", None), false).await.unwrap();

        let err = users.register(register("ada", None), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Username already taken."));

        let mut same_email = register("grace", None);
        same_email.email = "ada@example.com".to_string();
        let err = users.register(same_email, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Email already registered."));
    }

    #[tokio::test]
    async fn role_choice_is_gated() {
        let users = service().await;
        let err = users.register(register("ada", Some("admin")), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains_key("role")));

        let admin = users.register(register("ada", Some("admin")), true).await.unwrap();
        assert_eq!(admin.role, "admin");

        let err = users.register(register("bob", Some("wizard")), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains_key("role")));
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let users = service().await;
        let mut input = register("ada", None);
        input.password = "short".to_string();
        let err = users.register(input, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains_key("password")));
    }

    #[tokio::test]
    async fn revoked_tokens_are_remembered() {
        let users = service().await;
        let ada = users.register(register("ada", None), false).await.unwrap();
        let claims = Claims::new(ada.id, ada.username, ada.role, 1);

        assert!(!users.is_revoked(&claims).await.unwrap());
        users.revoke(&claims).await.unwrap();
        users.revoke(&claims).await.unwrap();
        assert!(users.is_revoked(&claims).await.unwrap());
    }

    #[tokio::test]
    async fn self_update_but_not_others() {
        let users = service().await;
        let ada = users.register(register("ada", None), false).await.unwrap();
        let bob = users.register(register("bob", None), false).await.unwrap();
        let actor = Actor::new(ada.id, PolicyRole::Student);

        let changes = UserChanges {
            username: Some("ada_l".to_string()),
            ..Default::default()
        };
        let updated = users.update(&actor, ada.id, changes.clone()).await.unwrap();
        assert_eq!(updated.username, "ada_l");
        assert_eq!(updated.email, "ada@example.com");

        let err = users.update(&actor, bob.id, changes).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let users = service().await;
        let ada = users.register(register("ada", None), false).await.unwrap();
        let actor = Actor::new(ada.id, PolicyRole::Student);

        let changes = UserChanges {
            password: Some("a-new-password".to_string()),
            ..Default::default()
        };
        users.update(&actor, ada.id, changes).await.unwrap();

        assert!(users.authenticate("ada", "password123").await.is_err());
        assert!(users.authenticate("ada", "a-new-password").await.is_ok());
    }

    #[tokio::test]
    async fn admin_cannot_delete_self() {
        let users = service().await;
        let admin = users.register(register("root", Some("admin")), true).await.unwrap();
        let actor = Actor::new(admin.id, PolicyRole::Admin);

        let err = users.delete(&actor, admin.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn usernames_cannot_look_like_emails() {
        let users = service().await;
        let ada = users.register(register("ada", None), false).await.unwrap();

        let mut lookalike = register("mallory", None);
        lookalike.username = "ada@example.com".to_string();
        let err = users.register(lookalike, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains_key("username")));

        let actor = Actor::new(ada.id, PolicyRole::Student);
        let changes = UserChanges {
            username: Some("a@b.io".to_string()),
            ..Default::default()
        };
        let err = users.update(&actor, ada.id, changes).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref f) if f.contains_key("username")));
    }

    #[tokio::test]
    async fn role_names_are_case_insensitive() {
        let users = service().await;
        let root = users.register(register("root", Some("admin")), true).await.unwrap();
        let ada = users.register(register("ada", None), false).await.unwrap();
        let actor = Actor::new(root.id, PolicyRole::Admin);

        let promoted = users.change_role(&actor, ada.id, " Admin ").await.unwrap();
        assert_eq!(promoted.role, "admin");
    }
}
