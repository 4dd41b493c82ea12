use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::auth::policy::{authorize, Action, Actor};
use crate::database::models::{Role, User};
use crate::database::Repository;

use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewRole {
    #[validate(length(min = 1, max = 40, message = "Role name must be between 1 and 40 characters"))]
    pub name: String,
}

pub struct RoleService {
    pool: SqlitePool,
}

impl RoleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Role> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self) -> ServiceResult<Vec<Role>> {
        Ok(self.repo().select_any(&[]).await?)
    }

    pub async fn create(&self, actor: &Actor, input: NewRole) -> ServiceResult<Role> {
        authorize(actor, Action::ManageRoles)?;

        let input = NewRole {
            name: input.name.trim().to_lowercase(),
        };
        FieldErrors::check(&input).into_result()?;

        let result = sqlx::query("INSERT INTO roles (name) VALUES (?)")
            .bind(&input.name)
            .execute(&self.pool)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!("Role '{}' already exists", input.name)),
                other => other,
            })?;

        info!(role = %input.name, "Role created");
        Ok(self.repo().select_404(result.last_insert_rowid()).await?)
    }

    /// Roles still held by a user cannot be removed.
    pub async fn delete(&self, actor: &Actor, id: i64) -> ServiceResult<()> {
        authorize(actor, Action::ManageRoles)?;
        let role = self.repo().select_404(id).await?;

        let holders = Repository::<User>::new(self.pool.clone())
            .count(&[("role_id", id)])
            .await?;
        if holders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Role '{}' is assigned to {} user(s)",
                role.name, holders
            )));
        }

        self.repo().delete(id).await?;
        info!(role = %role.name, "Role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role as PolicyRole;
    use crate::database::DatabaseManager;

    const ADMIN: Actor = Actor { user_id: 1, role: PolicyRole::Admin };
    const STUDENT: Actor = Actor { user_id: 2, role: PolicyRole::Student };

    async fn service() -> RoleService {
        let pool = DatabaseManager::connect_in_memory().await.unwrap();
        DatabaseManager::migrate(&pool).await.unwrap();
        RoleService::new(pool)
    }

    #[tokio::test]
    async fn create_and_delete_unused_role() {
        let roles = service().await;
        let mentor = roles.create(&ADMIN, NewRole { name: " Mentor ".to_string() }).await.unwrap();
        assert_eq!(mentor.name, "mentor");
        assert_eq!(roles.list().await.unwrap().len(), 3);

        roles.delete(&ADMIN, mentor.id).await.unwrap();
        assert_eq!(roles.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_role_conflicts() {
        let roles = service().await;
        let err = roles.create(&ADMIN, NewRole { name: "admin".to_string() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn role_in_use_cannot_be_deleted() {
        let roles = service().await;
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, role_id, created_at)
             VALUES ('ada', 'ada@example.com', 'x', 2, '2024-09-01T00:00:00Z')",
        )
        .execute(&roles.pool)
        .await
        .unwrap();

        let err = roles.delete(&ADMIN, 2).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn students_cannot_manage_roles() {
        let roles = service().await;
        let err = roles.create(&STUDENT, NewRole { name: "mentor".to_string() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }
}
