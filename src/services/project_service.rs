use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::auth::policy::{authorize, Action, Actor};
use crate::config::ValidationConfig;
use crate::database::models::{Classroom, Project, UserProfile};
use crate::database::Repository;

use super::cascade::{self, CascadeReport};
use super::validation::{blank_to_none, FieldErrors};
use super::ServiceResult;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = 120, message = "Project name must be between 1 and 120 characters"))]
    pub name: String,
    pub description: String,
    pub github_link: Option<String>,
    pub deployed_link: Option<String>,
    pub poster_url: Option<String>,
    /// Defaults to the caller. Only admins may name someone else.
    pub owner_id: Option<i64>,
    pub class_id: Option<i64>,
}

/// Partial update. For the link fields an empty string clears the value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = 120, message = "Project name must be between 1 and 120 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub github_link: Option<String>,
    pub deployed_link: Option<String>,
    pub poster_url: Option<String>,
    pub owner_id: Option<i64>,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProjectFilter {
    pub owner_id: Option<i64>,
    pub class_id: Option<i64>,
}

/// Resolve a link change: `None` keeps the current value, blank clears it.
fn merge_link(change: Option<String>, current: Option<String>) -> Option<String> {
    match change {
        Some(value) => blank_to_none(Some(value)),
        None => current,
    }
}

pub struct ProjectService {
    pool: SqlitePool,
    rules: ValidationConfig,
}

impl ProjectService {
    pub fn new(pool: SqlitePool, rules: ValidationConfig) -> Self {
        Self { pool, rules }
    }

    fn repo(&self) -> Repository<Project> {
        Repository::new(self.pool.clone())
    }

    fn check_links(
        &self,
        errors: &mut FieldErrors,
        github_link: Option<&str>,
        deployed_link: Option<&str>,
        poster_url: Option<&str>,
    ) {
        if let Some(link) = github_link {
            errors.github_link(link, &self.rules);
        }
        if let Some(link) = deployed_link {
            errors.url("deployed_link", link);
        }
        if let Some(link) = poster_url {
            errors.url("poster_url", link);
        }
    }

    async fn require_references(&self, owner_id: Option<i64>, class_id: Option<i64>) -> ServiceResult<()> {
        if let Some(owner_id) = owner_id {
            Repository::<UserProfile>::new(self.pool.clone()).select_404(owner_id).await?;
        }
        if let Some(class_id) = class_id {
            Repository::<Classroom>::new(self.pool.clone()).select_404(class_id).await?;
        }
        Ok(())
    }

    pub async fn list(&self, filter: ProjectFilter) -> ServiceResult<Vec<Project>> {
        let filters: Vec<(&'static str, i64)> = [("owner_id", filter.owner_id), ("class_id", filter.class_id)]
            .into_iter()
            .filter_map(|(column, value)| value.map(|v| (column, v)))
            .collect();
        Ok(self.repo().select_any(&filters).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Project> {
        Ok(self.repo().select_404(id).await?)
    }

    /// Users listed as members of the project.
    pub async fn members(&self, id: i64) -> ServiceResult<Vec<UserProfile>> {
        self.get(id).await?;
        let users = sqlx::query_as::<_, UserProfile>(
            "SELECT u.* FROM user_profiles u
             JOIN project_members m ON m.user_id = u.id
             WHERE m.project_id = ?
             ORDER BY u.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn create(&self, actor: &Actor, input: NewProject) -> ServiceResult<Project> {
        authorize(actor, Action::CreateProject)?;
        let owner_id = input.owner_id.unwrap_or(actor.user_id);
        if owner_id != actor.user_id {
            authorize(actor, Action::AssignProjectOwner)?;
        }

        let input = NewProject {
            name: input.name.trim().to_string(),
            github_link: blank_to_none(input.github_link),
            deployed_link: blank_to_none(input.deployed_link),
            poster_url: blank_to_none(input.poster_url),
            ..input
        };

        let mut errors = FieldErrors::check(&input);
        errors.description(&input.description, &self.rules);
        self.check_links(
            &mut errors,
            input.github_link.as_deref(),
            input.deployed_link.as_deref(),
            input.poster_url.as_deref(),
        );
        errors.into_result()?;
        self.require_references(Some(owner_id), input.class_id).await?;

        let result = sqlx::query(
            "INSERT INTO projects
                (name, description, github_link, deployed_link, poster_url, owner_id, class_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(input.description.trim())
        .bind(&input.github_link)
        .bind(&input.deployed_link)
        .bind(&input.poster_url)
        .bind(owner_id)
        .bind(input.class_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(project = %input.name, owner_id, "Project created");
        self.get(result.last_insert_rowid()).await
    }

    pub async fn update(&self, actor: &Actor, id: i64, changes: ProjectChanges) -> ServiceResult<Project> {
        let current = self.get(id).await?;
        authorize(actor, Action::UpdateProject { owner_id: current.owner_id })?;
        if changes.owner_id.is_some_and(|owner| owner != current.owner_id) {
            authorize(actor, Action::AssignProjectOwner)?;
        }

        let changes = ProjectChanges {
            name: changes.name.map(|n| n.trim().to_string()),
            ..changes
        };
        let github_link = merge_link(changes.github_link.clone(), current.github_link);
        let deployed_link = merge_link(changes.deployed_link.clone(), current.deployed_link);
        let poster_url = merge_link(changes.poster_url.clone(), current.poster_url);

        let mut errors = FieldErrors::check(&changes);
        if let Some(description) = &changes.description {
            errors.description(description, &self.rules);
        }
        self.check_links(
            &mut errors,
            github_link.as_deref(),
            deployed_link.as_deref(),
            poster_url.as_deref(),
        );
        errors.into_result()?;
        self.require_references(changes.owner_id, changes.class_id).await?;

        let description = changes
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or(current.description);

        sqlx::query(
            "UPDATE projects
             SET name = ?, description = ?, github_link = ?, deployed_link = ?, poster_url = ?,
                 owner_id = ?, class_id = ?
             WHERE id = ?",
        )
        .bind(changes.name.unwrap_or(current.name))
        .bind(description)
        .bind(github_link)
        .bind(deployed_link)
        .bind(poster_url)
        .bind(changes.owner_id.unwrap_or(current.owner_id))
        .bind(changes.class_id.or(current.class_id))
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id).await
    }

    pub async fn delete(&self, actor: &Actor, id: i64) -> ServiceResult<CascadeReport> {
        let project = self.get(id).await?;
        authorize(actor, Action::DeleteProject { owner_id: project.owner_id })?;

        let mut tx = self.pool.begin().await?;
        let report = cascade::delete_project(&mut tx, id).await?;
        tx.commit().await?;

        info!(project_id = id, ?report, "Project deleted");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::database::DatabaseManager;
    use crate::services::ServiceError;

    const ADMIN: Actor = Actor { user_id: 1, role: Role::Admin };
    const OWNER: Actor = Actor { user_id: 2, role: Role::Student };
    const OTHER: Actor = Actor { user_id: 3, role: Role::Student };

    async fn service() -> ProjectService {
        let pool = DatabaseManager::connect_in_memory().await.unwrap();
        DatabaseManager::migrate(&pool).await.unwrap();
        for sql in [
            "INSERT INTO users (id, username, email, password_hash, role_id, created_at) VALUES
                (1, 'root', 'root@example.com', 'x', 1, '2024-09-01T00:00:00Z'),
                (2, 'ada', 'ada@example.com', 'x', 2, '2024-09-01T00:00:00Z'),
                (3, 'bob', 'bob@example.com', 'x', 2, '2024-09-01T00:00:00Z')",
            "INSERT INTO cohorts (id, name) VALUES (1, 'Spring')",
            "INSERT INTO classrooms (id, name, cohort_id) VALUES (10, 'Rust', 1)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }
        ProjectService::new(pool, ValidationConfig::default())
    }

    fn tracker() -> NewProject {
        NewProject {
            name: "Tracker".to_string(),
            description: "Tracks cohort projects".to_string(),
            github_link: Some("https://github.com/ada/tracker".to_string()),
            deployed_link: None,
            poster_url: None,
            owner_id: None,
            class_id: Some(10),
        }
    }

    #[tokio::test]
    async fn owner_defaults_to_caller() {
        let projects = service().await;
        let created = projects.create(&OWNER, tracker()).await.unwrap();
        assert_eq!(created.owner_id, 2);
        assert_eq!(created.class_id, Some(10));

        let mine = projects
            .list(ProjectFilter { owner_id: Some(2), class_id: None })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert!(projects
            .list(ProjectFilter { owner_id: Some(3), class_id: None })
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn only_admin_assigns_other_owner() {
        let projects = service().await;
        let mut input = tracker();
        input.owner_id = Some(3);

        let err = projects.create(&OWNER, input.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let created = projects.create(&ADMIN, input).await.unwrap();
        assert_eq!(created.owner_id, 3);
    }

    #[tokio::test]
    async fn bad_fields_are_reported_together() {
        let projects = service().await;
        let mut input = tracker();
        input.description = "short".to_string();
        input.github_link = Some("https://gitlab.com/ada/tracker".to_string());
        input.poster_url = Some("poster".to_string());

        let err = projects.create(&OWNER, input).await.unwrap_err();
        let ServiceError::Validation(fields) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("github_link"));
        assert!(fields.contains_key("poster_url"));
    }

    #[tokio::test]
    async fn missing_class_is_not_found() {
        let projects = service().await;
        let mut input = tracker();
        input.class_id = Some(77);
        let err = projects.create(&OWNER, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Class 77 not found"));
    }

    #[tokio::test]
    async fn non_owner_cannot_touch_project() {
        let projects = service().await;
        let created = projects.create(&OWNER, tracker()).await.unwrap();

        let changes = ProjectChanges {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let err = projects.update(&OTHER, created.id, changes.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = projects.delete(&OTHER, created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = projects.update(&ADMIN, created.id, changes).await.unwrap();
        assert_eq!(updated.name, "Hijacked");
    }

    #[tokio::test]
    async fn partial_update_keeps_and_clears_fields() {
        let projects = service().await;
        let created = projects.create(&OWNER, tracker()).await.unwrap();

        let updated = projects
            .update(
                &OWNER,
                created.id,
                ProjectChanges {
                    github_link: Some(String::new()),
                    deployed_link: Some("https://tracker.example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Tracker");
        assert_eq!(updated.github_link, None);
        assert_eq!(updated.deployed_link.as_deref(), Some("https://tracker.example.com"));
        assert_eq!(updated.class_id, Some(10));
    }

    #[tokio::test]
    async fn members_lists_joined_users() {
        let projects = service().await;
        let created = projects.create(&OWNER, tracker()).await.unwrap();
        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, 3), (?, 2)")
            .bind(created.id)
            .bind(created.id)
            .execute(&projects.pool)
            .await
            .unwrap();

        let members = projects.members(created.id).await.unwrap();
        let names: Vec<_> = members.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["ada", "bob"]);

        let report = projects.delete(&OWNER, created.id).await.unwrap();
        assert_eq!(report.project_members, 2);
        assert!(matches!(projects.members(created.id).await, Err(ServiceError::NotFound(_))));
    }
}
