use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::auth::policy::{authorize, Action, Actor};
use crate::database::models::{Classroom, Cohort};
use crate::database::Repository;

use super::cascade::{self, CascadeReport};
use super::validation::{blank_to_none, FieldErrors};
use super::ServiceResult;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewClassroom {
    #[validate(length(min = 1, max = 100, message = "Class name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub cohort_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClassroomChanges {
    #[validate(length(min = 1, max = 100, message = "Class name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub cohort_id: Option<i64>,
}

pub struct ClassroomService {
    pool: SqlitePool,
}

impl ClassroomService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Classroom> {
        Repository::new(self.pool.clone())
    }

    async fn require_cohort(&self, cohort_id: i64) -> ServiceResult<()> {
        Repository::<Cohort>::new(self.pool.clone()).select_404(cohort_id).await?;
        Ok(())
    }

    pub async fn list(&self, cohort_id: Option<i64>) -> ServiceResult<Vec<Classroom>> {
        let filters: Vec<(&'static str, i64)> = cohort_id.map(|id| ("cohort_id", id)).into_iter().collect();
        Ok(self.repo().select_any(&filters).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Classroom> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, actor: &Actor, input: NewClassroom) -> ServiceResult<Classroom> {
        authorize(actor, Action::ManageClasses)?;
        let input = NewClassroom {
            name: input.name.trim().to_string(),
            description: blank_to_none(input.description),
            ..input
        };
        FieldErrors::check(&input).into_result()?;
        self.require_cohort(input.cohort_id).await?;

        let result = sqlx::query("INSERT INTO classrooms (name, description, cohort_id) VALUES (?, ?, ?)")
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.cohort_id)
            .execute(&self.pool)
            .await?;

        info!(class = %input.name, cohort_id = input.cohort_id, "Class created");
        self.get(result.last_insert_rowid()).await
    }

    pub async fn update(&self, actor: &Actor, id: i64, changes: ClassroomChanges) -> ServiceResult<Classroom> {
        authorize(actor, Action::ManageClasses)?;
        let current = self.get(id).await?;

        let changes = ClassroomChanges {
            name: changes.name.map(|n| n.trim().to_string()),
            ..changes
        };
        FieldErrors::check(&changes).into_result()?;
        if let Some(cohort_id) = changes.cohort_id {
            self.require_cohort(cohort_id).await?;
        }

        let description = match changes.description {
            Some(d) => blank_to_none(Some(d)),
            None => current.description,
        };

        let cohort_id = changes.cohort_id.unwrap_or(current.cohort_id);
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE classrooms SET name = ?, description = ?, cohort_id = ? WHERE id = ?")
            .bind(changes.name.unwrap_or(current.name))
            .bind(description)
            .bind(cohort_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Assignments keep their cohort but may no longer name a class outside it.
        if cohort_id != current.cohort_id {
            let unpinned = sqlx::query(
                "UPDATE project_cohorts SET classroom_id = NULL WHERE classroom_id = ? AND cohort_id != ?",
            )
            .bind(id)
            .bind(cohort_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            info!(class_id = id, from = current.cohort_id, to = cohort_id, unpinned, "Class moved");
        }

        tx.commit().await?;
        self.get(id).await
    }

    /// Delete the class, its projects and the join rows pointing at either.
    pub async fn delete(&self, actor: &Actor, id: i64) -> ServiceResult<CascadeReport> {
        authorize(actor, Action::ManageClasses)?;

        let mut tx = self.pool.begin().await?;
        let report = cascade::delete_class(&mut tx, id).await?;
        tx.commit().await?;

        info!(class_id = id, ?report, "Class deleted");
        Ok(report)
    }
}
