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
pub struct NewCohort {
    #[validate(length(min = 1, max = 80, message = "Cohort name must be between 1 and 80 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CohortChanges {
    #[validate(length(min = 1, max = 80, message = "Cohort name must be between 1 and 80 characters"))]
    pub name: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
}

pub struct CohortService {
    pool: SqlitePool,
}

impl CohortService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Cohort> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self) -> ServiceResult<Vec<Cohort>> {
        Ok(self.repo().select_any(&[]).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Cohort> {
        Ok(self.repo().select_404(id).await?)
    }

    /// Classes belonging to the cohort; the cohort itself must exist.
    pub async fn classes(&self, id: i64) -> ServiceResult<Vec<Classroom>> {
        self.get(id).await?;
        let classes = Repository::<Classroom>::new(self.pool.clone());
        Ok(classes.select_any(&[("cohort_id", id)]).await?)
    }

    pub async fn create(&self, actor: &Actor, input: NewCohort) -> ServiceResult<Cohort> {
        authorize(actor, Action::ManageCohorts)?;
        let input = NewCohort {
            name: input.name.trim().to_string(),
            description: blank_to_none(input.description),
        };
        FieldErrors::check(&input).into_result()?;

        let result = sqlx::query("INSERT INTO cohorts (name, description) VALUES (?, ?)")
            .bind(&input.name)
            .bind(&input.description)
            .execute(&self.pool)
            .await?;

        info!(cohort = %input.name, "Cohort created");
        self.get(result.last_insert_rowid()).await
    }

    pub async fn update(&self, actor: &Actor, id: i64, changes: CohortChanges) -> ServiceResult<Cohort> {
        authorize(actor, Action::ManageCohorts)?;
        let current = self.get(id).await?;

        let changes = CohortChanges {
            name: changes.name.map(|n| n.trim().to_string()),
            ..changes
        };
        FieldErrors::check(&changes).into_result()?;

        let description = match changes.description {
            Some(d) => blank_to_none(Some(d)),
            None => current.description,
        };

        sqlx::query("UPDATE cohorts SET name = ?, description = ? WHERE id = ?")
            .bind(changes.name.unwrap_or(current.name))
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    /// Delete the cohort with its classes, their projects and every join row.
    pub async fn delete(&self, actor: &Actor, id: i64) -> ServiceResult<CascadeReport> {
        authorize(actor, Action::ManageCohorts)?;

        let mut tx = self.pool.begin().await?;
        let report = cascade::delete_cohort(&mut tx, id).await?;
        tx.commit().await?;

        info!(cohort_id = id, ?report, "Cohort deleted");
        Ok(report)
    }
}
