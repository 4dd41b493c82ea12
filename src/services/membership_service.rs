//! Project membership and project-to-cohort assignment.
//!
//! Both join tables are managed by the project's owner (or an admin), so
//! every mutation first loads the project to learn who owns it.

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::policy::{authorize, Action, Actor};
use crate::database::models::{Classroom, Cohort, Project, ProjectCohort, ProjectMember, UserProfile};
use crate::database::Repository;

use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewProjectMember {
    pub project_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewProjectCohort {
    pub project_id: i64,
    pub cohort_id: i64,
    pub classroom_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MemberFilter {
    pub project_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AssignmentFilter {
    pub project_id: Option<i64>,
    pub cohort_id: Option<i64>,
}

fn filters(pairs: [(&'static str, Option<i64>); 2]) -> Vec<(&'static str, i64)> {
    pairs
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
}

pub struct MembershipService {
    pool: SqlitePool,
}

impl MembershipService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn project(&self, id: i64) -> ServiceResult<Project> {
        Ok(Repository::<Project>::new(self.pool.clone()).select_404(id).await?)
    }

    pub async fn list_members(&self, filter: MemberFilter) -> ServiceResult<Vec<ProjectMember>> {
        let filters = filters([("project_id", filter.project_id), ("user_id", filter.user_id)]);
        Ok(Repository::<ProjectMember>::new(self.pool.clone())
            .select_any(&filters)
            .await?)
    }

    pub async fn add_member(&self, actor: &Actor, input: NewProjectMember) -> ServiceResult<ProjectMember> {
        let project = self.project(input.project_id).await?;
        authorize(actor, Action::ManageProjectMembers { owner_id: project.owner_id })?;
        Repository::<UserProfile>::new(self.pool.clone())
            .select_404(input.user_id)
            .await?;

        let result = sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, ?)")
            .bind(input.project_id)
            .bind(input.user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                    "User {} is already a member of project {}",
                    input.user_id, input.project_id
                )),
                other => other,
            })?;

        info!(project_id = input.project_id, user_id = input.user_id, "Project member added");
        Ok(Repository::<ProjectMember>::new(self.pool.clone())
            .select_404(result.last_insert_rowid())
            .await?)
    }

    pub async fn remove_member(&self, actor: &Actor, id: i64) -> ServiceResult<()> {
        let repo = Repository::<ProjectMember>::new(self.pool.clone());
        let member = repo.select_404(id).await?;
        let project = self.project(member.project_id).await?;
        authorize(actor, Action::ManageProjectMembers { owner_id: project.owner_id })?;

        repo.delete(id).await?;
        info!(project_id = member.project_id, user_id = member.user_id, "Project member removed");
        Ok(())
    }

    pub async fn list_assignments(&self, filter: AssignmentFilter) -> ServiceResult<Vec<ProjectCohort>> {
        let filters = filters([("project_id", filter.project_id), ("cohort_id", filter.cohort_id)]);
        Ok(Repository::<ProjectCohort>::new(self.pool.clone())
            .select_any(&filters)
            .await?)
    }

    /// Assign a project to a cohort, optionally pinned to one of its classes.
    pub async fn assign(&self, actor: &Actor, input: NewProjectCohort) -> ServiceResult<ProjectCohort> {
        let project = self.project(input.project_id).await?;
        authorize(actor, Action::ManageProjectCohorts { owner_id: project.owner_id })?;
        Repository::<Cohort>::new(self.pool.clone())
            .select_404(input.cohort_id)
            .await?;

        if let Some(classroom_id) = input.classroom_id {
            let classroom = Repository::<Classroom>::new(self.pool.clone())
                .select_404(classroom_id)
                .await?;
            if classroom.cohort_id != input.cohort_id {
                let mut errors = FieldErrors::new();
                errors.add(
                    "classroom_id",
                    format!("Class {} does not belong to cohort {}", classroom_id, input.cohort_id),
                );
                errors.into_result()?;
            }
        }

        let result = sqlx::query("INSERT INTO project_cohorts (project_id, cohort_id, classroom_id) VALUES (?, ?, ?)")
            .bind(input.project_id)
            .bind(input.cohort_id)
            .bind(input.classroom_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match ServiceError::from(e) {
                ServiceError::Conflict(_) => ServiceError::Conflict(format!(
                    "Project {} is already assigned to cohort {}",
                    input.project_id, input.cohort_id
                )),
                other => other,
            })?;

        info!(project_id = input.project_id, cohort_id = input.cohort_id, "Project assigned to cohort");
        Ok(Repository::<ProjectCohort>::new(self.pool.clone())
            .select_404(result.last_insert_rowid())
            .await?)
    }

    pub async fn unassign(&self, actor: &Actor, id: i64) -> ServiceResult<()> {
        let repo = Repository::<ProjectCohort>::new(self.pool.clone());
        let assignment = repo.select_404(id).await?;
        let project = self.project(assignment.project_id).await?;
        authorize(actor, Action::ManageProjectCohorts { owner_id: project.owner_id })?;

        repo.delete(id).await?;
        info!(
            project_id = assignment.project_id,
            cohort_id = assignment.cohort_id,
            "Project unassigned from cohort"
        );
        Ok(())
    }
}
