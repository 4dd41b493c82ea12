use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectCohort {
    pub id: i64,
    pub project_id: i64,
    pub cohort_id: i64,
    pub classroom_id: Option<i64>,
}

impl Table for ProjectCohort {
    const TABLE: &'static str = "project_cohorts";
    const NOUN: &'static str = "Project cohort";
}
