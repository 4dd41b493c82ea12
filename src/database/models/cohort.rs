use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cohort {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Table for Cohort {
    const TABLE: &'static str = "cohorts";
    const NOUN: &'static str = "Cohort";
}
