use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cohort_id: i64,
}

impl Table for Classroom {
    const TABLE: &'static str = "classrooms";
    const NOUN: &'static str = "Class";
}
