//! Cascading deletes for the cohort -> class -> project hierarchy.
//!
//! Every function runs on a connection the caller has already put inside a
//! transaction, so a failure part-way leaves nothing deleted. Join rows go
//! first: the project subqueries are re-evaluated per statement.

use serde::Serialize;
use sqlx::SqliteConnection;

use crate::database::DatabaseError;

/// Rows removed by one cascading delete.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub cohorts: u64,
    pub classes: u64,
    pub projects: u64,
    pub project_members: u64,
    pub project_cohorts: u64,
}

/// Which projects a cascade reaches.
#[derive(Debug, Clone, Copy)]
enum ProjectScope {
    Cohort(i64),
    Class(i64),
    Project(i64),
}

impl ProjectScope {
    fn ids_sql(&self) -> &'static str {
        match self {
            ProjectScope::Cohort(_) => {
                "SELECT p.id FROM projects p JOIN classrooms c ON c.id = p.class_id WHERE c.cohort_id = ?"
            }
            ProjectScope::Class(_) => "SELECT id FROM projects WHERE class_id = ?",
            ProjectScope::Project(_) => "SELECT ?",
        }
    }

    fn key(&self) -> i64 {
        match *self {
            ProjectScope::Cohort(id) | ProjectScope::Class(id) | ProjectScope::Project(id) => id,
        }
    }
}

async fn execute(conn: &mut SqliteConnection, sql: &str, binds: &[i64]) -> Result<u64, DatabaseError> {
    let mut query = sqlx::query(sql);
    for value in binds {
        query = query.bind(*value);
    }
    Ok(query.execute(&mut *conn).await?.rows_affected())
}

async fn delete_projects(
    conn: &mut SqliteConnection,
    scope: ProjectScope,
    report: &mut CascadeReport,
) -> Result<(), DatabaseError> {
    let ids = scope.ids_sql();
    let key = [scope.key()];

    report.project_members += execute(
        conn,
        &format!("DELETE FROM project_members WHERE project_id IN ({ids})"),
        &key,
    )
    .await?;
    report.project_cohorts += execute(
        conn,
        &format!("DELETE FROM project_cohorts WHERE project_id IN ({ids})"),
        &key,
    )
    .await?;
    report.projects += execute(conn, &format!("DELETE FROM projects WHERE id IN ({ids})"), &key).await?;

    Ok(())
}

pub async fn delete_project(conn: &mut SqliteConnection, project_id: i64) -> Result<CascadeReport, DatabaseError> {
    let mut report = CascadeReport::default();
    delete_projects(conn, ProjectScope::Project(project_id), &mut report).await?;

    if report.projects == 0 {
        return Err(DatabaseError::NotFound(format!("Project {} not found", project_id)));
    }
    Ok(report)
}

pub async fn delete_class(conn: &mut SqliteConnection, class_id: i64) -> Result<CascadeReport, DatabaseError> {
    let mut report = CascadeReport::default();
    delete_projects(conn, ProjectScope::Class(class_id), &mut report).await?;

    report.project_cohorts += execute(conn, "DELETE FROM project_cohorts WHERE classroom_id = ?", &[class_id]).await?;
    report.classes += execute(conn, "DELETE FROM classrooms WHERE id = ?", &[class_id]).await?;

    if report.classes == 0 {
        return Err(DatabaseError::NotFound(format!("Class {} not found", class_id)));
    }
    Ok(report)
}

pub async fn delete_cohort(conn: &mut SqliteConnection, cohort_id: i64) -> Result<CascadeReport, DatabaseError> {
    let mut report = CascadeReport::default();
    delete_projects(conn, ProjectScope::Cohort(cohort_id), &mut report).await?;

    report.project_cohorts += execute(
        conn,
        "DELETE FROM project_cohorts
         WHERE cohort_id = ?
            OR classroom_id IN (SELECT id FROM classrooms WHERE cohort_id = ?)",
        &[cohort_id, cohort_id],
    )
    .await?;
    report.classes += execute(conn, "DELETE FROM classrooms WHERE cohort_id = ?", &[cohort_id]).await?;
    report.cohorts += execute(conn, "DELETE FROM cohorts WHERE id = ?", &[cohort_id]).await?;

    if report.cohorts == 0 {
        return Err(DatabaseError::NotFound(format!("Cohort {} not found", cohort_id)));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use sqlx::SqlitePool;

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap();
        n
    }

    /// Two cohorts, each with one class holding one project that has a
    /// member and a cohort assignment.
    async fn seeded() -> SqlitePool {
        let pool = DatabaseManager::connect_in_memory().await.unwrap();
        DatabaseManager::migrate(&pool).await.unwrap();

        for sql in [
            "INSERT INTO users (id, username, email, password_hash, role_id, created_at)
             VALUES (1, 'owner', 'owner@example.com', 'x', 2, '2024-09-01T00:00:00Z')",
            "INSERT INTO cohorts (id, name) VALUES (1, 'Spring'), (2, 'Fall')",
            "INSERT INTO classrooms (id, name, cohort_id) VALUES (10, 'Rust', 1), (20, 'Go', 2)",
            "INSERT INTO projects (id, name, description, owner_id, class_id, created_at)
             VALUES (100, 'Tracker', 'Tracks things well', 1, 10, '2024-09-01T00:00:00Z'),
                    (200, 'Other', 'Another long description', 1, 20, '2024-09-01T00:00:00Z')",
            "INSERT INTO project_members (project_id, user_id) VALUES (100, 1), (200, 1)",
            "INSERT INTO project_cohorts (project_id, cohort_id, classroom_id) VALUES (100, 1, 10), (200, 1, NULL)",
        ] {
            sqlx::query(sql).execute(&pool).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn cohort_delete_reaches_every_descendant() {
        let pool = seeded().await;
        let mut tx = pool.begin().await.unwrap();
        let report = delete_cohort(&mut tx, 1).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            report,
            CascadeReport {
                cohorts: 1,
                classes: 1,
                projects: 1,
                project_members: 1,
                project_cohorts: 2,
            }
        );
        assert_eq!(count(&pool, "cohorts").await, 1);
        assert_eq!(count(&pool, "classrooms").await, 1);
        assert_eq!(count(&pool, "projects").await, 1);
        assert_eq!(count(&pool, "project_members").await, 1);
        assert_eq!(count(&pool, "project_cohorts").await, 0);
    }

    #[tokio::test]
    async fn class_delete_keeps_its_cohort() {
        let pool = seeded().await;
        let mut tx = pool.begin().await.unwrap();
        let report = delete_class(&mut tx, 20).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(report.classes, 1);
        assert_eq!(report.projects, 1);
        assert_eq!(count(&pool, "cohorts").await, 2);
        assert_eq!(count(&pool, "projects").await, 1);
    }

    #[tokio::test]
    async fn missing_cohort_rolls_back() {
        let pool = seeded().await;
        let mut tx = pool.begin().await.unwrap();
        let err = delete_cohort(&mut tx, 99).await.unwrap_err();
        drop(tx);

        assert!(matches!(err, DatabaseError::NotFound(_)));
        assert_eq!(count(&pool, "cohorts").await, 2);
    }

    #[tokio::test]
    async fn project_delete_clears_join_rows() {
        let pool = seeded().await;
        let mut tx = pool.begin().await.unwrap();
        let report = delete_project(&mut tx, 100).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(report.project_members, 1);
        assert_eq!(report.project_cohorts, 1);
        assert_eq!(count(&pool, "projects").await, 1);
    }
}
