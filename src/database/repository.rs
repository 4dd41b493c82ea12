use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::database::manager::DatabaseError;
use crate::database::models::Table;

/// Equality filters on integer columns, ANDed together. Column names are
/// compile-time constants, never user input.
pub type Filters<'a> = &'a [(&'static str, i64)];

pub struct Repository<T> {
    pool: SqlitePool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Table + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    fn query(head: &str, filters: Filters<'_>) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(format!("{} FROM {}", head, T::TABLE));

        if !filters.is_empty() {
            builder.push(" WHERE ");
            let mut separated = builder.separated(" AND ");
            for (column, value) in filters {
                separated.push(*column);
                separated.push_unseparated(" = ");
                separated.push_bind_unseparated(*value);
            }
        }

        builder
    }

    pub async fn select_any(&self, filters: Filters<'_>) -> Result<Vec<T>, DatabaseError> {
        let mut builder = Self::query("SELECT *", filters);
        builder.push(" ORDER BY id");

        Ok(builder.build_query_as::<T>().fetch_all(&self.pool).await?)
    }

    pub async fn select_one(&self, filters: Filters<'_>) -> Result<Option<T>, DatabaseError> {
        let mut builder = Self::query("SELECT *", filters);
        builder.push(" ORDER BY id LIMIT 1");

        Ok(builder.build_query_as::<T>().fetch_optional(&self.pool).await?)
    }

    pub async fn select_404(&self, id: i64) -> Result<T, DatabaseError> {
        self.select_one(&[("id", id)])
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", T::NOUN, id)))
    }

    pub async fn count(&self, filters: Filters<'_>) -> Result<i64, DatabaseError> {
        let mut builder = Self::query("SELECT COUNT(*)", filters);
        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Delete a single row by id; a missing row is a `NotFound`.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} {} not found", T::NOUN, id)));
        }
        Ok(())
    }
}
