//! PostgreSQL backing. SQL is built from `student::COLUMNS`; values are always bound.

use super::StudentStore;
use crate::error::AppError;
use crate::migration::quote;
use crate::student::{Student, StudentChanges, COLUMNS, TABLE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStudentStore {
    pool: PgPool,
}

impl PgStudentStore {
    pub fn new(pool: PgPool) -> Self {
        PgStudentStore { pool }
    }
}

fn column_list() -> String {
    COLUMNS.iter().map(|c| quote(c.name)).collect::<Vec<_>>().join(", ")
}

fn insert_sql() -> String {
    let placeholders = (1..=COLUMNS.len()).map(|n| format!("${}", n)).collect::<Vec<_>>().join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quote(TABLE),
        column_list(),
        placeholders,
        column_list()
    )
}

fn select_by_id_sql() -> String {
    format!("SELECT {} FROM {} WHERE \"id\" = $1", column_list(), quote(TABLE))
}

fn select_all_sql() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY \"created_at\", \"id\"",
        column_list(),
        quote(TABLE)
    )
}

/// Single-statement conditional update: NULL parameters keep the stored value,
/// so there is no read-then-write window.
fn update_sql() -> String {
    format!(
        "UPDATE {} SET \
         \"name\" = COALESCE($2, \"name\"), \
         \"course\" = COALESCE($3, \"course\"), \
         \"status\" = COALESCE($4, \"status\"), \
         \"email\" = COALESCE($5, \"email\"), \
         \"phone\" = COALESCE($6, \"phone\"), \
         \"age\" = COALESCE($7, \"age\"), \
         \"updated_at\" = GREATEST($8, \"updated_at\") \
         WHERE \"id\" = $1 RETURNING {}",
        quote(TABLE),
        column_list()
    )
}

fn delete_sql() -> String {
    format!("DELETE FROM {} WHERE \"id\" = $1", quote(TABLE))
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn create(&self, student: &Student) -> Result<Student, AppError> {
        let sql = insert_sql();
        tracing::debug!(sql = %sql, id = %student.id, "query");
        // Bind order follows COLUMNS.
        let row = sqlx::query_as::<_, Student>(&sql)
            .bind(student.id)
            .bind(&student.stu_id)
            .bind(&student.name)
            .bind(&student.course)
            .bind(&student.status)
            .bind(&student.email)
            .bind(&student.phone)
            .bind(student.age)
            .bind(student.progress)
            .bind(student.created_at)
            .bind(student.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Student, AppError> {
        let sql = select_by_id_sql();
        tracing::debug!(sql = %sql, id = %id, "query");
        sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn find_all(&self) -> Result<Vec<Student>, AppError> {
        let sql = select_all_sql();
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, Student>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, changes: &StudentChanges, at: DateTime<Utc>) -> Result<Student, AppError> {
        let sql = update_sql();
        tracing::debug!(sql = %sql, id = %id, "query");
        sqlx::query_as::<_, Student>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.course.as_deref())
            .bind(changes.status.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.phone.as_deref())
            .bind(changes.age)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let sql = delete_sql();
        tracing::debug!(sql = %sql, id = %id, "query");
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("postgres pool closed");
    }
}
