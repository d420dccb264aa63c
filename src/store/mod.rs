//! Persistence gateway for student records, with PostgreSQL and in-memory backings.

mod memory;
mod postgres;

pub use memory::MemoryStudentStore;
pub use postgres::PgStudentStore;

use crate::config::{AppConfig, StorageBackend};
use crate::error::AppError;
use crate::migration::{apply_migrations, ensure_database_exists};
use crate::student::{Student, StudentChanges};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Insert a new record. A duplicate id is a storage error.
    async fn create(&self, student: &Student) -> Result<Student, AppError>;

    /// `AppError::NotFound` when no record has this id.
    async fn find_by_id(&self, id: Uuid) -> Result<Student, AppError>;

    async fn find_all(&self) -> Result<Vec<Student>, AppError>;

    /// Atomically apply `changes` and refresh `updated_at` to at least `at`.
    async fn update(&self, id: Uuid, changes: &StudentChanges, at: DateTime<Utc>) -> Result<Student, AppError>;

    /// Hard delete. `AppError::NotFound` when no record has this id.
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn close(&self) {}
}

/// Open the configured backing. For Postgres: create the database if needed,
/// connect the pool, and migrate the `students` table.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn StudentStore>, AppError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; records are lost on exit");
            Ok(Arc::new(MemoryStudentStore::new()))
        }
        StorageBackend::Postgres => {
            ensure_database_exists(&config.database.url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            apply_migrations(&pool).await?;
            tracing::info!(max_connections = config.database.max_connections, "postgres storage ready");
            Ok(Arc::new(PgStudentStore::new(pool)))
        }
    }
}
