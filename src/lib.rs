//! Student API: CRUD REST service over a single `student` resource.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod routes;
pub mod state;
pub mod store;
pub mod student;

pub use config::{AppConfig, CorsConfig, StorageBackend};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, ensure_database_exists};
pub use routes::{app, common_routes, student_routes};
pub use state::AppState;
pub use store::{open_store, MemoryStudentStore, PgStudentStore, StudentStore};
pub use student::{NewStudent, Student, StudentChanges};
