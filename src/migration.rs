//! Auto-migration: derive the `students` table from `student::COLUMNS` at startup.
//! Idempotent: the table is created if missing and absent columns are added.

use crate::error::AppError;
use crate::student::{ColumnDef, COLUMNS, TABLE};
use sqlx::{ConnectOptions, Connection};
use sqlx::PgPool;
use std::str::FromStr;

/// Quote identifier for PostgreSQL.
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_def(c: &ColumnDef) -> String {
    let mut def = format!("{} {}", quote(c.name), c.sql_type);
    if c.primary_key {
        def.push_str(" PRIMARY KEY");
        return def;
    }
    def.push_str(" NOT NULL");
    if let Some(d) = c.default {
        def.push_str(" DEFAULT ");
        def.push_str(d);
    }
    def
}

pub fn create_table_sql() -> String {
    let col_defs: Vec<String> = COLUMNS.iter().map(column_def).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote(TABLE),
        col_defs.join(",\n  ")
    )
}

/// `ADD COLUMN IF NOT EXISTS` for every non-key column, so a table created by an
/// older build picks up new fields.
pub fn add_column_sql() -> Vec<String> {
    COLUMNS
        .iter()
        .filter(|c| !c.primary_key)
        .map(|c| format!("ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}", quote(TABLE), column_def(c)))
        .collect()
}

pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(&create_table_sql()).execute(pool).await?;
    for sql in add_column_sql() {
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(table = TABLE, "schema migrated");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. The target is
/// tried first; only when Postgres reports it missing (3D000) does this connect to
/// the default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let Some((admin_url, db_name)) = parse_db_name_from_url(database_url) else {
        return Ok(());
    };
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let target = sqlx::postgres::PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Storage(format!("invalid DATABASE_URL: {}", e)))?;
    match target.connect().await {
        Ok(conn) => {
            let _ = conn.close().await;
            return Ok(());
        }
        Err(e) if is_missing_database(&e) => {}
        Err(e) => return Err(e.into()),
    }

    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Storage(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// SQLSTATE 3D000: invalid_catalog_name.
fn is_missing_database(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("3D000"))
}

/// Split a URL into (admin URL, database name). `None` when the URL has no path,
/// in which case the driver picks the database and there is nothing to create.
fn parse_db_name_from_url(url: &str) -> Option<(String, String)> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let rest = &url[scheme_end..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    if !rest[authority_end..].starts_with('/') {
        return None;
    }
    let path_start = scheme_end + authority_end + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, q)) => (name.trim(), Some(q)),
        None => (path_and_query.trim(), None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Some((admin_url, db_name.to_string()))
}
