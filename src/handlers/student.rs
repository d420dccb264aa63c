//! Student CRUD handlers: create, list, read, update, delete.

use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::state::AppState;
use crate::student::{now, NewStudent, Student, StudentChanges};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))
}

pub async fn create(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewStudent>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let student = Student::create(body, now());
    let row = state.store.create(&student).await?;
    tracing::info!(id = %row.id, "student created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    let rows = state.store.find_all().await?;
    Ok(Json(rows))
}

pub async fn read(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<Json<Student>, AppError> {
    let id = parse_id(&id_str)?;
    let row = state.store.find_by_id(id).await?;
    Ok(Json(row))
}

/// The path id is checked before the body so a bad id is reported as such.
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<JsonBody<StudentChanges>, AppError>,
) -> Result<Json<Student>, AppError> {
    let id = parse_id(&id_str)?;
    let JsonBody(changes) = body?;
    changes.validate()?;
    let row = state.store.update(id, &changes, now()).await?;
    tracing::info!(id = %row.id, "student updated");
    Ok(Json(row))
}

pub async fn delete(State(state): State<AppState>, Path(id_str): Path<String>) -> Result<StatusCode, AppError> {
    let id = parse_id(&id_str)?;
    state.store.delete(id).await?;
    tracing::info!(id = %id, "student deleted");
    Ok(StatusCode::NO_CONTENT)
}
