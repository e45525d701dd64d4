use axum::{
  extract::{
    rejection::{JsonRejection, PathRejection, QueryRejection},
    Path, Query, State,
  },
  http::StatusCode,
  Json,
};
use uuid::Uuid;

use super::{AppError, AppState};
use crate::types::{DeleteResponse, InsertOneResult, NewParcel, Parcel, ParcelQuery};

/// Liveness banner
pub async fn root() -> &'static str {
  "📦 Parcel Server is running"
}

/// Liveness probe - returns 200 if server is running
pub async fn health_check() -> StatusCode {
  StatusCode::OK
}

/// Readiness probe - returns 200 if the store answers
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
  match state.backend.ping().await {
    Ok(_) => StatusCode::OK,
    Err(e) => {
      tracing::warn!(error = ?e, "Readiness check failed");
      StatusCode::SERVICE_UNAVAILABLE
    }
  }
}

pub async fn list_parcels(
  State(state): State<AppState>,
  query: Result<Query<ParcelQuery>, QueryRejection>,
) -> Result<Json<Vec<Parcel>>, AppError> {
  let Query(q) = query.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
  // An empty `email` means no filter
  let created_by = q.email.as_deref().filter(|e| !e.is_empty());
  let docs = state
    .backend
    .list(&state.collection, created_by)
    .await
    .map_err(AppError::storage("Failed to fetch parcels"))?;
  Ok(Json(docs.into_iter().map(Parcel::from).collect()))
}

pub async fn get_parcel(
  State(state): State<AppState>,
  id: Result<Path<String>, PathRejection>,
) -> Result<Json<Parcel>, AppError> {
  let id = parse_id(id)?;
  let doc = state
    .backend
    .get(&state.collection, id)
    .await
    .map_err(AppError::storage("Failed to fetch parcel"))?;
  match doc {
    Some(d) => Ok(Json(d.into())),
    None => Err(AppError::parcel_not_found()),
  }
}

pub async fn create_parcel(
  State(state): State<AppState>,
  payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<InsertOneResult>), AppError> {
  let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
  let parcel = NewParcel::from_value(body)?;
  let created_at = parcel.created_at();

  let doc = state
    .backend
    .insert(&state.collection, parcel.into_value(), created_at)
    .await
    .map_err(AppError::storage("Failed to add parcel"))?;
  tracing::info!(id = %doc.id, "Parcel created");
  Ok((StatusCode::CREATED, Json(InsertOneResult::new(doc.id))))
}

pub async fn delete_parcel(
  State(state): State<AppState>,
  id: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
  let id = parse_id(id)?;
  let deleted = state
    .backend
    .delete(&state.collection, id)
    .await
    .map_err(AppError::storage("Failed to delete parcel"))?;
  if deleted == 0 {
    return Err(AppError::parcel_not_found());
  }
  tracing::info!(%id, "Parcel deleted");
  Ok(Json(DeleteResponse::deleted(deleted)))
}

/// Undecodable path segments and non-UUID strings are both a bad id
fn parse_id(raw: Result<Path<String>, PathRejection>) -> Result<Uuid, AppError> {
  let Path(raw) = raw.map_err(|_| AppError::invalid_id())?;
  raw.parse().map_err(|_| AppError::invalid_id())
}
