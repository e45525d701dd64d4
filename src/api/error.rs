use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};

use crate::types::ParcelError;

/// Errors surfaced to HTTP clients as `{"error": "..."}`.
///
/// Storage failures carry a fixed client-facing message; the underlying
/// error is only logged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{message}")]
  Storage {
    message: &'static str,
    #[source]
    source: anyhow::Error,
  },
}

impl AppError {
  pub fn storage(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
    move |source| Self::Storage { message, source }
  }

  pub fn parcel_not_found() -> Self {
    Self::NotFound("Parcel not found".into())
  }

  pub fn invalid_id() -> Self {
    Self::BadRequest("Invalid parcel id".into())
  }
}

impl From<ParcelError> for AppError {
  fn from(e: ParcelError) -> Self {
    Self::BadRequest(e.to_string())
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let (status, msg) = match self {
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
      Self::Storage { message, source } => {
        tracing::error!(error = ?source, "{}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
      }
    };
    (status, Json(serde_json::json!({ "error": msg }))).into_response()
  }
}
