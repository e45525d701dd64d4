//! HTTP surface of the parcel service.

mod error;
mod handlers;

pub use error::AppError;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::db::DatabaseBackend;

pub type Backend = Arc<dyn DatabaseBackend>;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
  pub backend: Backend,
  pub collection: Arc<str>,
}

impl AppState {
  pub fn new(backend: Backend, collection: impl Into<Arc<str>>) -> Self {
    Self {
      backend,
      collection: collection.into(),
    }
  }
}

/// Build the parcel API router. Middleware (CORS, tracing) is layered on by
/// the daemon.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(handlers::root))
    .route("/health", get(handlers::health_check))
    .route("/ready", get(handlers::readiness_check))
    .route(
      "/parcels",
      get(handlers::list_parcels).post(handlers::create_parcel),
    )
    .route(
      "/parcels/{id}",
      get(handlers::get_parcel).delete(handlers::delete_parcel),
    )
    .with_state(state)
}
