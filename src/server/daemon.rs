use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::ServerConfig;
use crate::api::{self, AppState, Backend};
use crate::db::validate_collection_name;

pub struct Daemon {
  config: ServerConfig,
  backend: Backend,
  shutdown_tx: watch::Sender<bool>,
}

impl Daemon {
  pub fn new(config: ServerConfig, backend: Backend) -> Self {
    let (shutdown_tx, _) = watch::channel(false);
    Self {
      config,
      backend,
      shutdown_tx,
    }
  }

  /// Trigger graceful shutdown of the HTTP listener. Sticky: a `run` that
  /// starts afterwards returns as soon as it is listening.
  pub fn shutdown(&self) {
    tracing::info!("Initiating graceful shutdown...");
    self.shutdown_tx.send_replace(true);
  }

  /// Prepare the store. Fails if the collection name is invalid or the store
  /// cannot be reached, so the listener never comes up without storage.
  pub async fn prepare(&self) -> Result<(), anyhow::Error> {
    validate_collection_name(&self.config.storage.collection)?;
    self.backend.init_schema().await?;
    self.backend.ping().await?;
    tracing::info!(
      backend = self.backend.dialect().name(),
      collection = %self.config.storage.collection,
      "Storage connection confirmed"
    );
    Ok(())
  }

  /// Router with CORS and request tracing applied
  pub fn app(&self) -> Router {
    let state = AppState::new(
      self.backend.clone(),
      self.config.storage.collection.as_str(),
    );

    let cors = if self.config.server.cors_origins.is_empty()
      || self.config.server.cors_origins.iter().any(|o| o == "*")
    {
      CorsLayer::permissive()
    } else {
      let origins: Vec<_> = self
        .config
        .server
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
      CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
    };

    api::router(state)
      .layer(TraceLayer::new_for_http())
      .layer(cors)
  }

  pub async fn run(&self) -> Result<(), anyhow::Error> {
    self.prepare().await?;

    let addr = self.config.address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Parcel server listening on http://{}", addr);

    let mut shutdown_rx = self.shutdown_tx.subscribe();
    axum::serve(listener, self.app())
      .with_graceful_shutdown(async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
        tracing::info!("HTTP server shutting down");
      })
      .await?;
    Ok(())
  }
}
