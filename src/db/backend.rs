use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::Document;

/// SQL dialect spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
  Postgres,
  Sqlite,
}

impl SqlDialect {
  /// Generate SQL for reading a top-level JSON field as text
  pub fn json_text(&self, field: &str) -> String {
    match self {
      Self::Postgres => format!("data->>'{}'", field),
      Self::Sqlite => format!("json_extract(data, '$.{}')", field),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Postgres => "postgres",
      Self::Sqlite => "sqlite",
    }
  }
}

/// Abstract document store.
///
/// Every method is a single atomic statement against one collection.
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
  fn dialect(&self) -> SqlDialect;

  async fn init_schema(&self) -> Result<(), anyhow::Error>;
  async fn drop_schema(&self) -> Result<(), anyhow::Error>;

  /// Round-trip to the documents table to confirm storage is usable
  async fn ping(&self) -> Result<(), anyhow::Error>;

  /// Insert a new document. The backend assigns the id and records the
  /// insertion time. `created_at` is the sort key; `None` sorts last.
  async fn insert(
    &self,
    collection: &str,
    data: serde_json::Value,
    created_at: Option<DateTime<Utc>>,
  ) -> Result<Document, anyhow::Error>;

  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, anyhow::Error>;

  /// Returns the number of documents removed (0 or 1)
  async fn delete(&self, collection: &str, id: Uuid) -> Result<u64, anyhow::Error>;

  /// List documents newest `created_at` first, undated ones after them, ties
  /// broken by insertion time. Optionally restricted to an exact `created_by`
  /// match.
  async fn list(
    &self,
    collection: &str,
    created_by: Option<&str>,
  ) -> Result<Vec<Document>, anyhow::Error>;

  async fn count(&self, collection: &str) -> Result<u64, anyhow::Error>;
}
