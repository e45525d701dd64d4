use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use uuid::Uuid;

use super::backend::{DatabaseBackend, SqlDialect};
use crate::types::{Document, CREATED_BY_FIELD};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    collection VARCHAR(255) NOT NULL,
    data JSONB NOT NULL,
    created_at TIMESTAMPTZ,
    inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, created_at DESC NULLS LAST, inserted_at DESC);
CREATE INDEX IF NOT EXISTS idx_documents_created_by ON documents((data->>'created_by'));
"#;

pub struct PostgresBackend {
  pool: Pool,
}

impl PostgresBackend {
  pub fn new(url: &str, max_connections: usize) -> Result<Self, anyhow::Error> {
    let mut cfg = Config::new();
    cfg.url = Some(url.into());
    cfg.manager = Some(ManagerConfig {
      recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(max_connections));
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(Self { pool })
  }
}

#[async_trait]
impl DatabaseBackend for PostgresBackend {
  fn dialect(&self) -> SqlDialect {
    SqlDialect::Postgres
  }

  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    self.pool.get().await?.batch_execute(SCHEMA).await?;
    tracing::info!("PostgreSQL schema initialized");
    Ok(())
  }

  async fn drop_schema(&self) -> Result<(), anyhow::Error> {
    self
      .pool
      .get()
      .await?
      .batch_execute("DROP TABLE IF EXISTS documents;")
      .await?;
    Ok(())
  }

  async fn ping(&self) -> Result<(), anyhow::Error> {
    // Touches the documents table so a missing schema is not ready
    self
      .pool
      .get()
      .await?
      .query_opt("SELECT 1 FROM documents LIMIT 1", &[])
      .await?;
    Ok(())
  }

  async fn insert(
    &self,
    collection: &str,
    data: serde_json::Value,
    created_at: Option<DateTime<Utc>>,
  ) -> Result<Document, anyhow::Error> {
    let id = Uuid::new_v4();
    let inserted_at = Utc::now();
    self
      .pool
      .get()
      .await?
      .execute(
        "INSERT INTO documents (id, collection, data, created_at, inserted_at) VALUES ($1, $2, $3, $4, $5)",
        &[&id, &collection, &data, &created_at, &inserted_at],
      )
      .await?;
    Ok(Document {
      id,
      collection: collection.into(),
      data,
      created_at,
      inserted_at,
    })
  }

  async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, anyhow::Error> {
    let row = self
      .pool
      .get()
      .await?
      .query_opt(
        "SELECT id, collection, data, created_at, inserted_at FROM documents WHERE collection = $1 AND id = $2",
        &[&collection, &id],
      )
      .await?;
    Ok(row.map(|r| row_to_doc(&r)))
  }

  async fn delete(&self, collection: &str, id: Uuid) -> Result<u64, anyhow::Error> {
    let deleted = self
      .pool
      .get()
      .await?
      .execute(
        "DELETE FROM documents WHERE collection = $1 AND id = $2",
        &[&collection, &id],
      )
      .await?;
    Ok(deleted)
  }

  async fn list(
    &self,
    collection: &str,
    created_by: Option<&str>,
  ) -> Result<Vec<Document>, anyhow::Error> {
    let client = self.pool.get().await?;
    let rows = match created_by {
      Some(email) => {
        let sql = format!(
          "SELECT id, collection, data, created_at, inserted_at FROM documents WHERE collection = $1 AND {} = $2 ORDER BY created_at DESC NULLS LAST, inserted_at DESC, id DESC",
          self.dialect().json_text(CREATED_BY_FIELD)
        );
        client.query(&sql, &[&collection, &email]).await?
      }
      None => {
        client
          .query(
            "SELECT id, collection, data, created_at, inserted_at FROM documents WHERE collection = $1 ORDER BY created_at DESC NULLS LAST, inserted_at DESC, id DESC",
            &[&collection],
          )
          .await?
      }
    };
    Ok(rows.iter().map(row_to_doc).collect())
  }

  async fn count(&self, collection: &str) -> Result<u64, anyhow::Error> {
    let row = self
      .pool
      .get()
      .await?
      .query_one(
        "SELECT COUNT(*) FROM documents WHERE collection = $1",
        &[&collection],
      )
      .await?;
    let count: i64 = row.get(0);
    Ok(count as u64)
  }
}

fn row_to_doc(r: &tokio_postgres::Row) -> Document {
  Document {
    id: r.get(0),
    collection: r.get(1),
    data: r.get(2),
    created_at: r.get(3),
    inserted_at: r.get(4),
  }
}
