use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::backend::{DatabaseBackend, SqlDialect};
use crate::types::{Document, CREATED_BY_FIELD};

const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;
PRAGMA temp_store = MEMORY;
"#;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT,
    inserted_at TEXT NOT NULL
) WITHOUT ROWID;
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, created_at, inserted_at);
"#;

pub struct SqliteBackend {
  conn: Connection,
}

impl SqliteBackend {
  pub async fn new(path: &str) -> Result<Self, anyhow::Error> {
    let conn = if path == ":memory:" {
      Connection::open_in_memory().await?
    } else {
      Connection::open(path).await?
    };

    conn
      .call(|conn| conn.execute_batch(PRAGMAS).map_err(|e| e.into()))
      .await?;

    Ok(Self { conn })
  }

  pub async fn in_memory() -> Result<Self, anyhow::Error> {
    Self::new(":memory:").await
  }
}

#[async_trait]
impl DatabaseBackend for SqliteBackend {
  fn dialect(&self) -> SqlDialect {
    SqlDialect::Sqlite
  }

  async fn init_schema(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| conn.execute_batch(SCHEMA).map_err(|e| e.into()))
      .await?;
    tracing::info!("SQLite schema initialized");
    Ok(())
  }

  async fn drop_schema(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| {
        conn
          .execute_batch("DROP TABLE IF EXISTS documents;")
          .map_err(|e| e.into())
      })
      .await?;
    Ok(())
  }

  async fn ping(&self) -> Result<(), anyhow::Error> {
    self
      .conn
      .call(|conn| {
        // Touches the documents table so a missing schema is not ready
        let mut stmt = conn.prepare("SELECT 1 FROM documents LIMIT 1")?;
        let found = stmt.exists([])?;
        Ok(found)
      })
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
    let data_str = serde_json::to_string(&data)?;
    let created_str = created_at.map(format_ts);
    let inserted_str = format_ts(inserted_at);
    let col = collection.to_string();
    let id_str = id.to_string();

    self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO documents (id, collection, data, created_at, inserted_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id_str, col, data_str, created_str, inserted_str],
          )
          .map_err(|e| e.into())
      })
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
    let col = collection.to_string();
    let id_str = id.to_string();

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT id, collection, data, created_at, inserted_at FROM documents WHERE collection = ?1 AND id = ?2",
        )?;
        let mut rows = stmt.query(params![col, id_str])?;
        if let Some(row) = rows.next()? {
          Ok(Some(row_to_doc(row)?))
        } else {
          Ok(None)
        }
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn delete(&self, collection: &str, id: Uuid) -> Result<u64, anyhow::Error> {
    let col = collection.to_string();
    let id_str = id.to_string();

    let deleted: usize = self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![col, id_str],
          )
          .map_err(|e| e.into())
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn list(
    &self,
    collection: &str,
    created_by: Option<&str>,
  ) -> Result<Vec<Document>, anyhow::Error> {
    let col = collection.to_string();
    let created_by = created_by.map(str::to_string);

    let mut sql = String::with_capacity(256);
    sql.push_str("SELECT id, collection, data, created_at, inserted_at FROM documents WHERE collection = ?1");
    if created_by.is_some() {
      sql.push_str(" AND ");
      sql.push_str(&self.dialect().json_text(CREATED_BY_FIELD));
      sql.push_str(" = ?2");
    }
    // Rows without a client timestamp sort after every row that has one
    sql.push_str(" ORDER BY created_at IS NULL, created_at DESC, inserted_at DESC, id DESC");

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = match &created_by {
          Some(email) => stmt.query(params![col, email])?,
          None => stmt.query(params![col])?,
        };
        let mut docs = Vec::new();
        while let Some(row) = rows.next()? {
          docs.push(row_to_doc(row)?);
        }
        Ok(docs)
      })
      .await
      .map_err(|e| anyhow::anyhow!("{}", e))
  }

  async fn count(&self, collection: &str) -> Result<u64, anyhow::Error> {
    let col = collection.to_string();
    let count: i64 = self
      .conn
      .call(move |conn| {
        conn
          .query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![col],
            |row| row.get(0),
          )
          .map_err(|e| e.into())
      })
      .await?;
    Ok(count as u64)
  }
}

#[inline]
fn row_to_doc(row: &rusqlite::Row) -> Result<Document, rusqlite::Error> {
  let id_str: String = row.get(0)?;
  let data_str: String = row.get(2)?;
  let created_str: Option<String> = row.get(3)?;
  let inserted_str: String = row.get(4)?;
  Ok(Document {
    id: id_str.parse().unwrap_or_default(),
    collection: row.get(1)?,
    data: serde_json::from_str(&data_str).unwrap_or(serde_json::Value::Null),
    created_at: created_str.as_deref().and_then(parse_ts),
    inserted_at: parse_ts(&inserted_str).unwrap_or_else(Utc::now),
  })
}

/// Fixed-width timestamps so text ordering matches time ordering
fn format_ts(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .ok()
    .map(|d| d.with_timezone(&Utc))
}
