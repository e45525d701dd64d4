use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored document row.
///
/// `created_at` is the client's `createdAt` and the primary sort key; rows
/// without one sort last. `inserted_at` breaks ties, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub id: Uuid,
  pub collection: String,
  pub data: serde_json::Value,
  pub created_at: Option<DateTime<Utc>>,
  pub inserted_at: DateTime<Utc>,
}
