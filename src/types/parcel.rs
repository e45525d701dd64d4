use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::Document;

/// Field holding the storage-assigned identifier on the wire
pub const ID_FIELD: &str = "id";
/// Submitter email, used by the list filter
pub const CREATED_BY_FIELD: &str = "created_by";
/// Client timestamp, used as the list sort key
pub const CREATED_AT_FIELD: &str = "createdAt";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParcelError {
  #[error("Parcel body must be a JSON object")]
  NotAnObject,
  #[error("Field 'created_by' must be a string")]
  InvalidCreatedBy,
  #[error("Field 'createdAt' must be an RFC 3339 timestamp or epoch milliseconds")]
  InvalidCreatedAt,
}

/// A parcel body submitted for creation.
///
/// No schema is enforced. Only `created_by` and `createdAt` are checked,
/// every other field is kept as-is. A client-supplied `id` is dropped since
/// identifiers belong to the storage layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParcel {
  fields: Map<String, Value>,
  created_at: Option<DateTime<Utc>>,
}

impl NewParcel {
  pub fn from_value(value: Value) -> Result<Self, ParcelError> {
    let Value::Object(mut fields) = value else {
      return Err(ParcelError::NotAnObject);
    };
    fields.remove(ID_FIELD);

    match fields.get(CREATED_BY_FIELD) {
      None | Some(Value::Null) | Some(Value::String(_)) => {}
      Some(_) => return Err(ParcelError::InvalidCreatedBy),
    }

    let created_at = match fields.get(CREATED_AT_FIELD) {
      None | Some(Value::Null) => None,
      Some(Value::String(s)) => Some(
        DateTime::parse_from_rfc3339(s)
          .map_err(|_| ParcelError::InvalidCreatedAt)?
          .with_timezone(&Utc),
      ),
      // Integer milliseconds since the Unix epoch, as JavaScript's Date.now()
      Some(Value::Number(n)) => Some(
        n.as_i64()
          .and_then(DateTime::<Utc>::from_timestamp_millis)
          .ok_or(ParcelError::InvalidCreatedAt)?,
      ),
      Some(_) => return Err(ParcelError::InvalidCreatedAt),
    };

    Ok(Self { fields, created_at })
  }

  pub fn created_by(&self) -> Option<&str> {
    self.fields.get(CREATED_BY_FIELD).and_then(Value::as_str)
  }

  pub fn created_at(&self) -> Option<DateTime<Utc>> {
    self.created_at
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  pub fn into_value(self) -> Value {
    Value::Object(self.fields)
  }
}

/// A parcel as returned to clients: the stored fields plus `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
  pub id: Uuid,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

impl From<Document> for Parcel {
  fn from(doc: Document) -> Self {
    let mut fields = match doc.data {
      Value::Object(map) => map,
      _ => Map::new(),
    };
    fields.remove(ID_FIELD);
    Self { id: doc.id, fields }
  }
}

/// Query string accepted by `GET /parcels`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParcelQuery {
  /// Exact match on `created_by`. Any string is accepted.
  pub email: Option<String>,
}
