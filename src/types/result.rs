use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confirmation returned by `POST /parcels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOneResult {
  pub acknowledged: bool,
  #[serde(rename = "insertedId")]
  pub inserted_id: Uuid,
}

impl InsertOneResult {
  pub fn new(inserted_id: Uuid) -> Self {
    Self {
      acknowledged: true,
      inserted_id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
  pub acknowledged: bool,
  #[serde(rename = "deletedCount")]
  pub deleted_count: u64,
}

/// Body of a successful `DELETE /parcels/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
  pub message: String,
  pub result: DeleteResult,
}

impl DeleteResponse {
  pub fn deleted(deleted_count: u64) -> Self {
    Self {
      message: "Parcel deleted successfully".into(),
      result: DeleteResult {
        acknowledged: true,
        deleted_count,
      },
    }
  }
}
