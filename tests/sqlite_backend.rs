use chrono::{TimeZone, Utc};
use parceld::db::{DatabaseBackend, SqlDialect, SqliteBackend};
use serde_json::json;

async fn backend() -> SqliteBackend {
  let backend = SqliteBackend::in_memory().await.unwrap();
  backend.init_schema().await.unwrap();
  backend
}

#[tokio::test]
async fn test_sqlite_backend_init_schema_is_idempotent() {
  let backend = backend().await;
  // Should not fail on re-init
  backend.init_schema().await.unwrap();
  backend.ping().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_backend_dialect() {
  let backend = SqliteBackend::in_memory().await.unwrap();
  assert_eq!(backend.dialect(), SqlDialect::Sqlite);
  assert_eq!(
    backend.dialect().json_text("created_by"),
    "json_extract(data, '$.created_by')"
  );
}

#[tokio::test]
async fn test_sqlite_backend_insert_and_get() {
  let backend = backend().await;

  let data = json!({"created_by": "a@x.com", "weight": 2});
  let doc = backend.insert("parcels", data.clone(), None).await.unwrap();

  assert!(!doc.id.is_nil());
  assert_eq!(doc.collection, "parcels");
  assert_eq!(doc.data, data);

  let retrieved = backend.get("parcels", doc.id).await.unwrap().unwrap();
  assert_eq!(retrieved.id, doc.id);
  assert_eq!(retrieved.data, data);
}

#[tokio::test]
async fn test_sqlite_backend_assigns_distinct_ids() {
  let backend = backend().await;

  let data = json!({"created_by": "a@x.com"});
  let a = backend.insert("parcels", data.clone(), None).await.unwrap();
  let b = backend.insert("parcels", data, None).await.unwrap();

  assert_ne!(a.id, b.id);
  assert_eq!(backend.count("parcels").await.unwrap(), 2);
}

#[tokio::test]
async fn test_sqlite_backend_get_missing() {
  let backend = backend().await;
  let missing = backend.get("parcels", uuid::Uuid::new_v4()).await.unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn test_sqlite_backend_delete() {
  let backend = backend().await;

  let doc = backend
    .insert("parcels", json!({"name": "box"}), None)
    .await
    .unwrap();

  assert_eq!(backend.delete("parcels", doc.id).await.unwrap(), 1);
  assert!(backend.get("parcels", doc.id).await.unwrap().is_none());
  assert_eq!(backend.delete("parcels", doc.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sqlite_backend_delete_missing_keeps_count() {
  let backend = backend().await;
  backend
    .insert("parcels", json!({"name": "box"}), None)
    .await
    .unwrap();

  let deleted = backend
    .delete("parcels", uuid::Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(deleted, 0);
  assert_eq!(backend.count("parcels").await.unwrap(), 1);
}

#[tokio::test]
async fn test_sqlite_backend_list_sorted_newest_first() {
  let backend = backend().await;

  for (label, day) in [("old", 1), ("newest", 3), ("middle", 2)] {
    let at = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
    backend
      .insert("parcels", json!({"label": label}), Some(at))
      .await
      .unwrap();
  }

  let docs = backend.list("parcels", None).await.unwrap();
  let labels: Vec<_> = docs.iter().map(|d| d.data["label"].clone()).collect();
  assert_eq!(labels, vec![json!("newest"), json!("middle"), json!("old")]);
}

#[tokio::test]
async fn test_sqlite_backend_list_puts_undated_last() {
  let backend = backend().await;

  let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
  let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
  backend
    .insert("parcels", json!({"n": 1}), Some(future))
    .await
    .unwrap();
  let undated = backend.insert("parcels", json!({"n": 2}), None).await.unwrap();
  backend
    .insert("parcels", json!({"n": 3}), Some(past))
    .await
    .unwrap();
  assert_eq!(undated.created_at, None);

  let docs = backend.list("parcels", None).await.unwrap();
  let ns: Vec<_> = docs.iter().map(|d| d.data["n"].clone()).collect();
  assert_eq!(ns, vec![json!(1), json!(3), json!(2)]);
  assert_eq!(docs[0].created_at, Some(future));
  assert_eq!(docs[2].created_at, None);
}

#[tokio::test]
async fn test_sqlite_backend_undated_ties_break_on_insertion_time() {
  let backend = backend().await;

  let first = backend.insert("parcels", json!({"n": 1}), None).await.unwrap();
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = backend.insert("parcels", json!({"n": 2}), None).await.unwrap();
  assert!(second.inserted_at > first.inserted_at);

  let docs = backend.list("parcels", None).await.unwrap();
  let ids: Vec<_> = docs.iter().map(|d| d.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_sqlite_backend_list_filters_by_created_by() {
  let backend = backend().await;

  let t = |day| Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
  backend
    .insert("parcels", json!({"created_by": "a@x.com", "n": 1}), Some(t(1)))
    .await
    .unwrap();
  backend
    .insert("parcels", json!({"created_by": "b@x.com", "n": 2}), Some(t(2)))
    .await
    .unwrap();
  backend
    .insert("parcels", json!({"created_by": "a@x.com", "n": 3}), Some(t(3)))
    .await
    .unwrap();
  backend
    .insert("parcels", json!({"n": 4}), Some(t(4)))
    .await
    .unwrap();

  let docs = backend.list("parcels", Some("a@x.com")).await.unwrap();
  let ns: Vec<_> = docs.iter().map(|d| d.data["n"].clone()).collect();
  assert_eq!(ns, vec![json!(3), json!(1)]);

  let none = backend.list("parcels", Some("nobody@x.com")).await.unwrap();
  assert!(none.is_empty());

  assert_eq!(backend.list("parcels", None).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_sqlite_backend_collections_are_isolated() {
  let backend = backend().await;

  let doc = backend
    .insert("parcels", json!({"name": "box"}), None)
    .await
    .unwrap();
  backend
    .insert("archive", json!({"name": "crate"}), None)
    .await
    .unwrap();

  assert!(backend.get("archive", doc.id).await.unwrap().is_none());
  assert_eq!(backend.delete("archive", doc.id).await.unwrap(), 0);
  assert_eq!(backend.list("parcels", None).await.unwrap().len(), 1);
  assert_eq!(backend.count("archive").await.unwrap(), 1);
}

#[tokio::test]
async fn test_sqlite_backend_file_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("parcels.db");
  let path = path.to_str().unwrap();

  let id = {
    let backend = SqliteBackend::new(path).await.unwrap();
    backend.init_schema().await.unwrap();
    backend
      .insert("parcels", json!({"created_by": "a@x.com"}), None)
      .await
      .unwrap()
      .id
  };

  let reopened = SqliteBackend::new(path).await.unwrap();
  reopened.init_schema().await.unwrap();
  let doc = reopened.get("parcels", id).await.unwrap().unwrap();
  assert_eq!(doc.data["created_by"], "a@x.com");
}

#[tokio::test]
async fn test_sqlite_backend_drop_schema() {
  let backend = backend().await;
  backend
    .insert("parcels", json!({"name": "box"}), None)
    .await
    .unwrap();

  backend.drop_schema().await.unwrap();
  assert!(backend.count("parcels").await.is_err());
  assert!(backend.ping().await.is_err());

  backend.init_schema().await.unwrap();
  assert_eq!(backend.count("parcels").await.unwrap(), 0);
  backend.ping().await.unwrap();
}
