//! SQLite-backed `DocumentStore` for local runs and tests.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, warn};

use st_core::error::{StError, StResult};

use crate::db::Database;
use crate::path::{validate_collection, DocPath};
use crate::store::{merge_values, Document, DocumentStore, WriteBatch, WriteOp};

/// Document store over a single `documents` table.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    database: Database,
    read_only: bool,
}

impl SqliteDocumentStore {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            read_only: false,
        }
    }

    /// Refuse every write with `StError::PermissionDenied`.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn check_writable(&self, operation: &str, path: &str) -> StResult<()> {
        if self.read_only {
            warn!("store is read-only, refusing {operation} on {path}");
            return Err(StError::PermissionDenied {
                operation: operation.to_string(),
                path: path.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, path: &str) -> StResult<Option<Document>> {
        let doc_path = DocPath::parse(path)?;
        let conn = self.database.conn()?;
        read_doc(&conn, &doc_path)
    }

    async fn set(&self, path: &str, data: Value) -> StResult<()> {
        let doc_path = DocPath::parse(path)?;
        self.check_writable("set", path)?;
        let conn = self.database.conn()?;
        write_doc(&conn, &doc_path, &data)
    }

    async fn merge(&self, path: &str, data: Value) -> StResult<()> {
        let doc_path = DocPath::parse(path)?;
        self.check_writable("merge", path)?;
        self.database.transaction(|conn| merge_doc(conn, &doc_path, data))
    }

    async fn delete(&self, path: &str) -> StResult<bool> {
        let doc_path = DocPath::parse(path)?;
        self.check_writable("delete", path)?;
        let conn = self.database.conn()?;
        delete_doc(&conn, &doc_path)
    }

    async fn list(&self, collection: &str) -> StResult<Vec<Document>> {
        validate_collection(collection)?;
        let collection = collection.trim_matches('/');
        let conn = self.database.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY id")
            .map_err(|e| StError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| StError::Store(e.to_string()))?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, raw) = row.map_err(|e| StError::Store(e.to_string()))?;
            docs.push(Document {
                path: format!("{collection}/{id}"),
                data: serde_json::from_str(&raw)?,
                id,
            });
        }
        debug!("listed {} document(s) in {collection}", docs.len());
        Ok(docs)
    }

    async fn commit(&self, batch: WriteBatch) -> StResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if let Some(first) = batch.ops().first() {
            self.check_writable("commit", first.path())?;
        }

        let count = batch.len();
        self.database.transaction(|conn| {
            for op in batch.into_ops() {
                match op {
                    WriteOp::Set { path, data } => {
                        write_doc(conn, &DocPath::parse(&path)?, &data)?;
                    }
                    WriteOp::Create { path, data } => {
                        create_doc(conn, &DocPath::parse(&path)?, &data)?;
                    }
                    WriteOp::Merge { path, data } => {
                        merge_doc(conn, &DocPath::parse(&path)?, data)?;
                    }
                    WriteOp::Delete { path } => {
                        delete_doc(conn, &DocPath::parse(&path)?)?;
                    }
                }
            }
            Ok(())
        })?;
        debug!("committed batch of {count} write(s)");
        Ok(())
    }
}

fn read_doc(conn: &Connection, path: &DocPath) -> StResult<Option<Document>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![path.collection, path.id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StError::Store(e.to_string()))?;

    match raw {
        Some(raw) => Ok(Some(Document {
            id: path.id.clone(),
            path: path.full(),
            data: serde_json::from_str(&raw)?,
        })),
        None => Ok(None),
    }
}

fn write_doc(conn: &Connection, path: &DocPath, data: &Value) -> StResult<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (collection, id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(collection, id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at",
        params![path.collection, path.id, data.to_string(), now],
    )
    .map_err(|e| StError::Store(e.to_string()))?;
    Ok(())
}

/// Insert only if absent, in a single statement so concurrent creators
/// cannot both succeed.
fn create_doc(conn: &Connection, path: &DocPath, data: &Value) -> StResult<()> {
    let now = Utc::now().to_rfc3339();
    let inserted = conn
        .execute(
            "INSERT INTO documents (collection, id, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(collection, id) DO NOTHING",
            params![path.collection, path.id, data.to_string(), now],
        )
        .map_err(|e| StError::Store(e.to_string()))?;
    if inserted == 0 {
        return Err(StError::AlreadyExists(path.full()));
    }
    Ok(())
}

fn merge_doc(conn: &Connection, path: &DocPath, patch: Value) -> StResult<()> {
    let mut data = read_doc(conn, path)?
        .map(|doc| doc.data)
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    merge_values(&mut data, patch);
    write_doc(conn, path, &data)
}

fn delete_doc(conn: &Connection, path: &DocPath) -> StResult<bool> {
    let changed = conn
        .execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![path.collection, path.id],
        )
        .map_err(|e| StError::Store(e.to_string()))?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use st_core::config::StoreConfig;
    use tempfile::TempDir;

    fn test_store() -> (SqliteDocumentStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("docs.db"), &StoreConfig::default()).unwrap();
        (SqliteDocumentStore::new(db), dir)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (store, _dir) = test_store();
        store.set("users/u1", json!({"username": "alice"})).await.unwrap();

        let doc = store.get("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.id, "u1");
        assert_eq!(doc.data["username"], "alice");

        assert!(store.delete("users/u1").await.unwrap());
        assert!(!store.delete("users/u1").await.unwrap());
        assert!(store.get("users/u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_creates_and_updates() {
        let (store, _dir) = test_store();
        store.merge("users/u1", json!({"about": "hi"})).await.unwrap();
        store.merge("users/u1", json!({"language": "fr"})).await.unwrap();
        let doc = store.get("users/u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"about": "hi", "language": "fr"}));
    }

    #[tokio::test]
    async fn test_list_only_direct_children() {
        let (store, _dir) = test_store();
        store.set("users/u1/contacts/b", json!({"n": 2})).await.unwrap();
        store.set("users/u1/contacts/a", json!({"n": 1})).await.unwrap();
        store.set("users/u2/contacts/c", json!({"n": 3})).await.unwrap();
        store.set("users/u1", json!({})).await.unwrap();

        let docs = store.list("users/u1/contacts").await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(docs[0].path, "users/u1/contacts/a");
    }

    #[tokio::test]
    async fn test_commit_is_atomic() {
        let (store, _dir) = test_store();
        let mut batch = WriteBatch::new();
        batch.set("groups/g1", &json!({"name": "g"})).unwrap();
        batch.set("users/u1/contacts/", &json!({})).unwrap();

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StError::InvalidPath(_)));
        assert!(store.get("groups/g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_applies_all_ops() {
        let (store, _dir) = test_store();
        store.set("users/u1/subscriptions/s1", json!({"token": "t"})).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.set("groups/g1", &json!({"name": "g"})).unwrap();
        batch.merge("users/u1", &json!({"about": "x"})).unwrap();
        batch.delete("users/u1/subscriptions/s1");
        store.commit(batch).await.unwrap();

        assert!(store.get("groups/g1").await.unwrap().is_some());
        assert_eq!(store.get("users/u1").await.unwrap().unwrap().data["about"], "x");
        assert!(store.get("users/u1/subscriptions/s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_only_denies_writes() {
        let (store, _dir) = test_store();
        let store = store.read_only(true);

        let err = store.set("users/u1", json!({})).await.unwrap_err();
        match err {
            StError::PermissionDenied { operation, path } => {
                assert_eq!(operation, "set");
                assert_eq!(path, "users/u1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.get("users/u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_paths() {
        let (store, _dir) = test_store();
        assert!(store.get("users").await.is_err());
        assert!(store.list("users/u1").await.is_err());
    }

    #[tokio::test]
    async fn test_create_fails_when_document_exists() {
        let (store, _dir) = test_store();
        store.set("usernames/asha", json!({"uid": "u1"})).await.unwrap();

        let mut batch = WriteBatch::new();
        batch.create("usernames/asha", &json!({"uid": "u2"})).unwrap();
        batch.set("users/u2", &json!({"username": "asha"})).unwrap();

        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StError::AlreadyExists(ref p) if p == "usernames/asha"));
        let claim = store.get("usernames/asha").await.unwrap().unwrap();
        assert_eq!(claim.data["uid"], "u1");
        assert!(store.get("users/u2").await.unwrap().is_none());

        let mut batch = WriteBatch::new();
        batch.create("usernames/ravi", &json!({"uid": "u2"})).unwrap();
        store.commit(batch).await.unwrap();
        assert!(store.get("usernames/ravi").await.unwrap().is_some());
    }
}
