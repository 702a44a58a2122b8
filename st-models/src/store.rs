//! The document store seam.
//!
//! Flows and data operations only see `DocumentStore`. The managed
//! platform's client and the local SQLite adapter both sit behind it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use st_core::error::{StError, StResult};

/// A stored document: its id within the collection, full path, and data.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub data: Value,
}

impl Document {
    /// Deserialize the document data into a typed shape.
    pub fn decode<T: DeserializeOwned>(&self) -> StResult<T> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| StError::Serialization(format!("{}: {e}", self.path)))
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace the document.
    Set { path: String, data: Value },
    /// Create the document; the whole batch fails with
    /// `StError::AlreadyExists` if it is already there.
    Create { path: String, data: Value },
    /// Deep-merge object fields into the document, creating it if missing.
    Merge { path: String, data: Value },
    /// Remove the document if present.
    Delete { path: String },
}

impl WriteOp {
    /// The document path this op targets.
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. }
            | Self::Create { path, .. }
            | Self::Merge { path, .. }
            | Self::Delete { path } => path,
        }
    }
}

/// An ordered group of writes committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full replace of the document at `path`.
    pub fn set<T: Serialize>(&mut self, path: impl Into<String>, value: &T) -> StResult<&mut Self> {
        self.ops.push(WriteOp::Set {
            path: path.into(),
            data: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    /// Queue a create of the document at `path`. The commit fails if it exists.
    pub fn create<T: Serialize>(&mut self, path: impl Into<String>, value: &T) -> StResult<&mut Self> {
        self.ops.push(WriteOp::Create {
            path: path.into(),
            data: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    /// Queue a merge into the document at `path`.
    pub fn merge<T: Serialize>(&mut self, path: impl Into<String>, value: &T) -> StResult<&mut Self> {
        self.ops.push(WriteOp::Merge {
            path: path.into(),
            data: serde_json::to_value(value)?,
        });
        Ok(self)
    }

    /// Queue a delete of the document at `path`.
    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { path: path.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Minimal document database client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. `Ok(None)` if it does not exist.
    async fn get(&self, path: &str) -> StResult<Option<Document>>;

    /// Replace (or create) one document.
    async fn set(&self, path: &str, data: Value) -> StResult<()>;

    /// Deep-merge fields into one document, creating it if missing.
    async fn merge(&self, path: &str, data: Value) -> StResult<()>;

    /// Delete one document. Returns whether it existed.
    async fn delete(&self, path: &str) -> StResult<bool>;

    /// List every document directly inside a collection, ordered by id.
    async fn list(&self, collection: &str) -> StResult<Vec<Document>>;

    /// Apply all writes or none.
    async fn commit(&self, batch: WriteBatch) -> StResult<()>;
}

/// Read a document and decode it.
pub async fn get_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &str,
) -> StResult<Option<T>> {
    match store.get(path).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

/// Encode a value and replace the document with it.
pub async fn set_as<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    path: &str,
    value: &T,
) -> StResult<()> {
    store.set(path, serde_json::to_value(value)?).await
}

/// Deep-merge `patch` into `base`. Objects merge key by key; anything else replaces.
pub fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_values_nested() {
        let mut base = json!({"a": 1, "n": {"x": 1, "y": 2}});
        merge_values(&mut base, json!({"b": 2, "n": {"y": 3}}));
        assert_eq!(base, json!({"a": 1, "b": 2, "n": {"x": 1, "y": 3}}));
    }

    #[test]
    fn test_merge_values_replaces_non_objects() {
        let mut base = json!({"list": [1, 2]});
        merge_values(&mut base, json!({"list": [3]}));
        assert_eq!(base, json!({"list": [3]}));

        let mut scalar = json!(5);
        merge_values(&mut scalar, json!({"k": 1}));
        assert_eq!(scalar, json!({"k": 1}));
    }

    #[test]
    fn test_write_batch_builder() {
        let mut batch = WriteBatch::new();
        batch.set("groups/g1", &json!({"name": "x"})).unwrap();
        batch.delete("users/u1/subscriptions/s1");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.ops()[1].path(), "users/u1/subscriptions/s1");
    }

    #[test]
    fn test_document_decode_error_names_path() {
        let doc = Document {
            id: "u1".into(),
            path: "users/u1".into(),
            data: json!("not an object"),
        };
        let err = doc.decode::<std::collections::HashMap<String, String>>().unwrap_err();
        assert!(err.to_string().contains("users/u1"));
    }
}
