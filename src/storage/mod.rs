//! Document database access
//!
//! The platform's records live in an external Appwrite database. Everything
//! in this crate talks to it through the [`DocumentStore`], [`FileStorage`]
//! and [`FunctionRunner`] traits so the HTTP client can be swapped for
//! in-memory fakes in tests.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::{AdminError, Result};

pub mod appwrite;
pub mod models;
pub mod query;

pub use appwrite::AppwriteClient;
pub use query::{CREATED_AT, Query};

/// A raw document as returned by the database
///
/// System attributes (`$id`, `$createdAt`) are lifted out; user attributes
/// stay in `data`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub created_at: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, created_at: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            created_at: created_at.into(),
            data,
        }
    }

    /// Split an API payload into system and user attributes
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(AdminError::database_service(
                "Document payload is not an object",
            ));
        };

        let mut id = None;
        let mut created_at = String::new();
        let mut data = Map::new();
        for (key, value) in map {
            match key.as_str() {
                "$id" => id = value.as_str().map(String::from),
                "$createdAt" => created_at = value.as_str().unwrap_or_default().to_string(),
                k if k.starts_with('$') => {}
                _ => {
                    data.insert(key, value);
                }
            }
        }

        let id = id.ok_or_else(|| AdminError::database_service("Document is missing $id"))?;
        Ok(Self {
            id,
            created_at,
            data,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String attribute, numbers are rendered as text
    pub fn string(&self, key: &str) -> Option<String> {
        match self.data.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string_or_default(&self, key: &str) -> String {
        self.string(key).unwrap_or_default()
    }

    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.data.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList>;

    /// Fails with `AdminError::NotFound` when the id does not exist
    async fn get_document(&self, collection: &str, id: &str) -> Result<Document>;

    /// Creates a document under a server-generated id
    async fn create_document(&self, collection: &str, data: Value) -> Result<Document>;

    /// Partial update, only the given attributes change
    async fn update_document(&self, collection: &str, id: &str, data: Value) -> Result<Document>;

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}

/// Binary file storage backing note uploads
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn delete_file(&self, file_id: &str) -> Result<()>;
}

/// Serverless function execution
#[async_trait]
pub trait FunctionRunner: Send + Sync {
    /// Runs the function synchronously and returns its parsed JSON body.
    /// A non-200 function status is an error.
    async fn execute(&self, function_id: &str) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_splits_system_attributes() {
        let doc = Document::from_value(json!({
            "$id": "u1",
            "$createdAt": "2024-01-05T10:00:00.000+00:00",
            "$permissions": [],
            "name": "Asha",
            "semester": 3,
        }))
        .unwrap();

        assert_eq!(doc.id, "u1");
        assert_eq!(doc.created_at, "2024-01-05T10:00:00.000+00:00");
        assert_eq!(doc.string("name").as_deref(), Some("Asha"));
        assert_eq!(doc.string("semester").as_deref(), Some("3"));
        assert!(doc.get("$permissions").is_none());
    }

    #[test]
    fn test_from_value_requires_id() {
        let err = Document::from_value(json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, AdminError::DatabaseService(_)));
    }

    #[test]
    fn test_string_list_accepts_numbers() {
        let doc = Document::new("s1", "", json!({"unit": ["1", 2, null]}));
        assert_eq!(doc.string_list("unit"), vec!["1", "2"]);
        assert!(doc.string_list("missing").is_empty());
    }
}
