//! Appwrite REST client
//!
//! 同一个客户端实现 DocumentStore / FileStorage / FunctionRunner 三个 trait，
//! 请求通过 ureq 同步发送并放到 spawn_blocking 中执行。

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error};
use ureq::Agent;

use super::{Document, DocumentList, DocumentStore, FileStorage, FunctionRunner, Query};
use crate::config::DatabaseConfig;
use crate::errors::{AdminError, Result};
use crate::utils::http::{HttpFailure, build_agent, read_json, run_blocking};

/// Appwrite 客户端
///
/// `Agent` 内部是 Arc，clone 开销很小。
#[derive(Clone)]
pub struct AppwriteClient {
    agent: Agent,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
    bucket_id: String,
}

impl AppwriteClient {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            agent: build_agent(config.timeout_secs),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id: config.database_id.clone(),
            bucket_id: config.files_bucket_id.clone(),
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    /// 发送请求并把失败转换为数据库错误
    async fn send(&self, request: Request, what: String) -> Result<Value> {
        let client = self.clone();
        debug!("Appwrite {} {}", request.method(), request.url());
        run_blocking(move || client.send_sync(request))
            .await
            .map_err(|e| {
                error!("Appwrite {} failed: {}", what, e);
                map_failure(e, &what)
            })
    }

    fn send_sync(&self, request: Request) -> std::result::Result<Value, HttpFailure> {
        let project = self.project_id.as_str();
        let key = self.api_key.as_str();
        let resp = match request {
            Request::Get { url, queries } => {
                let mut builder = self
                    .agent
                    .get(&url)
                    .header("X-Appwrite-Project", project)
                    .header("X-Appwrite-Key", key);
                for q in &queries {
                    builder = builder.query("queries[]", q);
                }
                builder.call()?
            }
            Request::Post { url, body } => self
                .agent
                .post(&url)
                .header("X-Appwrite-Project", project)
                .header("X-Appwrite-Key", key)
                .send_json(&body)?,
            Request::Patch { url, body } => self
                .agent
                .patch(&url)
                .header("X-Appwrite-Project", project)
                .header("X-Appwrite-Key", key)
                .send_json(&body)?,
            Request::Delete { url } => self
                .agent
                .delete(&url)
                .header("X-Appwrite-Project", project)
                .header("X-Appwrite-Key", key)
                .call()?,
        };
        read_json(resp)
    }
}

/// 待发送的请求，在阻塞线程中构建 ureq 请求
enum Request {
    Get { url: String, queries: Vec<String> },
    Post { url: String, body: Value },
    Patch { url: String, body: Value },
    Delete { url: String },
}

impl Request {
    fn method(&self) -> &'static str {
        match self {
            Request::Get { .. } => "GET",
            Request::Post { .. } => "POST",
            Request::Patch { .. } => "PATCH",
            Request::Delete { .. } => "DELETE",
        }
    }

    fn url(&self) -> &str {
        match self {
            Request::Get { url, .. }
            | Request::Post { url, .. }
            | Request::Patch { url, .. }
            | Request::Delete { url } => url,
        }
    }
}

fn map_failure(failure: HttpFailure, what: &str) -> AdminError {
    match failure {
        HttpFailure::Status(404, msg) => AdminError::not_found(format!("{}: {}", what, msg)),
        HttpFailure::Status(409, msg) => AdminError::conflict(format!("{}: {}", what, msg)),
        other => AdminError::database_service(format!("{}: {}", what, other)),
    }
}

fn parse_document_list(value: Value) -> Result<DocumentList> {
    let total = value["total"].as_u64().unwrap_or(0);
    let documents = match value.get("documents") {
        Some(Value::Array(items)) => items
            .iter()
            .cloned()
            .map(Document::from_value)
            .collect::<Result<Vec<_>>>()?,
        _ => {
            return Err(AdminError::database_service(
                "List response is missing documents",
            ));
        }
    };
    Ok(DocumentList { total, documents })
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList> {
        let request = Request::Get {
            url: self.documents_url(collection),
            queries: queries.iter().map(|q| q.to_string()).collect(),
        };
        let value = self
            .send(request, format!("list {}", collection))
            .await?;
        parse_document_list(value)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document> {
        let request = Request::Get {
            url: self.document_url(collection, id),
            queries: Vec::new(),
        };
        let value = self
            .send(request, format!("get {}/{}", collection, id))
            .await?;
        Document::from_value(value)
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Document> {
        let request = Request::Post {
            url: self.documents_url(collection),
            body: json!({ "documentId": "unique()", "data": data }),
        };
        let value = self
            .send(request, format!("create in {}", collection))
            .await?;
        Document::from_value(value)
    }

    async fn update_document(&self, collection: &str, id: &str, data: Value) -> Result<Document> {
        let request = Request::Patch {
            url: self.document_url(collection, id),
            body: json!({ "data": data }),
        };
        let value = self
            .send(request, format!("update {}/{}", collection, id))
            .await?;
        Document::from_value(value)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let request = Request::Delete {
            url: self.document_url(collection, id),
        };
        self.send(request, format!("delete {}/{}", collection, id))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileStorage for AppwriteClient {
    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let request = Request::Delete {
            url: format!(
                "{}/storage/buckets/{}/files/{}",
                self.endpoint, self.bucket_id, file_id
            ),
        };
        self.send(request, format!("delete file {}", file_id))
            .await
            .map_err(|e| match e {
                AdminError::DatabaseService(msg) => AdminError::file_storage(msg),
                other => other,
            })?;
        Ok(())
    }
}

#[async_trait]
impl FunctionRunner for AppwriteClient {
    async fn execute(&self, function_id: &str) -> Result<Value> {
        let request = Request::Post {
            url: format!("{}/functions/{}/executions", self.endpoint, function_id),
            body: json!({ "async": false }),
        };
        let execution = self
            .send(request, format!("execute function {}", function_id))
            .await
            .map_err(|e| AdminError::function_execution(e.message().to_string()))?;
        parse_execution(&execution)
    }
}

/// 解析函数执行结果，`responseStatusCode` 必须为 200
fn parse_execution(execution: &Value) -> Result<Value> {
    let status = execution["responseStatusCode"].as_u64().unwrap_or(0);
    if status != 200 {
        return Err(AdminError::function_execution(format!(
            "Function responded with status {}",
            status
        )));
    }
    let body = execution["responseBody"].as_str().unwrap_or_default();
    serde_json::from_str(body).map_err(|e| {
        AdminError::function_execution(format!("Function returned invalid JSON: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AppwriteClient {
        let config = DatabaseConfig {
            endpoint: "https://db.example.com/v1/".into(),
            database_id: "main".into(),
            files_bucket_id: "files".into(),
            ..Default::default()
        };
        AppwriteClient::new(&config)
    }

    #[test]
    fn test_urls() {
        let c = client();
        assert_eq!(
            c.documents_url("users"),
            "https://db.example.com/v1/databases/main/collections/users/documents"
        );
        assert_eq!(
            c.document_url("notes", "n1"),
            "https://db.example.com/v1/databases/main/collections/notes/documents/n1"
        );
    }

    #[test]
    fn test_parse_document_list() {
        let list = parse_document_list(json!({
            "total": 42,
            "documents": [{"$id": "a", "$createdAt": "2024-01-01T00:00:00Z", "name": "A"}]
        }))
        .unwrap();
        assert_eq!(list.total, 42);
        assert_eq!(list.documents[0].id, "a");

        assert!(parse_document_list(json!({"total": 1})).is_err());
    }

    #[test]
    fn test_map_failure() {
        assert!(matches!(
            map_failure(HttpFailure::Status(404, "gone".into()), "get users/x"),
            AdminError::NotFound(_)
        ));
        assert!(matches!(
            map_failure(HttpFailure::Status(500, "boom".into()), "list users"),
            AdminError::DatabaseService(_)
        ));
        assert!(matches!(
            map_failure(HttpFailure::Transport("timeout".into()), "list users"),
            AdminError::DatabaseService(_)
        ));
    }

    #[test]
    fn test_parse_execution() {
        let ok = parse_execution(&json!({
            "responseStatusCode": 200,
            "responseBody": "[{\"type\":\"note\"}]"
        }))
        .unwrap();
        assert_eq!(ok[0]["type"], "note");

        let err = parse_execution(&json!({"responseStatusCode": 500, "responseBody": ""}))
            .unwrap_err();
        assert!(matches!(err, AdminError::FunctionExecution(_)));
    }
}
