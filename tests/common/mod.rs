//! Shared fakes for the integration tests
//!
//! `MemoryStore` evaluates the Appwrite query objects against in-memory
//! collections; the other fakes record calls and can be told to fail.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value};

use studystack_admin::analytics::{HogQlQuery, HogQlRunner};
use studystack_admin::cache::QueryCache;
use studystack_admin::config::CacheConfig;
use studystack_admin::errors::{AdminError, Result};
use studystack_admin::services::{
    AdminService, AdminSettings, AnalyticsService, Backends, Revalidator,
};
use studystack_admin::storage::{
    Document, DocumentList, DocumentStore, FileStorage, FunctionRunner, Query,
};

/// Base of the generated `$createdAt` values (2024-01-01T00:00:00Z)
const BASE_TIMESTAMP: i64 = 1_704_067_200;

pub fn timestamp(offset_secs: i64) -> String {
    DateTime::from_timestamp(BASE_TIMESTAMP + offset_secs, 0)
        .unwrap()
        .to_rfc3339()
}

fn attribute(doc: &Document, name: &str) -> Option<String> {
    match name {
        "$id" => Some(doc.id.clone()),
        "$createdAt" => Some(doc.created_at.clone()),
        _ => doc.string(name),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(doc: &Document, query: &Query) -> bool {
    match query {
        Query::Equal(attr, values) => {
            let actual = attribute(doc, attr);
            values
                .iter()
                .any(|v| actual.as_deref() == Some(value_text(v).as_str()))
        }
        Query::Search(attr, term) => attribute(doc, attr)
            .is_some_and(|a| a.to_lowercase().contains(&term.to_lowercase())),
        Query::Or(queries) => queries.iter().any(|q| matches(doc, q)),
        _ => true,
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    seq: AtomicU64,
    failing_deletes: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    pub list_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document with an explicit id and creation offset (seconds)
    pub fn insert(&self, collection: &str, id: &str, created_offset: i64, data: Value) {
        let doc = Document::new(id, timestamp(created_offset), data);
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|docs| docs.iter().map(|d| d.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned())
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.failing_deletes.lock().unwrap().insert(id.to_string());
    }

    /// Every call fails with a database service error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail_all.store(unavailable, Ordering::SeqCst);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AdminError::database_service("Appwrite is unreachable"));
        }
        Ok(())
    }

    fn not_found(collection: &str, id: &str) -> AdminError {
        AdminError::not_found(format!("Document {} not found in {}", id, collection))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection: &str, queries: &[Query]) -> Result<DocumentList> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        // Give concurrent identical reads a chance to overlap
        tokio::task::yield_now().await;

        let docs = self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        let mut filtered: Vec<Document> = docs
            .into_iter()
            .filter(|doc| queries.iter().all(|q| matches(doc, q)))
            .collect();

        let orders: Vec<(&str, bool)> = queries
            .iter()
            .filter_map(|q| match q {
                Query::OrderAsc(attr) => Some((attr.as_str(), true)),
                Query::OrderDesc(attr) => Some((attr.as_str(), false)),
                _ => None,
            })
            .collect();
        filtered.sort_by(|a, b| {
            orders.iter().fold(std::cmp::Ordering::Equal, |acc, (attr, asc)| {
                acc.then_with(|| {
                    let ord = attribute(a, attr).cmp(&attribute(b, attr));
                    if *asc { ord } else { ord.reverse() }
                })
            })
        });

        let total = filtered.len() as u64;
        let offset = queries
            .iter()
            .find_map(|q| match q {
                Query::Offset(o) => Some(*o as usize),
                _ => None,
            })
            .unwrap_or(0);
        let limit = queries
            .iter()
            .find_map(|q| match q {
                Query::Limit(l) => Some(*l as usize),
                _ => None,
            })
            .unwrap_or(25);

        let documents = filtered.into_iter().skip(offset).take(limit).collect();
        Ok(DocumentList { total, documents })
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Document> {
        self.check_available()?;
        self.get(collection, id)
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn create_document(&self, collection: &str, data: Value) -> Result<Document> {
        self.check_available()?;
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        let id = format!("gen{}", n);
        let doc = Document::new(id, timestamp(1_000_000 + n as i64), data);
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update_document(&self, collection: &str, id: &str, data: Value) -> Result<Document> {
        self.check_available()?;
        let mut collections = self.collections.lock().unwrap();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| Self::not_found(collection, id))?;
        if let Value::Object(fields) = data {
            for (key, value) in fields {
                doc.data.insert(key, value);
            }
        }
        Ok(doc.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.check_available()?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(AdminError::database_service(format!(
                "Delete of {} rejected",
                id
            )));
        }
        let mut collections = self.collections.lock().unwrap();
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| Self::not_found(collection, id))?;
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(Self::not_found(collection, id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeFiles {
    pub deleted: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeFiles {
    pub fn fail_delete_of(&self, file_id: &str) {
        self.failing.lock().unwrap().insert(file_id.to_string());
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStorage for FakeFiles {
    async fn delete_file(&self, file_id: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(file_id) {
            return Err(AdminError::file_storage(format!(
                "Storage refused to delete {}",
                file_id
            )));
        }
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

pub struct FakeFunctions {
    response: Mutex<Result<Value>>,
    pub calls: AtomicUsize,
}

impl Default for FakeFunctions {
    fn default() -> Self {
        Self {
            response: Mutex::new(Ok(Value::Array(Vec::new()))),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeFunctions {
    pub fn respond_with(&self, response: Result<Value>) {
        *self.response.lock().unwrap() = response;
    }
}

#[async_trait]
impl FunctionRunner for FakeFunctions {
    async fn execute(&self, _function_id: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeRevalidator {
    pub tags: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeRevalidator {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }
}

#[async_trait]
impl Revalidator for FakeRevalidator {
    async fn revalidate(&self, tag: &str) -> Result<()> {
        self.tags.lock().unwrap().push(tag.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AdminError::database_service("main app is down"));
        }
        Ok(())
    }
}

/// Returns the same rows for every query and records what was asked
#[derive(Default)]
pub struct FakeHogQl {
    rows: Mutex<Vec<Vec<Value>>>,
    fail: AtomicBool,
    pub queries: Mutex<Vec<HogQlQuery>>,
}

impl FakeHogQl {
    pub fn set_rows(&self, rows: Vec<Vec<Value>>) {
        *self.rows.lock().unwrap() = rows;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<HogQlQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl HogQlRunner for FakeHogQl {
    async fn run(&self, query: &HogQlQuery) -> Result<Vec<Vec<Value>>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AdminError::analytics_service("PostHog returned 503"));
        }
        Ok(self.rows.lock().unwrap().clone())
    }
}

/// Services wired to fresh fakes
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub files: Arc<FakeFiles>,
    pub functions: Arc<FakeFunctions>,
    pub revalidator: Arc<FakeRevalidator>,
    pub hogql: Arc<FakeHogQl>,
    pub cache: Arc<QueryCache>,
    pub admin: Arc<AdminService>,
    pub analytics: Arc<AnalyticsService>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_settings(AdminSettings::default())
    }

    pub fn with_settings(settings: AdminSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let files = Arc::new(FakeFiles::default());
        let functions = Arc::new(FakeFunctions::default());
        let revalidator = Arc::new(FakeRevalidator::default());
        let hogql = Arc::new(FakeHogQl::default());
        let cache = Arc::new(QueryCache::new(&CacheConfig::default()));

        let backends = Backends {
            store: store.clone(),
            files: files.clone(),
            functions: functions.clone(),
            revalidator: revalidator.clone(),
        };
        let admin = Arc::new(AdminService::new(backends, cache.clone(), settings));
        let analytics = Arc::new(AnalyticsService::new(hogql.clone(), cache.clone()));

        Self {
            store,
            files,
            functions,
            revalidator,
            hogql,
            cache,
            admin,
            analytics,
        }
    }

    pub fn add_user(&self, id: &str, offset: i64, name: &str, role: &str) {
        let prn = format!("{:0>10}", offset.unsigned_abs());
        self.store.insert(
            "users",
            id,
            offset,
            serde_json::json!({
                "prnNo": prn,
                "name": name,
                "email": format!("{}@example.com", id),
                "role": role,
                "password": "$argon2id$stub",
            }),
        );
    }

    pub fn add_note(&self, id: &str, offset: i64, title: &str, file_id: &str, uploader: &str) {
        self.store.insert(
            "notes",
            id,
            offset,
            serde_json::json!({
                "title": title,
                "description": "",
                "fileId": file_id,
                "type_of_file": "Notes",
                "semester": "3",
                "userName": uploader,
                "userId": "t1",
            }),
        );
    }

    pub fn add_link(&self, collection: &str, id: &str, offset: i64, title: &str, teacher: &str) {
        let mut data = Map::new();
        data.insert("title".into(), title.into());
        data.insert("url".into(), format!("https://example.com/{}", id).into());
        data.insert("createdBy".into(), teacher.into());
        data.insert("semester".into(), "2".into());
        if collection == "forms" {
            data.insert("formType".into(), "googleForm".into());
        }
        self.store.insert(collection, id, offset, Value::Object(data));
    }

    pub fn add_subject(&self, id: &str, name: &str, semester: &str) {
        self.store.insert(
            "subjects",
            id,
            0,
            serde_json::json!({
                "name": name,
                "abbreviation": name.chars().take(3).collect::<String>().to_uppercase(),
                "code": format!("CS{}", semester),
                "semester": semester,
                "unit": ["1", "2"],
            }),
        );
    }
}
