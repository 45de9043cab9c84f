use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::NotionClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug)]
pub struct FakeNotionClient {
    connection_ok: AtomicBool,
    search_fails: AtomicBool,
    query_fails: AtomicBool,
    databases: Vec<Value>,
    database_entries: Mutex<Vec<Value>>,
    failing_create_calls: Mutex<HashSet<usize>>,
    create_calls: AtomicUsize,
    created: Mutex<Vec<(String, Value)>>,
}

impl Default for FakeNotionClient {
    fn default() -> Self {
        Self {
            connection_ok: AtomicBool::new(true),
            search_fails: AtomicBool::new(false),
            query_fails: AtomicBool::new(false),
            databases: Vec::new(),
            database_entries: Mutex::new(Vec::new()),
            failing_create_calls: Mutex::new(HashSet::new()),
            create_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl FakeNotionClient {
    pub fn with_databases(mut self, databases: Vec<Value>) -> Self {
        self.databases = databases;
        self
    }

    pub fn with_entries(self, entries: Vec<Value>) -> Self {
        *self
            .database_entries
            .lock()
            .expect("entries mutex poisoned") = entries;
        self
    }

    pub fn set_connection_ok(&self, ok: bool) {
        self.connection_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_search_fails(&self, fails: bool) {
        self.search_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_query_fails(&self, fails: bool) {
        self.query_fails.store(fails, Ordering::SeqCst);
    }

    /// Makes the n-th (0-based) create call fail.
    pub fn fail_create_call(&self, call_index: usize) {
        self.failing_create_calls
            .lock()
            .expect("failing calls mutex poisoned")
            .insert(call_index);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<(String, Value)> {
        self.created.lock().expect("created mutex poisoned").clone()
    }
}

pub fn remote_task(name: Option<&str>, tag: Option<&str>) -> Value {
    let mut properties = serde_json::Map::new();
    if let Some(name) = name {
        properties.insert(
            "Name".to_string(),
            json!({ "title": [{ "plain_text": name, "text": { "content": name } }] }),
        );
    }
    if let Some(tag) = tag {
        properties.insert("Tags".to_string(), json!({ "multi_select": [{ "name": tag }] }));
    }
    json!({ "object": "page", "properties": Value::Object(properties) })
}

#[async_trait]
impl NotionClient for FakeNotionClient {
    async fn test_connection(&self, _token: &str) -> Result<(), InfraError> {
        if self.connection_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InfraError::Notion("notion api error: http 401".to_string()))
        }
    }

    async fn search_databases(&self, _token: &str) -> Result<Vec<Value>, InfraError> {
        if self.search_fails.load(Ordering::SeqCst) {
            return Err(InfraError::Notion("network error while searching databases".to_string()));
        }
        Ok(self.databases.clone())
    }

    async fn query_database(&self, _token: &str, _database_id: &str) -> Result<Vec<Value>, InfraError> {
        if self.query_fails.load(Ordering::SeqCst) {
            return Err(InfraError::Notion("network error while querying database".to_string()));
        }
        Ok(self
            .database_entries
            .lock()
            .expect("entries mutex poisoned")
            .clone())
    }

    async fn create_page(
        &self,
        _token: &str,
        database_id: &str,
        properties: &Value,
    ) -> Result<Value, InfraError> {
        let call_index = self.create_calls.fetch_add(1, Ordering::SeqCst);
        let fails = self
            .failing_create_calls
            .lock()
            .expect("failing calls mutex poisoned")
            .contains(&call_index);
        if fails {
            return Err(InfraError::Notion("notion api error: http 500".to_string()));
        }
        self.created
            .lock()
            .expect("created mutex poisoned")
            .push((database_id.to_string(), properties.clone()));
        Ok(json!({ "object": "page", "id": format!("page-{call_index}") }))
    }
}
