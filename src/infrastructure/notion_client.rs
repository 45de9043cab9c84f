use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::collections::HashSet;
use url::Url;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1/";
pub const NOTION_VERSION: &str = "2022-06-28";

/// The subset of the Notion REST API the sync core depends on. Remote
/// objects are returned loosely typed; shape handling lives in the
/// property mapper.
#[async_trait]
pub trait NotionClient: Send + Sync {
    async fn test_connection(&self, token: &str) -> Result<(), InfraError>;

    async fn search_databases(&self, token: &str) -> Result<Vec<Value>, InfraError>;

    async fn query_database(&self, token: &str, database_id: &str) -> Result<Vec<Value>, InfraError>;

    async fn create_page(
        &self,
        token: &str,
        database_id: &str,
        properties: &Value,
    ) -> Result<Value, InfraError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestNotionClient {
    client: Client,
    base_url: Url,
}

impl Default for ReqwestNotionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestNotionClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: Url::parse(NOTION_API_BASE).expect("valid notion api base url"),
        }
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, InfraError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|error| InfraError::InvalidConfig(format!("invalid notion api base url: {error}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::Notion(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn notion_http_error(status: StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("notion api error: http {}", status.as_u16())
        } else {
            format!("notion api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Notion(message)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                InfraError::Notion("notion api base URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Sends one request and returns the parsed body. Anything but HTTP 200
    /// is a failure.
    async fn send(
        &self,
        method: Method,
        url: Url,
        token: &str,
        body: Option<&Value>,
        action: &str,
    ) -> Result<Value, InfraError> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| InfraError::Notion(format!("network error while {action}: {error}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| InfraError::Notion(format!("failed reading response while {action}: {error}")))?;

        if status != StatusCode::OK {
            return Err(Self::notion_http_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|error| {
            InfraError::Notion(format!("invalid payload while {action}: {error}; body={text}"))
        })
    }

    /// Follows `has_more` / `next_cursor` pagination for list endpoints.
    async fn collect_pages(
        &self,
        url: Url,
        token: &str,
        base_body: Value,
        action: &str,
    ) -> Result<Vec<Value>, InfraError> {
        let mut results = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let mut body = base_body.clone();
            if let (Some(cursor), Some(object)) = (cursor.as_deref(), body.as_object_mut()) {
                object.insert("start_cursor".to_string(), Value::String(cursor.to_string()));
            }

            let mut page = self
                .send(Method::POST, url.clone(), token, Some(&body), action)
                .await?;

            if let Some(Value::Array(items)) = page.get_mut("results").map(Value::take) {
                results.extend(items);
            }

            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            let next_cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned);

            match next_cursor {
                Some(next) if has_more && seen_cursors.insert(next.clone()) => cursor = Some(next),
                Some(next) if has_more => {
                    tracing::warn!(cursor = %next, action, "notion repeated a pagination cursor; stopping");
                    break;
                }
                _ => break,
            }
        }

        Ok(results)
    }
}

#[async_trait]
impl NotionClient for ReqwestNotionClient {
    async fn test_connection(&self, token: &str) -> Result<(), InfraError> {
        Self::ensure_non_empty(token, "notion token")?;
        let url = self.endpoint(&["users", "me"])?;
        self.send(Method::GET, url, token, None, "checking identity")
            .await
            .map(|_| ())
    }

    async fn search_databases(&self, token: &str) -> Result<Vec<Value>, InfraError> {
        Self::ensure_non_empty(token, "notion token")?;
        let url = self.endpoint(&["search"])?;

        let filtered = self
            .collect_pages(
                url.clone(),
                token,
                json!({ "filter": { "value": "database", "property": "object" } }),
                "searching databases",
            )
            .await;

        match filtered {
            Ok(databases) => {
                tracing::info!(count = databases.len(), "found databases with filtered search");
                Ok(databases)
            }
            Err(error) => {
                tracing::error!(%error, "filtered database search failed, retrying without filter");
                let all_objects = self
                    .collect_pages(url, token, json!({}), "searching all objects")
                    .await?;
                let databases = all_objects
                    .into_iter()
                    .filter(|object| object.get("object").and_then(Value::as_str) == Some("database"))
                    .collect::<Vec<_>>();
                tracing::info!(count = databases.len(), "found databases with unfiltered search");
                Ok(databases)
            }
        }
    }

    async fn query_database(&self, token: &str, database_id: &str) -> Result<Vec<Value>, InfraError> {
        Self::ensure_non_empty(token, "notion token")?;
        Self::ensure_non_empty(database_id, "database id")?;
        let url = self.endpoint(&["databases", database_id.trim(), "query"])?;
        self.collect_pages(url, token, json!({}), "querying database")
            .await
    }

    async fn create_page(
        &self,
        token: &str,
        database_id: &str,
        properties: &Value,
    ) -> Result<Value, InfraError> {
        Self::ensure_non_empty(token, "notion token")?;
        Self::ensure_non_empty(database_id, "database id")?;
        let url = self.endpoint(&["pages"])?;
        let body = json!({
            "parent": { "database_id": database_id.trim() },
            "properties": properties,
        });
        self.send(Method::POST, url, token, Some(&body), "creating page")
            .await
    }
}
