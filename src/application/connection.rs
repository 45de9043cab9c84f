use crate::domain::models::{ConnectionState, RemoteDatabase};
use crate::infrastructure::config::{load_or_init_config, save_config, SyncConfig};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::NotionClient;
use crate::infrastructure::property_mapper::get_database_title;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Owns the persisted sync configuration and the advisory connection state.
/// Every mutation is written back to disk before returning.
pub struct ConnectionManager<C>
where
    C: NotionClient,
{
    config_path: PathBuf,
    config: SyncConfig,
    notion_client: Arc<C>,
}

impl<C> ConnectionManager<C>
where
    C: NotionClient,
{
    pub fn load(config_path: impl AsRef<Path>, notion_client: Arc<C>) -> Result<Self, InfraError> {
        let config_path = config_path.as_ref().to_path_buf();
        let config = load_or_init_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
            notion_client,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.config.connection_state()
    }

    pub fn set_token(&mut self, token: &str) -> Result<ConnectionState, InfraError> {
        self.config.set_token(token)?;
        self.persist()?;
        Ok(self.connection_state())
    }

    pub async fn test_connection(&mut self) -> Result<ConnectionState, InfraError> {
        let token = self.config.require_token()?.to_string();
        let connected = match self.notion_client.test_connection(&token).await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "notion connection test failed");
                false
            }
        };
        self.config.last_connection_ok = Some(connected);
        self.persist()?;
        Ok(self.connection_state())
    }

    /// Databases shared with the integration. A remote failure is logged and
    /// reported as an empty list.
    pub async fn list_databases(&self) -> Result<Vec<RemoteDatabase>, InfraError> {
        let token = self.config.require_token()?;
        match self.notion_client.search_databases(token).await {
            Ok(databases) => Ok(databases.iter().filter_map(to_remote_database).collect()),
            Err(error) => {
                tracing::error!(%error, "listing notion databases failed");
                Ok(Vec::new())
            }
        }
    }

    pub fn select_task_database(&mut self, database: &RemoteDatabase) -> Result<(), InfraError> {
        self.config.select_task_database(database);
        self.persist()
    }

    pub fn select_log_database(&mut self, database: &RemoteDatabase) -> Result<(), InfraError> {
        self.config.select_log_database(database);
        self.persist()
    }

    pub fn set_auto_log(&mut self, enabled: bool) -> Result<(), InfraError> {
        self.config.auto_log = enabled;
        self.persist()
    }

    pub fn set_auto_sync(&mut self, enabled: bool) -> Result<(), InfraError> {
        self.config.auto_sync = enabled;
        self.persist()
    }

    fn persist(&self) -> Result<(), InfraError> {
        save_config(&self.config_path, &self.config)
    }
}

fn to_remote_database(database: &Value) -> Option<RemoteDatabase> {
    let id = database
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    Some(RemoteDatabase {
        id: id.to_string(),
        title: get_database_title(database),
    })
}

/// Finds a database in a listing by id, or by 1-based position.
pub fn find_database<'a>(databases: &'a [RemoteDatabase], selector: &str) -> Option<&'a RemoteDatabase> {
    let selector = selector.trim();
    databases
        .iter()
        .find(|database| database.id == selector)
        .or_else(|| {
            selector
                .parse::<usize>()
                .ok()
                .filter(|index| *index >= 1)
                .and_then(|index| databases.get(index - 1))
        })
}
