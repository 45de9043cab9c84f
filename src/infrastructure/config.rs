use crate::domain::models::{ConnectionState, RemoteDatabase};
use crate::infrastructure::error::InfraError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const NOTION_CONFIG_JSON: &str = "notion_config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub selected_database: Option<String>,
    #[serde(default)]
    pub log_database: Option<String>,
    #[serde(default)]
    pub auto_log: bool,
    #[serde(default)]
    pub auto_sync: bool,
    #[serde(default)]
    pub selected_database_title: Option<String>,
    #[serde(default)]
    pub log_database_title: Option<String>,
    #[serde(default)]
    pub last_connection_ok: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl SyncConfig {
    pub fn token(&self) -> Option<&str> {
        non_empty(self.token.as_deref())
    }

    pub fn task_database(&self) -> Option<&str> {
        non_empty(self.selected_database.as_deref())
    }

    pub fn log_database(&self) -> Option<&str> {
        non_empty(self.log_database.as_deref())
    }

    pub fn require_token(&self) -> Result<&str, InfraError> {
        self.token().ok_or(InfraError::MissingToken)
    }

    pub fn require_task_database(&self) -> Result<&str, InfraError> {
        self.task_database()
            .ok_or_else(|| InfraError::MissingDatabase("task".to_string()))
    }

    pub fn require_log_database(&self) -> Result<&str, InfraError> {
        self.log_database()
            .ok_or_else(|| InfraError::MissingDatabase("session log".to_string()))
    }

    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::derive(self.token().is_some(), self.last_connection_ok)
    }

    pub fn set_token(&mut self, token: &str) -> Result<(), InfraError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(InfraError::InvalidInput("token must not be empty".to_string()));
        }
        self.token = Some(token.to_string());
        self.last_connection_ok = None;
        Ok(())
    }

    pub fn select_task_database(&mut self, database: &RemoteDatabase) {
        self.selected_database = Some(database.id.clone());
        self.selected_database_title = Some(database.title.clone());
    }

    pub fn select_log_database(&mut self, database: &RemoteDatabase) {
        self.log_database = Some(database.id.clone());
        self.log_database_title = Some(database.title.clone());
    }

    /// Timezone used to decide which calendar day is "today". `None` means
    /// the system local time.
    pub fn timezone(&self) -> Result<Option<Tz>, InfraError> {
        let Some(name) = non_empty(self.timezone.as_deref()) else {
            return Ok(None);
        };
        name.parse::<Tz>()
            .map(Some)
            .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{name}': {error}")))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Reads the configuration, writing a fresh default file when it is missing or
/// cannot be parsed.
pub fn load_or_init_config(path: &Path) -> Result<SyncConfig, InfraError> {
    match read_config(path) {
        Ok(config) => Ok(config),
        Err(error) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), %error, "unreadable notion config, resetting to defaults");
            }
            let config = SyncConfig::default();
            save_config(path, &config)?;
            Ok(config)
        }
    }
}

fn read_config(path: &Path) -> Result<SyncConfig, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: SyncConfig = serde_json::from_str(&raw)?;
    Ok(parsed)
}

pub fn save_config(path: &Path, config: &SyncConfig) -> Result<(), InfraError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let formatted = serde_json::to_string_pretty(config)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}
