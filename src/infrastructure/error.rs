use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Data store error: {0}")]
    DataStore(String),
    #[error("Notion error: {0}")]
    Notion(String),
    #[error("No Notion API token configured; run `set-token` first")]
    MissingToken,
    #[error("No Notion {0} database selected")]
    MissingDatabase(String),
}
