use crate::infrastructure::error::InfraError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const SYNC_LOG_FILE: &str = "notion_sync.log";

/// Routes diagnostics to a JSON-lines file under `logs_dir`. Remote failure
/// details only ever land here. Calling it twice keeps the first subscriber.
pub fn init_logging(logs_dir: &Path) -> Result<PathBuf, InfraError> {
    fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(SYNC_LOG_FILE);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(Mutex::new(file));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .try_init();
    Ok(path)
}
