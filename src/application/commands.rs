use crate::application::bootstrap::bootstrap_workspace;
use crate::application::connection::{find_database, ConnectionManager};
use crate::application::session_log::SessionLogService;
use crate::application::task_sync::{BatchOutcome, ImportOutcome, TaskSyncService};
use crate::domain::models::{
    compose_task_key, parse_session_timestamp, session_elapsed, ConnectionState, ExportSelection,
    PomodoroData, RemoteDatabase, SessionRecord, SessionWindow,
};
use crate::infrastructure::data_store::{PomodoroDataStore, SqlitePomodoroDataStore};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::ReqwestNotionClient;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct AppState {
    workspace_root: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    notion_client: Arc<ReqwestNotionClient>,
    data_store: Arc<SqlitePomodoroDataStore>,
    connection: ConnectionManager<ReqwestNotionClient>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        Self::with_notion_client(workspace_root, ReqwestNotionClient::new())
    }

    pub fn with_notion_client(
        workspace_root: PathBuf,
        notion_client: ReqwestNotionClient,
    ) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let notion_client = Arc::new(notion_client);
        let connection = ConnectionManager::load(&bootstrap.config_path, Arc::clone(&notion_client))?;

        Ok(Self {
            workspace_root: bootstrap.workspace_root,
            data_store: Arc::new(SqlitePomodoroDataStore::new(&bootstrap.database_path)),
            database_path: bootstrap.database_path,
            logs_dir: bootstrap.logs_dir,
            notion_client,
            connection,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        tracing::error!(command, %error, "command failed");
        error.to_string()
    }

    fn task_sync(&self) -> TaskSyncService<ReqwestNotionClient, SqlitePomodoroDataStore> {
        TaskSyncService::new(Arc::clone(&self.notion_client), Arc::clone(&self.data_store))
    }

    fn session_log(&self) -> SessionLogService<ReqwestNotionClient, SqlitePomodoroDataStore> {
        SessionLogService::new(Arc::clone(&self.notion_client), Arc::clone(&self.data_store))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitResponse {
    pub workspace_root: String,
    pub database_path: String,
    pub logs_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub connection_state: ConnectionState,
    pub token_configured: bool,
    pub task_database: Option<RemoteDatabase>,
    pub log_database: Option<RemoteDatabase>,
    pub auto_log: bool,
    pub auto_sync: bool,
    pub projects: usize,
    pub tasks: usize,
    pub sessions: usize,
    pub unlogged_sessions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResponse {
    pub connection_state: ConnectionState,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseListItem {
    pub index: usize,
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub setting: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub outcome: ImportOutcome,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTaskResponse {
    pub task_key: String,
    pub added: bool,
    pub synced: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSessionResponse {
    pub session: SessionRecord,
    pub logged: bool,
}

pub fn init_impl(state: &AppState) -> InitResponse {
    InitResponse {
        workspace_root: state.workspace_root().display().to_string(),
        database_path: state.database_path().display().to_string(),
        logs_dir: state.logs_dir().display().to_string(),
    }
}

pub fn status_impl(state: &AppState) -> Result<StatusResponse, InfraError> {
    let config = state.connection.config();
    let data = state.data_store.load()?;
    let configured = |id: Option<&str>, title: Option<&String>| {
        id.map(|id| RemoteDatabase {
            id: id.to_string(),
            title: title.cloned().unwrap_or_default(),
        })
    };

    Ok(StatusResponse {
        connection_state: state.connection.connection_state(),
        token_configured: config.token().is_some(),
        task_database: configured(config.task_database(), config.selected_database_title.as_ref()),
        log_database: configured(config.log_database(), config.log_database_title.as_ref()),
        auto_log: config.auto_log,
        auto_sync: config.auto_sync,
        projects: data.projects.len(),
        tasks: data.tasks.len(),
        sessions: data.sessions.len(),
        unlogged_sessions: data.sessions.iter().filter(|session| !session.notion_logged).count(),
    })
}

pub fn set_token_impl(state: &mut AppState, token: String) -> Result<ConnectionResponse, InfraError> {
    let connection_state = state.connection.set_token(&token)?;
    tracing::info!(command = "set_token", "notion token updated");
    Ok(ConnectionResponse { connection_state })
}

pub async fn test_connection_impl(state: &mut AppState) -> Result<ConnectionResponse, InfraError> {
    let connection_state = state.connection.test_connection().await?;
    tracing::info!(command = "test_connection", ?connection_state, "notion connection tested");
    Ok(ConnectionResponse { connection_state })
}

pub async fn list_databases_impl(state: &AppState) -> Result<Vec<DatabaseListItem>, InfraError> {
    let databases = state.connection.list_databases().await?;
    Ok(databases
        .into_iter()
        .enumerate()
        .map(|(position, database)| DatabaseListItem {
            index: position + 1,
            id: database.id,
            title: database.title,
        })
        .collect())
}

pub async fn select_task_database_impl(
    state: &mut AppState,
    selector: String,
) -> Result<RemoteDatabase, InfraError> {
    let database = resolve_database(state, &selector).await?;
    state.connection.select_task_database(&database)?;
    tracing::info!(command = "select_task_db", database_id = %database.id, "task database selected");
    Ok(database)
}

pub async fn select_log_database_impl(
    state: &mut AppState,
    selector: String,
) -> Result<RemoteDatabase, InfraError> {
    let database = resolve_database(state, &selector).await?;
    state.connection.select_log_database(&database)?;
    tracing::info!(command = "select_log_db", database_id = %database.id, "session log database selected");
    Ok(database)
}

pub fn set_auto_log_impl(state: &mut AppState, enabled: bool) -> Result<ToggleResponse, InfraError> {
    state.connection.set_auto_log(enabled)?;
    Ok(ToggleResponse {
        setting: "auto_log",
        enabled,
    })
}

pub fn set_auto_sync_impl(state: &mut AppState, enabled: bool) -> Result<ToggleResponse, InfraError> {
    state.connection.set_auto_sync(enabled)?;
    Ok(ToggleResponse {
        setting: "auto_sync",
        enabled,
    })
}

pub async fn import_tasks_impl(state: &AppState) -> Result<ImportResponse, InfraError> {
    let mut data = state.data_store.load()?;
    let outcome = state
        .task_sync()
        .import_tasks(state.connection.config(), &mut data)
        .await?;

    let message = if outcome.imported == 0 {
        "No new tasks to import".to_string()
    } else {
        format!("Imported {} new tasks", outcome.imported)
    };
    Ok(ImportResponse { outcome, message })
}

pub async fn export_tasks_impl(
    state: &AppState,
    project: Option<String>,
) -> Result<BatchResponse, InfraError> {
    let selection = match project.as_deref().map(str::trim) {
        Some("") => {
            return Err(InfraError::InvalidInput(
                "project must not be empty".to_string(),
            ));
        }
        Some(project) => ExportSelection::Project(project.to_string()),
        None => ExportSelection::AllTasks,
    };

    let data = state.data_store.load()?;
    let outcome = state
        .task_sync()
        .export_tasks(state.connection.config(), &data, &selection)
        .await?;

    let message = format!(
        "Exported {} of {} tasks",
        outcome.succeeded, outcome.attempted
    );
    Ok(BatchResponse { outcome, message })
}

pub async fn log_sessions_impl(state: &AppState, window: String) -> Result<BatchResponse, InfraError> {
    let window = window
        .parse::<SessionWindow>()
        .map_err(InfraError::InvalidInput)?;

    let mut data = state.data_store.load()?;
    let outcome = state
        .session_log()
        .log_recent_sessions(state.connection.config(), &mut data, window)
        .await?;

    let message = if outcome.attempted == 0 {
        format!("No new sessions to log for {}", window.describe())
    } else {
        format!(
            "Logged {} of {} sessions for {}",
            outcome.succeeded,
            outcome.attempted,
            window.describe()
        )
    };
    Ok(BatchResponse { outcome, message })
}

pub async fn add_task_impl(
    state: &AppState,
    project: String,
    task: String,
) -> Result<AddTaskResponse, InfraError> {
    let project = project.trim();
    let task = task.trim();
    if project.is_empty() || task.is_empty() {
        return Err(InfraError::InvalidInput(
            "project and task must not be empty".to_string(),
        ));
    }

    let mut data = state.data_store.load()?;
    let task_key = compose_task_key(project, task);
    let project_added = data.add_project(project);
    let added = data.add_task_key(&task_key);
    if project_added || added {
        state.data_store.save(&data)?;
    }

    let synced = if added {
        state
            .task_sync()
            .sync_new_task(state.connection.config(), project, task)
            .await
    } else {
        false
    };

    tracing::info!(command = "add_task", task_key = %task_key, added, synced, "task recorded");
    Ok(AddTaskResponse {
        task_key,
        added,
        synced,
    })
}

pub async fn record_session_impl(
    state: &AppState,
    project: String,
    task: String,
    start_time: String,
    end_time: String,
    duration_seconds: Option<f64>,
) -> Result<RecordSessionResponse, InfraError> {
    let duration_seconds = match duration_seconds {
        Some(duration) => duration,
        None => elapsed_seconds(&start_time, &end_time)?,
    };
    let session = SessionRecord {
        project: project.trim().to_string(),
        task: task.trim().to_string(),
        start_time: start_time.trim().to_string(),
        end_time: end_time.trim().to_string(),
        duration_seconds,
        notion_logged: false,
    };
    session.validate().map_err(InfraError::InvalidInput)?;

    let mut data: PomodoroData = state.data_store.load()?;
    data.sessions.push(session);
    state.data_store.save(&data)?;

    let logged = state
        .session_log()
        .log_completed_session(state.connection.config(), &mut data)
        .await;

    let session = data
        .sessions
        .last()
        .cloned()
        .ok_or_else(|| InfraError::DataStore("session was not recorded".to_string()))?;
    tracing::info!(command = "record_session", project = %session.project, task = %session.task, logged, "session recorded");
    Ok(RecordSessionResponse { session, logged })
}

pub fn list_tasks_impl(state: &AppState, project: Option<String>) -> Result<Vec<String>, InfraError> {
    let data = state.data_store.load()?;
    let selection = match project {
        Some(project) => ExportSelection::Project(project.trim().to_string()),
        None => ExportSelection::AllTasks,
    };
    Ok(selection
        .select(&data.tasks)
        .into_iter()
        .map(ToOwned::to_owned)
        .collect())
}

pub fn list_sessions_impl(state: &AppState, unlogged_only: bool) -> Result<Vec<SessionRecord>, InfraError> {
    let data = state.data_store.load()?;
    Ok(data
        .sessions
        .into_iter()
        .filter(|session| !unlogged_only || !session.notion_logged)
        .collect())
}

async fn resolve_database(state: &AppState, selector: &str) -> Result<RemoteDatabase, InfraError> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(InfraError::InvalidInput(
            "database selector must not be empty".to_string(),
        ));
    }

    let databases = state.connection.list_databases().await?;
    find_database(&databases, selector)
        .cloned()
        .ok_or_else(|| {
            InfraError::InvalidInput(format!(
                "no shared notion database matches '{selector}'; run `databases` to list them"
            ))
        })
}

fn elapsed_seconds(start_time: &str, end_time: &str) -> Result<f64, InfraError> {
    if parse_session_timestamp(start_time).is_none() {
        return Err(InfraError::InvalidInput(format!("invalid start_time: {start_time}")));
    }
    if parse_session_timestamp(end_time).is_none() {
        return Err(InfraError::InvalidInput(format!("invalid end_time: {end_time}")));
    }
    let elapsed = session_elapsed(start_time, end_time).ok_or_else(|| {
        InfraError::InvalidInput(format!("cannot compare {start_time} and {end_time}"))
    })?;
    Ok(elapsed.num_seconds() as f64)
}
