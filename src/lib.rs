pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use application::commands::{
    add_task_impl, export_tasks_impl, import_tasks_impl, init_impl, list_databases_impl,
    list_sessions_impl, list_tasks_impl, log_sessions_impl, record_session_impl,
    select_log_database_impl, select_task_database_impl, set_auto_log_impl, set_auto_sync_impl,
    set_token_impl, status_impl, test_connection_impl, AppState,
};
use cli::{Cli, Commands};
use infrastructure::error::InfraError;
use infrastructure::logging::init_logging;
use serde::Serialize;
use std::path::PathBuf;

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf, InfraError> {
    match workspace {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InfraError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs one command against the workspace and prints its result as JSON.
pub async fn run(cli: Cli) -> Result<(), String> {
    let workspace_root = resolve_workspace(cli.workspace).map_err(|error| error.to_string())?;
    let mut state = AppState::new(workspace_root).map_err(|error| error.to_string())?;
    if let Err(error) = init_logging(state.logs_dir()) {
        eprintln!("warning: file logging unavailable: {error}");
    }

    let command_name = command_name(&cli.command);
    dispatch(&mut state, cli.command)
        .await
        .map_err(|error| state.command_error(command_name, &error))
}

async fn dispatch(state: &mut AppState, command: Commands) -> Result<(), InfraError> {
    match command {
        Commands::Init => print_json(&init_impl(state)),
        Commands::Status => print_json(&status_impl(state)?),
        Commands::SetToken { token } => print_json(&set_token_impl(state, token)?),
        Commands::TestConnection => print_json(&test_connection_impl(state).await?),
        Commands::Databases => print_json(&list_databases_impl(state).await?),
        Commands::SelectTaskDb { selector } => {
            print_json(&select_task_database_impl(state, selector).await?)
        }
        Commands::SelectLogDb { selector } => {
            print_json(&select_log_database_impl(state, selector).await?)
        }
        Commands::AutoLog { enabled } => print_json(&set_auto_log_impl(state, enabled)?),
        Commands::AutoSync { enabled } => print_json(&set_auto_sync_impl(state, enabled)?),
        Commands::Import => print_json(&import_tasks_impl(state).await?),
        Commands::Export { project } => print_json(&export_tasks_impl(state, project).await?),
        Commands::LogSessions { window } => print_json(&log_sessions_impl(state, window).await?),
        Commands::AddTask { project, task } => {
            print_json(&add_task_impl(state, project, task).await?)
        }
        Commands::RecordSession {
            project,
            task,
            start,
            end,
            duration,
        } => print_json(&record_session_impl(state, project, task, start, end, duration).await?),
        Commands::Tasks { project } => print_json(&list_tasks_impl(state, project)?),
        Commands::Sessions { unlogged } => print_json(&list_sessions_impl(state, unlogged)?),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Status => "status",
        Commands::SetToken { .. } => "set_token",
        Commands::TestConnection => "test_connection",
        Commands::Databases => "databases",
        Commands::SelectTaskDb { .. } => "select_task_db",
        Commands::SelectLogDb { .. } => "select_log_db",
        Commands::AutoLog { .. } => "auto_log",
        Commands::AutoSync { .. } => "auto_sync",
        Commands::Import => "import",
        Commands::Export { .. } => "export",
        Commands::LogSessions { .. } => "log_sessions",
        Commands::AddTask { .. } => "add_task",
        Commands::RecordSession { .. } => "record_session",
        Commands::Tasks { .. } => "tasks",
        Commands::Sessions { .. } => "sessions",
    }
}
