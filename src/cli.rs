use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Notion synchronization for a local Pomodoro timer's tasks and sessions
#[derive(Debug, Parser)]
#[command(
    name = "pomodoro-notion-sync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Import and export Pomodoro tasks and log completed sessions to Notion",
    long_about = None
)]
pub struct Cli {
    /// Workspace holding config/, state/ and logs/ (defaults to the current directory)
    #[arg(global = true, long = "workspace")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the workspace layout and default configuration
    Init,

    /// Show connection state, selected databases and local counts
    Status,

    /// Store the Notion integration token
    SetToken {
        token: String,
    },

    /// Verify the stored token against the Notion API
    TestConnection,

    /// List databases shared with the integration
    Databases,

    /// Select the database tasks are imported from and exported to
    SelectTaskDb {
        /// Database id, or its position in the `databases` listing
        selector: String,
    },

    /// Select the database completed sessions are logged to
    SelectLogDb {
        /// Database id, or its position in the `databases` listing
        selector: String,
    },

    /// Enable or disable logging each session as it completes
    AutoLog {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },

    /// Enable or disable creating new tasks in Notion as they are added
    AutoSync {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },

    /// Import tasks from the task database
    Import,

    /// Export local tasks to the task database
    Export {
        /// Only export tasks of this project
        #[arg(long = "project")]
        project: Option<String>,
    },

    /// Log sessions not yet sent to the session log database
    LogSessions {
        #[arg(
            long = "window",
            default_value = "today",
            help = "Time window: today, yesterday, week or all"
        )]
        window: String,
    },

    /// Add a task to a project
    AddTask {
        project: String,
        task: String,
    },

    /// Record a completed Pomodoro session
    RecordSession {
        project: String,
        task: String,

        /// Start timestamp (ISO-8601)
        #[arg(long = "start")]
        start: String,

        /// End timestamp (ISO-8601)
        #[arg(long = "end")]
        end: String,

        /// Duration in seconds (derived from start and end when omitted)
        #[arg(long = "duration")]
        duration: Option<f64>,
    },

    /// List local task keys
    Tasks {
        #[arg(long = "project")]
        project: Option<String>,
    },

    /// List recorded sessions
    Sessions {
        /// Only sessions not yet logged to Notion
        #[arg(long = "unlogged")]
        unlogged: bool,
    },
}
