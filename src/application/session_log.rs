use crate::application::task_sync::BatchOutcome;
use crate::domain::models::{PomodoroData, SessionRecord, SessionWindow};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::data_store::PomodoroDataStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::NotionClient;
use crate::infrastructure::property_mapper::encode_session_properties;
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Calendar day of `now` in `timezone`, or in system local time.
pub fn local_today(now: DateTime<Utc>, timezone: Option<Tz>) -> NaiveDate {
    match timezone {
        Some(timezone) => now.with_timezone(&timezone).date_naive(),
        None => now.with_timezone(&Local).date_naive(),
    }
}

/// Indices of sessions not yet logged whose start date falls in `window`.
/// Sessions with an unparseable start time only match the all-time window.
pub fn select_pending_sessions(
    sessions: &[SessionRecord],
    window: SessionWindow,
    today: NaiveDate,
) -> Vec<usize> {
    sessions
        .iter()
        .enumerate()
        .filter(|(_, session)| !session.notion_logged)
        .filter(|(_, session)| match window {
            SessionWindow::AllTime => true,
            _ => session
                .start_date()
                .is_some_and(|date| window.contains(date, today)),
        })
        .map(|(index, _)| index)
        .collect()
}

pub struct SessionLogService<C, S>
where
    C: NotionClient,
    S: PomodoroDataStore,
{
    notion_client: Arc<C>,
    data_store: Arc<S>,
    now_provider: NowProvider,
}

impl<C, S> SessionLogService<C, S>
where
    C: NotionClient,
    S: PomodoroDataStore,
{
    pub fn new(notion_client: Arc<C>, data_store: Arc<S>) -> Self {
        Self {
            notion_client,
            data_store,
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn today(&self, config: &SyncConfig) -> Result<NaiveDate, InfraError> {
        Ok(local_today((self.now_provider)(), config.timezone()?))
    }

    pub fn pending_sessions(
        &self,
        config: &SyncConfig,
        data: &PomodoroData,
        window: SessionWindow,
    ) -> Result<Vec<usize>, InfraError> {
        Ok(select_pending_sessions(&data.sessions, window, self.today(config)?))
    }

    /// Logs every pending session in `window`, one request at a time. Each
    /// success is marked and persisted before the next request, so an
    /// interrupted batch never re-logs what already went through.
    pub async fn log_recent_sessions(
        &self,
        config: &SyncConfig,
        data: &mut PomodoroData,
        window: SessionWindow,
    ) -> Result<BatchOutcome, InfraError> {
        let token = config.require_token()?;
        let database_id = config.require_log_database()?;
        let candidates = self.pending_sessions(config, data, window)?;

        let mut outcome = BatchOutcome::default();
        if candidates.is_empty() {
            tracing::info!(window = window.describe(), "no new sessions to log");
            return Ok(outcome);
        }

        for index in candidates {
            let session = &data.sessions[index];
            if session.notion_logged {
                continue;
            }
            outcome.attempted += 1;
            if let Err(error) = self.log_session(token, database_id, session).await {
                tracing::error!(%error, project = %session.project, task = %session.task, "logging session to notion failed");
                continue;
            }

            data.sessions[index].notion_logged = true;
            outcome.succeeded += 1;
            if let Err(error) = self.data_store.save(data) {
                tracing::error!(%error, "persisting logged session flag failed");
            }
        }

        self.data_store.save(data)?;
        tracing::info!(
            window = window.describe(),
            succeeded = outcome.succeeded,
            attempted = outcome.attempted,
            "logged sessions to notion"
        );
        Ok(outcome)
    }

    /// Session-completed hook: logs the most recent session when auto-log is
    /// enabled. Returns whether Notion accepted the entry; a failed local save
    /// afterwards is logged and does not change the answer.
    pub async fn log_completed_session(&self, config: &SyncConfig, data: &mut PomodoroData) -> bool {
        if !config.auto_log {
            return false;
        }
        let (Some(token), Some(database_id)) = (config.token(), config.log_database()) else {
            return false;
        };
        let Some(latest) = data.sessions.last() else {
            return false;
        };
        if latest.notion_logged {
            return false;
        }

        if let Err(error) = self.log_session(token, database_id, latest).await {
            tracing::error!(%error, project = %latest.project, task = %latest.task, "auto-logging session to notion failed");
            return false;
        }

        if let Some(latest) = data.sessions.last_mut() {
            latest.notion_logged = true;
        }
        if let Err(error) = self.data_store.save(data) {
            tracing::error!(%error, "persisting auto-logged session flag failed");
        }
        true
    }

    async fn log_session(
        &self,
        token: &str,
        database_id: &str,
        session: &SessionRecord,
    ) -> Result<(), InfraError> {
        let properties = encode_session_properties(session)?;
        self.notion_client
            .create_page(token, database_id, &properties)
            .await?;
        tracing::info!(project = %session.project, task = %session.task, "logged session to notion");
        Ok(())
    }
}
