use crate::domain::models::{compose_task_key, split_task_key, ExportSelection, PomodoroData};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::data_store::PomodoroDataStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notion_client::NotionClient;
use crate::infrastructure::property_mapper::{
    encode_task_properties, extract_project_name, extract_task_name,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ImportOutcome {
    pub fetched: usize,
    pub imported: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub attempted: usize,
}

/// Merges remote task objects into the local lists and returns how many new
/// task keys were added. Objects without a usable name are skipped.
pub fn merge_remote_tasks(remote_tasks: &[Value], data: &mut PomodoroData) -> usize {
    let mut imported = 0;
    for remote_task in remote_tasks {
        let Some(task_name) = extract_task_name(remote_task) else {
            continue;
        };
        let project_name = extract_project_name(remote_task);
        if project_name.is_empty() {
            continue;
        }

        data.add_project(&project_name);
        if data.add_task_key(&compose_task_key(&project_name, &task_name)) {
            imported += 1;
        }
    }
    imported
}

pub struct TaskSyncService<C, S>
where
    C: NotionClient,
    S: PomodoroDataStore,
{
    notion_client: Arc<C>,
    data_store: Arc<S>,
}

impl<C, S> TaskSyncService<C, S>
where
    C: NotionClient,
    S: PomodoroDataStore,
{
    pub fn new(notion_client: Arc<C>, data_store: Arc<S>) -> Self {
        Self {
            notion_client,
            data_store,
        }
    }

    pub async fn import_tasks(
        &self,
        config: &SyncConfig,
        data: &mut PomodoroData,
    ) -> Result<ImportOutcome, InfraError> {
        let token = config.require_token()?;
        let database_id = config.require_task_database()?;

        let remote_tasks = match self.notion_client.query_database(token, database_id).await {
            Ok(tasks) => tasks,
            Err(error) => {
                tracing::error!(%error, database_id, "querying notion task database failed");
                Vec::new()
            }
        };

        let imported = merge_remote_tasks(&remote_tasks, data);
        if imported > 0 {
            self.data_store.save(data)?;
        }
        tracing::info!(fetched = remote_tasks.len(), imported, "imported notion tasks");

        Ok(ImportOutcome {
            fetched: remote_tasks.len(),
            imported,
        })
    }

    pub async fn export_tasks(
        &self,
        config: &SyncConfig,
        data: &PomodoroData,
        selection: &ExportSelection,
    ) -> Result<BatchOutcome, InfraError> {
        let token = config.require_token()?;
        let database_id = config.require_task_database()?;

        let mut outcome = BatchOutcome::default();
        for task_key in selection.select(&data.tasks) {
            let Some((project_name, task_name)) = split_task_key(task_key) else {
                tracing::debug!(task_key, "skipping task key without project separator");
                continue;
            };

            outcome.attempted += 1;
            if self
                .create_task(token, database_id, project_name, task_name)
                .await
            {
                outcome.succeeded += 1;
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded,
            attempted = outcome.attempted,
            "exported tasks to notion"
        );
        Ok(outcome)
    }

    /// Task-added hook. Creates the task remotely when auto-sync is enabled
    /// and a token and task database are configured; never fails the caller.
    pub async fn sync_new_task(&self, config: &SyncConfig, project_name: &str, task_name: &str) -> bool {
        if !config.auto_sync {
            return false;
        }
        let (Some(token), Some(database_id)) = (config.token(), config.task_database()) else {
            return false;
        };
        if project_name.trim().is_empty() || task_name.trim().is_empty() {
            return false;
        }
        self.create_task(token, database_id, project_name, task_name)
            .await
    }

    async fn create_task(&self, token: &str, database_id: &str, project_name: &str, task_name: &str) -> bool {
        let properties = encode_task_properties(task_name, Some(project_name));
        match self
            .notion_client
            .create_page(token, database_id, &properties)
            .await
        {
            Ok(_) => true,
            Err(error) => {
                tracing::error!(%error, project_name, task_name, "creating notion task failed");
                false
            }
        }
    }
}
