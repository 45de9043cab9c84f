use crate::domain::models::{PomodoroData, SessionRecord};
use crate::infrastructure::error::InfraError;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait PomodoroDataStore: Send + Sync {
    fn load(&self) -> Result<PomodoroData, InfraError>;
    fn save(&self, data: &PomodoroData) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqlitePomodoroDataStore {
    db_path: PathBuf,
}

impl SqlitePomodoroDataStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl PomodoroDataStore for SqlitePomodoroDataStore {
    fn load(&self) -> Result<PomodoroData, InfraError> {
        let connection = self.connect()?;

        let projects = connection
            .prepare("SELECT name FROM projects ORDER BY position")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = connection
            .prepare("SELECT task_key FROM tasks ORDER BY position")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let sessions = connection
            .prepare(
                "SELECT project, task, start_time, end_time, duration_seconds, notion_logged
                 FROM sessions ORDER BY position",
            )?
            .query_map([], |row| {
                Ok(SessionRecord {
                    project: row.get(0)?,
                    task: row.get(1)?,
                    start_time: row.get(2)?,
                    end_time: row.get(3)?,
                    duration_seconds: row.get(4)?,
                    notion_logged: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PomodoroData {
            projects,
            tasks,
            sessions,
        })
    }

    fn save(&self, data: &PomodoroData) -> Result<(), InfraError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        transaction.execute_batch("DELETE FROM projects; DELETE FROM tasks; DELETE FROM sessions;")?;

        for (position, name) in data.projects.iter().enumerate() {
            transaction.execute(
                "INSERT INTO projects (position, name) VALUES (?1, ?2)",
                params![position as i64, name],
            )?;
        }
        for (position, task_key) in data.tasks.iter().enumerate() {
            transaction.execute(
                "INSERT INTO tasks (position, task_key) VALUES (?1, ?2)",
                params![position as i64, task_key],
            )?;
        }
        for (position, session) in data.sessions.iter().enumerate() {
            transaction.execute(
                "INSERT INTO sessions
                   (position, project, task, start_time, end_time, duration_seconds, notion_logged)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    position as i64,
                    session.project,
                    session.task,
                    session.start_time,
                    session.end_time,
                    session.duration_seconds,
                    session.notion_logged as i64
                ],
            )?;
        }

        transaction.commit()?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryPomodoroDataStore {
    data: Mutex<PomodoroData>,
    saves: Mutex<usize>,
}

impl InMemoryPomodoroDataStore {
    pub fn with_data(data: PomodoroData) -> Self {
        Self {
            data: Mutex::new(data),
            saves: Mutex::new(0),
        }
    }

    pub fn save_count(&self) -> Result<usize, InfraError> {
        let saves = self
            .saves
            .lock()
            .map_err(|error| InfraError::DataStore(format!("in-memory lock poisoned: {error}")))?;
        Ok(*saves)
    }
}

impl PomodoroDataStore for InMemoryPomodoroDataStore {
    fn load(&self) -> Result<PomodoroData, InfraError> {
        let data = self
            .data
            .lock()
            .map_err(|error| InfraError::DataStore(format!("in-memory lock poisoned: {error}")))?;
        Ok(data.clone())
    }

    fn save(&self, data: &PomodoroData) -> Result<(), InfraError> {
        let mut stored = self
            .data
            .lock()
            .map_err(|error| InfraError::DataStore(format!("in-memory lock poisoned: {error}")))?;
        *stored = data.clone();
        let mut saves = self
            .saves
            .lock()
            .map_err(|error| InfraError::DataStore(format!("in-memory lock poisoned: {error}")))?;
        *saves += 1;
        Ok(())
    }
}
