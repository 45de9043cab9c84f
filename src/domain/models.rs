use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const TASK_KEY_SEPARATOR: &str = ": ";

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Builds the `"<project>: <task>"` key used by the local task list.
pub fn compose_task_key(project: &str, task: &str) -> String {
    format!("{project}{TASK_KEY_SEPARATOR}{task}")
}

/// Splits a task key on the first separator. Keys without one yield `None`.
pub fn split_task_key(task_key: &str) -> Option<(&str, &str)> {
    task_key.split_once(TASK_KEY_SEPARATOR)
}

pub fn task_belongs_to_project(task_key: &str, project: &str) -> bool {
    task_key
        .strip_prefix(project)
        .is_some_and(|rest| rest.starts_with(TASK_KEY_SEPARATOR))
}

/// Parses an ISO-8601 session timestamp into the wall-clock time it names.
///
/// Offset-aware values keep their own offset (no conversion); naive values are
/// taken as-is.
pub fn parse_session_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Some(parsed) = parse_offset_timestamp(value) {
        return Some(parsed.naive_local());
    }
    let value = value.trim();
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn parse_offset_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Time between two session timestamps. When both carry an offset the
/// difference is taken between instants, so a UTC offset change in between
/// (daylight saving) is accounted for; otherwise wall-clock times are compared.
pub fn session_elapsed(start_time: &str, end_time: &str) -> Option<Duration> {
    match (parse_offset_timestamp(start_time), parse_offset_timestamp(end_time)) {
        (Some(start), Some(end)) => Some(end - start),
        _ => Some(parse_session_timestamp(end_time)? - parse_session_timestamp(start_time)?),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub project: String,
    pub task: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    #[serde(default)]
    pub notion_logged: bool,
}

impl SessionRecord {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_session_timestamp(&self.start_time).map(|value| value.date())
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.project, "session.project")?;
        validate_non_empty(&self.task, "session.task")?;
        if parse_session_timestamp(&self.start_time).is_none() {
            return Err("session.start_time must be an ISO-8601 timestamp".to_string());
        }
        if parse_session_timestamp(&self.end_time).is_none() {
            return Err("session.end_time must be an ISO-8601 timestamp".to_string());
        }
        let elapsed = session_elapsed(&self.start_time, &self.end_time)
            .ok_or_else(|| "session timestamps must be comparable".to_string())?;
        if elapsed < Duration::zero() {
            return Err("session.end_time must be >= session.start_time".to_string());
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err("session.duration_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Host-owned state the sync core reads and mutates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PomodoroData {
    pub projects: Vec<String>,
    pub tasks: Vec<String>,
    pub sessions: Vec<SessionRecord>,
}

impl PomodoroData {
    /// Returns `true` when the project was not yet known.
    pub fn add_project(&mut self, project: &str) -> bool {
        if self.projects.iter().any(|candidate| candidate == project) {
            return false;
        }
        self.projects.push(project.to_string());
        true
    }

    /// Returns `true` when the key was not yet present.
    pub fn add_task_key(&mut self, task_key: &str) -> bool {
        if self.tasks.iter().any(|candidate| candidate == task_key) {
            return false;
        }
        self.tasks.push(task_key.to_string());
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionWindow {
    Today,
    Yesterday,
    LastSevenDays,
    AllTime,
}

impl SessionWindow {
    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::Today => date == today,
            Self::Yesterday => date == today - Duration::days(1),
            Self::LastSevenDays => date >= today - Duration::days(6) && date <= today,
            Self::AllTime => true,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::LastSevenDays => "the last 7 days",
            Self::AllTime => "all time",
        }
    }
}

impl FromStr for SessionWindow {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" | "last7" | "last_7_days" | "last-7-days" => Ok(Self::LastSevenDays),
            "all" | "all_time" | "all-time" => Ok(Self::AllTime),
            other => Err(format!(
                "unknown session window '{other}' (expected today, yesterday, week or all)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    AllTasks,
    Project(String),
}

impl ExportSelection {
    pub fn select<'a>(&self, task_keys: &'a [String]) -> Vec<&'a str> {
        task_keys
            .iter()
            .map(String::as_str)
            .filter(|task_key| match self {
                Self::AllTasks => true,
                Self::Project(project) => task_belongs_to_project(task_key, project),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteDatabase {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Unconfigured,
    ConfiguredUntested,
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn derive(has_token: bool, last_test: Option<bool>) -> Self {
        match (has_token, last_test) {
            (false, _) => Self::Unconfigured,
            (true, None) => Self::ConfiguredUntested,
            (true, Some(true)) => Self::Connected,
            (true, Some(false)) => Self::Disconnected,
        }
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
    }

    fn sample_session() -> SessionRecord {
        SessionRecord {
            project: "Work".to_string(),
            task: "Write report".to_string(),
            start_time: "2026-02-16T09:00:00".to_string(),
            end_time: "2026-02-16T09:25:00".to_string(),
            duration_seconds: 1500.0,
            notion_logged: false,
        }
    }

    #[test]
    fn split_task_key_uses_first_separator() {
        assert_eq!(split_task_key("Work: Review: part 2"), Some(("Work", "Review: part 2")));
        assert_eq!(split_task_key("Work:no-space"), None);
    }

    #[test]
    fn project_membership_requires_full_prefix() {
        assert!(task_belongs_to_project("Work: Email", "Work"));
        assert!(!task_belongs_to_project("Workshop: Email", "Work"));
        assert!(!task_belongs_to_project("Work:Email", "Work"));
    }

    #[test]
    fn parse_session_timestamp_accepts_naive_and_offset_values() {
        let naive = parse_session_timestamp("2026-02-16T09:05:30.123456").expect("naive");
        assert_eq!(naive.format("%H:%M").to_string(), "09:05");

        let offset = parse_session_timestamp("2026-02-16T23:30:00+09:00").expect("offset");
        assert_eq!(offset.date(), date("2026-02-16"));
        assert_eq!(offset.format("%H:%M").to_string(), "23:30");

        let zulu = parse_session_timestamp("2026-02-16T07:15:00Z").expect("zulu");
        assert_eq!(zulu.format("%H:%M").to_string(), "07:15");

        assert!(parse_session_timestamp("yesterday").is_none());
    }

    #[test]
    fn session_validate_rejects_reverse_time() {
        let mut session = sample_session();
        session.end_time = "2026-02-16T08:59:00".to_string();
        assert!(session.validate().is_err());
        assert!(sample_session().validate().is_ok());
    }

    #[test]
    fn session_across_autumn_clock_change_is_valid() {
        let mut session = sample_session();
        session.start_time = "2026-11-01T01:50:00-04:00".to_string();
        session.end_time = "2026-11-01T01:15:00-05:00".to_string();

        assert!(session.validate().is_ok());
        assert_eq!(
            session_elapsed(&session.start_time, &session.end_time),
            Some(Duration::minutes(25))
        );
    }

    #[test]
    fn elapsed_across_spring_clock_change_uses_instants() {
        assert_eq!(
            session_elapsed("2026-03-08T01:50:00-05:00", "2026-03-08T03:15:00-04:00"),
            Some(Duration::minutes(25))
        );
        assert_eq!(
            session_elapsed("2026-03-08T01:50:00", "2026-03-08T03:15:00"),
            Some(Duration::minutes(85))
        );
        assert_eq!(session_elapsed("2026-03-08T01:50:00", "later"), None);
    }

    #[test]
    fn last_seven_days_includes_today_and_six_days_back() {
        let today = date("2026-02-16");
        let window = SessionWindow::LastSevenDays;
        assert!(!window.contains(today - Duration::days(8), today));
        assert!(!window.contains(today - Duration::days(7), today));
        assert!(window.contains(today - Duration::days(6), today));
        assert!(window.contains(today - Duration::days(1), today));
        assert!(window.contains(today, today));
        assert!(!window.contains(today + Duration::days(1), today));
    }

    #[test]
    fn yesterday_selects_exactly_one_date() {
        let today = date("2026-02-16");
        assert!(SessionWindow::Yesterday.contains(date("2026-02-15"), today));
        assert!(!SessionWindow::Yesterday.contains(today, today));
        assert!(!SessionWindow::Yesterday.contains(date("2026-02-14"), today));
    }

    #[test]
    fn session_window_parses_cli_names() {
        assert_eq!("today".parse::<SessionWindow>(), Ok(SessionWindow::Today));
        assert_eq!("Week".parse::<SessionWindow>(), Ok(SessionWindow::LastSevenDays));
        assert_eq!("all".parse::<SessionWindow>(), Ok(SessionWindow::AllTime));
        assert!("month".parse::<SessionWindow>().is_err());
    }

    #[test]
    fn export_selection_filters_by_project_prefix() {
        let tasks = vec![
            "Work: Email".to_string(),
            "Home: Laundry".to_string(),
            "Work: Review".to_string(),
            "Workshop: Slides".to_string(),
        ];
        let selected = ExportSelection::Project("Work".to_string()).select(&tasks);
        assert_eq!(selected, vec!["Work: Email", "Work: Review"]);
        assert_eq!(ExportSelection::AllTasks.select(&tasks).len(), 4);
    }

    #[test]
    fn add_task_key_keeps_first_occurrence() {
        let mut data = PomodoroData::default();
        assert!(data.add_project("Work"));
        assert!(!data.add_project("Work"));
        assert!(data.add_task_key("Work: Email"));
        assert!(!data.add_task_key("Work: Email"));
        assert_eq!(data.tasks, vec!["Work: Email".to_string()]);
    }

    #[test]
    fn connection_state_follows_token_and_last_test() {
        assert_eq!(ConnectionState::derive(false, Some(true)), ConnectionState::Unconfigured);
        assert_eq!(ConnectionState::derive(true, None), ConnectionState::ConfiguredUntested);
        assert_eq!(ConnectionState::derive(true, Some(true)), ConnectionState::Connected);
        assert_eq!(ConnectionState::derive(true, Some(false)), ConnectionState::Disconnected);
    }

    #[test]
    fn session_record_defaults_notion_logged_when_missing() {
        let session: SessionRecord = serde_json::from_value(serde_json::json!({
            "project": "Work",
            "task": "Email",
            "start_time": "2026-02-16T09:00:00",
            "end_time": "2026-02-16T09:25:00",
            "duration_seconds": 1500
        }))
        .expect("deserialize session");
        assert!(!session.notion_logged);
    }

    proptest! {
        #[test]
        fn composed_task_key_splits_back_into_parts(
            project in "[A-Za-z0-9 _\\-]{1,24}",
            task in "[A-Za-z0-9 _:\\-]{1,32}"
        ) {
            prop_assume!(!project.contains(':'));
            let key = compose_task_key(&project, &task);
            let (split_project, split_task) = split_task_key(&key).expect("separator present");
            prop_assert_eq!(split_project, project.as_str());
            prop_assert_eq!(compose_task_key(split_project, split_task), key);
        }
    }
}
