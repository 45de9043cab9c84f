//! Translation between Notion page/database objects and the local model.
//!
//! Notion schemas differ between workspaces, so every lookup here is an
//! ordered list of strategies, each returning an optional value. The first
//! strategy that yields something wins; nothing in this module fails on an
//! unexpected shape.

use crate::domain::models::{parse_session_timestamp, SessionRecord};
use crate::infrastructure::error::InfraError;
use serde_json::{json, Value};

pub const DEFAULT_PROJECT_NAME: &str = "Default Project";
pub const UNTITLED_DATABASE: &str = "Untitled Database";

const TASK_NAME_PROPERTIES: [&str; 3] = ["Name", "name", "Title"];
const PROJECT_PROPERTIES: [&str; 2] = ["Tags", "Project"];

type Strategy = fn(&Value) -> Option<String>;

const DATABASE_TITLE_STRATEGIES: [Strategy; 3] = [
    title_array_plain_text,
    nested_properties_title_name,
    properties_title_name,
];

fn first_match(value: &Value, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(value))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
}

fn task_property<'a>(remote_task: &'a Value, name: &str) -> Option<&'a Value> {
    remote_task.get("properties")?.get(name)
}

fn title_segment_text(property: &Value) -> Option<String> {
    non_empty(property.get("title")?.get(0)?.get("plain_text")?.as_str())
}

fn first_multi_select_name(property: &Value) -> Option<String> {
    non_empty(property.get("multi_select")?.get(0)?.get("name")?.as_str())
}

/// Name of a remote task, taken from the first title segment of the `Name`,
/// `name` or `Title` property.
pub fn extract_task_name(remote_task: &Value) -> Option<String> {
    TASK_NAME_PROPERTIES
        .iter()
        .filter_map(|name| task_property(remote_task, name))
        .find_map(title_segment_text)
}

/// Project of a remote task, taken from the first `Tags` or `Project`
/// multi-select option.
pub fn extract_project_name(remote_task: &Value) -> String {
    PROJECT_PROPERTIES
        .iter()
        .filter_map(|name| task_property(remote_task, name))
        .find_map(first_multi_select_name)
        .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string())
}

fn title_array_plain_text(database: &Value) -> Option<String> {
    non_empty(database.get("title")?.get(0)?.get("plain_text")?.as_str())
}

fn nested_properties_title_name(database: &Value) -> Option<String> {
    non_empty(database.pointer("/properties/title/title/name")?.as_str())
}

fn properties_title_name(database: &Value) -> Option<String> {
    non_empty(database.pointer("/properties/title/name")?.as_str())
}

pub fn get_database_title(database: &Value) -> String {
    first_match(database, &DATABASE_TITLE_STRATEGIES).unwrap_or_else(|| UNTITLED_DATABASE.to_string())
}

/// Whole minutes, truncated: 125 s is `"2 min"`.
pub fn format_duration(duration_seconds: f64) -> String {
    let minutes = (duration_seconds / 60.0).trunc();
    let minutes = if minutes.is_finite() { minutes as i64 } else { 0 };
    format!("{minutes} min")
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

fn title(content: &str) -> Value {
    json!({ "title": [{ "text": { "content": content } }] })
}

pub fn encode_task_properties(task_name: &str, project_name: Option<&str>) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("Name".to_string(), title(task_name));
    if let Some(project_name) = project_name.map(str::trim).filter(|value| !value.is_empty()) {
        properties.insert(
            "Tags".to_string(),
            json!({ "multi_select": [{ "name": project_name }] }),
        );
    }
    Value::Object(properties)
}

pub fn encode_session_properties(session: &SessionRecord) -> Result<Value, InfraError> {
    session.validate().map_err(InfraError::InvalidInput)?;
    let start = parse_session_timestamp(&session.start_time).ok_or_else(|| {
        InfraError::InvalidInput(format!("invalid session start_time '{}'", session.start_time))
    })?;
    let end = parse_session_timestamp(&session.end_time).ok_or_else(|| {
        InfraError::InvalidInput(format!("invalid session end_time '{}'", session.end_time))
    })?;

    Ok(json!({
        "Name": title(&format!("Session: {}", session.task)),
        "Date": { "date": { "start": start.date().format("%Y-%m-%d").to_string() } },
        "Project": { "select": { "name": session.project } },
        "Task": rich_text(&session.task),
        "Start Time": rich_text(&start.format("%H:%M").to_string()),
        "End Time": rich_text(&end.format("%H:%M").to_string()),
        "Duration": rich_text(&format_duration(session.duration_seconds)),
    }))
}
