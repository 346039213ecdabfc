use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Separator used when several reminder handles share one `notification_id`
pub const HANDLE_SEPARATOR: &str = ",";

/// A task as held in the local collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Server-assigned identifier
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// When the task is due (absent means no reminders)
    pub due_date: Option<DateTime<Utc>>,
    /// Combined reminder handles, present only while reminders are outstanding
    pub notification_id: Option<String>,
}

impl Task {
    /// Build a local task from a wire record
    pub fn from_record(record: TaskRecord) -> Self {
        let due_date = record.due_date.as_deref().and_then(|raw| {
            let parsed = parse_due_date(raw);
            if parsed.is_none() {
                tracing::warn!(task_id = %record.id, due_date = raw, "unparseable due date, treating as absent");
            }
            parsed
        });

        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            completed: record.completed,
            due_date,
            notification_id: record.notification_id.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Individual reminder handles stored on this task
    pub fn reminder_handles(&self) -> Vec<&str> {
        self.notification_id
            .as_deref()
            .map(split_handles)
            .unwrap_or_default()
    }
}

/// Task record as returned by `GET /tasks` and the mutation endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

/// Body for `POST /tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn new(title: String, description: String, due_date: Option<DateTime<Utc>>) -> Self {
        Self {
            title,
            description,
            due_date: due_date.map(format_due_date_wire),
        }
    }
}

/// Partial body for `PUT /tasks/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
}

impl TaskPatch {
    pub fn uncomplete() -> Self {
        Self {
            completed: Some(false),
            ..Default::default()
        }
    }

    pub fn with_notification_id(notification_id: String) -> Self {
        Self {
            notification_id: Some(notification_id),
            ..Default::default()
        }
    }
}

/// Accept ids serialized either as strings or as integers
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Parse a due date from the wire.
///
/// Accepts RFC 3339 (`2025-03-01T09:30:00.000Z`), RFC 2822 (`Sat, 01 Mar 2025 09:30:00 GMT`)
/// and naive ISO timestamps, which are taken as UTC.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format a due date the way the store expects it (ISO-8601, millisecond precision)
pub fn format_due_date_wire(due: DateTime<Utc>) -> String {
    due.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Join reminder handles into one `notification_id` (None when there are none)
pub fn join_handles<S: AsRef<str>>(handles: &[S]) -> Option<String> {
    if handles.is_empty() {
        return None;
    }
    let joined = handles
        .iter()
        .map(|h| h.as_ref())
        .collect::<Vec<_>>()
        .join(HANDLE_SEPARATOR);
    Some(joined)
}

/// Split a combined `notification_id` back into its handles
pub fn split_handles(combined: &str) -> Vec<&str> {
    combined
        .split(HANDLE_SEPARATOR)
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .collect()
}
