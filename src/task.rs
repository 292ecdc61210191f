//! Task entity types.
//!
//! Tasks mirror the JSON documents served by the tasks collection: `_id`
//! identifiers, camelCase fields, kebab-case statuses and references that
//! arrive either as bare ids or as embedded summaries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Accepted,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Statuses that own a board column, in board order.
    pub const BOARD: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Accepted,
        TaskStatus::Completed,
    ];

    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Accepted,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Position on the board, `None` for `cancelled`.
    pub fn column_index(self) -> Option<usize> {
        Self::BOARD.iter().position(|status| *status == self)
    }

    /// The stage after this one on the board.
    pub fn next(self) -> Option<TaskStatus> {
        let idx = self.column_index()?;
        Self::BOARD.get(idx + 1).copied()
    }

    /// The stage before this one on the board.
    pub fn prev(self) -> Option<TaskStatus> {
        let idx = self.column_index()?;
        idx.checked_sub(1).and_then(|prev| Self::BOARD.get(prev).copied())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = if normalized == "inprogress" {
            "in-progress".to_string()
        } else {
            normalized
        };
        TaskStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown task status '{}' (expected todo|in-progress|review|accepted|completed|cancelled)",
                    raw.trim()
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Unknown,
}

impl Priority {
    /// Sort weight; higher sorts first.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
            Priority::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(Error::InvalidArgument(format!(
                "unknown priority '{other}' (expected low|medium|high|urgent)"
            ))),
        }
    }
}

/// Weight of an optional priority; missing priorities weigh 0.
pub fn priority_weight(priority: Option<Priority>) -> u8 {
    priority.map(Priority::weight).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Summary(UserSummary),
    Id(String),
}

impl UserRef {
    pub fn id(&self) -> &str {
        match self {
            UserRef::Summary(summary) => &summary.id,
            UserRef::Id(id) => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            UserRef::Summary(summary) => summary.name.as_deref().unwrap_or(&summary.id),
            UserRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequestSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceRequestRef {
    Summary(ServiceRequestSummary),
    Id(String),
}

impl ServiceRequestRef {
    pub fn id(&self) -> &str {
        match self {
            ServiceRequestRef::Summary(summary) => &summary.id,
            ServiceRequestRef::Id(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_request_id: Option<ServiceRequestRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            notes: None,
            deliverables: None,
            status,
            priority: None,
            due_date: None,
            start_date: None,
            completed_date: None,
            assigned_user_id: None,
            service_request_id: None,
            attached_video: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn assigned_user(&self) -> Option<&str> {
        self.assigned_user_id.as_ref().map(UserRef::id)
    }

    pub fn service_request(&self) -> Option<&str> {
        self.service_request_id.as_ref().map(ServiceRequestRef::id)
    }

    /// Move to `status`, keeping `completed_date` in step. Returns the previous status.
    pub fn transition_to(&mut self, status: TaskStatus, now: DateTime<Utc>) -> TaskStatus {
        let previous = self.status;
        self.status = status;
        if status == TaskStatus::Completed {
            self.completed_date = Some(now);
        } else if previous == TaskStatus::Completed {
            self.completed_date = None;
        }
        previous
    }

    /// Apply a single-field edit to the local copy.
    pub fn apply(&mut self, update: &FieldUpdate) {
        match update {
            FieldUpdate::Title(value) => self.title = value.clone(),
            FieldUpdate::Description(value) => self.description = Some(value.clone()),
            FieldUpdate::Notes(value) => self.notes = Some(value.clone()),
            FieldUpdate::Deliverables(value) => self.deliverables = Some(value.clone()),
            FieldUpdate::Priority(value) => self.priority = Some(*value),
            FieldUpdate::Assignee(value) => {
                let unchanged = match (&self.assigned_user_id, value) {
                    (Some(current), Some(next)) => current.id() == next,
                    _ => false,
                };
                if !unchanged {
                    self.assigned_user_id = value.clone().map(UserRef::Id);
                }
            }
            FieldUpdate::DueDate(value) => self.due_date = *value,
            FieldUpdate::StartDate(value) => self.start_date = *value,
            FieldUpdate::AttachedVideo(value) => self.attached_video = value.clone(),
        }
    }
}

/// Fields editable one at a time from the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Description,
    Notes,
    Deliverables,
    Priority,
    Assignee,
    DueDate,
    StartDate,
    AttachedVideo,
}

impl TaskField {
    pub const ALL: [TaskField; 9] = [
        TaskField::Title,
        TaskField::Description,
        TaskField::Notes,
        TaskField::Deliverables,
        TaskField::Priority,
        TaskField::Assignee,
        TaskField::DueDate,
        TaskField::StartDate,
        TaskField::AttachedVideo,
    ];

    /// Key used in request bodies.
    pub fn wire_name(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Notes => "notes",
            TaskField::Deliverables => "deliverables",
            TaskField::Priority => "priority",
            TaskField::Assignee => "assignedUserId",
            TaskField::DueDate => "dueDate",
            TaskField::StartDate => "startDate",
            TaskField::AttachedVideo => "attachedVideo",
        }
    }

    /// Current value of this field rendered as editable text.
    pub fn current_text(self, task: &Task) -> String {
        fn date(value: Option<DateTime<Utc>>) -> String {
            value.map(|date| date.to_rfc3339()).unwrap_or_default()
        }
        match self {
            TaskField::Title => task.title.clone(),
            TaskField::Description => task.description.clone().unwrap_or_default(),
            TaskField::Notes => task.notes.clone().unwrap_or_default(),
            TaskField::Deliverables => task.deliverables.clone().unwrap_or_default(),
            TaskField::Priority => task.priority.map(|p| p.to_string()).unwrap_or_default(),
            TaskField::Assignee => task.assigned_user().unwrap_or_default().to_string(),
            TaskField::DueDate => date(task.due_date),
            TaskField::StartDate => date(task.start_date),
            TaskField::AttachedVideo => task.attached_video.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for TaskField {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|ch| *ch != '-' && *ch != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let field = match key.as_str() {
            "title" => TaskField::Title,
            "description" => TaskField::Description,
            "notes" => TaskField::Notes,
            "deliverables" => TaskField::Deliverables,
            "priority" => TaskField::Priority,
            "assignee" | "assigneduserid" | "assigneduser" => TaskField::Assignee,
            "duedate" | "due" => TaskField::DueDate,
            "startdate" | "start" => TaskField::StartDate,
            "attachedvideo" | "video" => TaskField::AttachedVideo,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unknown task field '{}'",
                    raw.trim()
                )))
            }
        };
        Ok(field)
    }
}

/// A typed single-field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    Notes(String),
    Deliverables(String),
    Priority(Priority),
    Assignee(Option<String>),
    DueDate(Option<DateTime<Utc>>),
    StartDate(Option<DateTime<Utc>>),
    AttachedVideo(Option<String>),
}

impl FieldUpdate {
    /// Parse editor text for `field`. Empty text clears optional fields.
    pub fn parse(field: TaskField, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let update = match field {
            TaskField::Title => {
                if trimmed.is_empty() {
                    return Err(Error::InvalidArgument("title cannot be empty".to_string()));
                }
                FieldUpdate::Title(trimmed.to_string())
            }
            TaskField::Description => FieldUpdate::Description(raw.to_string()),
            TaskField::Notes => FieldUpdate::Notes(raw.to_string()),
            TaskField::Deliverables => FieldUpdate::Deliverables(raw.to_string()),
            TaskField::Priority => FieldUpdate::Priority(trimmed.parse()?),
            TaskField::Assignee => FieldUpdate::Assignee(non_empty(trimmed)),
            TaskField::DueDate => FieldUpdate::DueDate(parse_optional_date(trimmed)?),
            TaskField::StartDate => FieldUpdate::StartDate(parse_optional_date(trimmed)?),
            TaskField::AttachedVideo => FieldUpdate::AttachedVideo(non_empty(trimmed)),
        };
        Ok(update)
    }

    pub fn field(&self) -> TaskField {
        match self {
            FieldUpdate::Title(_) => TaskField::Title,
            FieldUpdate::Description(_) => TaskField::Description,
            FieldUpdate::Notes(_) => TaskField::Notes,
            FieldUpdate::Deliverables(_) => TaskField::Deliverables,
            FieldUpdate::Priority(_) => TaskField::Priority,
            FieldUpdate::Assignee(_) => TaskField::Assignee,
            FieldUpdate::DueDate(_) => TaskField::DueDate,
            FieldUpdate::StartDate(_) => TaskField::StartDate,
            FieldUpdate::AttachedVideo(_) => TaskField::AttachedVideo,
        }
    }

    pub fn wire_value(&self) -> Value {
        fn date(value: &Option<DateTime<Utc>>) -> Value {
            value
                .map(|date| Value::String(date.to_rfc3339()))
                .unwrap_or(Value::Null)
        }
        fn text(value: &Option<String>) -> Value {
            value.clone().map(Value::String).unwrap_or(Value::Null)
        }
        match self {
            FieldUpdate::Title(value)
            | FieldUpdate::Description(value)
            | FieldUpdate::Notes(value)
            | FieldUpdate::Deliverables(value) => Value::String(value.clone()),
            FieldUpdate::Priority(value) => Value::String(value.to_string()),
            FieldUpdate::Assignee(value) | FieldUpdate::AttachedVideo(value) => text(value),
            FieldUpdate::DueDate(value) | FieldUpdate::StartDate(value) => date(value),
        }
    }
}

/// Partial update body: `{_id, <field>: value, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub changes: serde_json::Map<String, Value>,
}

impl TaskPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            changes: serde_json::Map::new(),
        }
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.changes.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.changes.get(key)
    }

    /// Body for a status move that already happened on `task` (previously `from`).
    pub fn status_change(task: &Task, from: TaskStatus) -> Self {
        let patch = Self::new(task.id.clone()).set("status", Value::String(task.status.to_string()));
        match task.completed_date {
            Some(date) if task.status == TaskStatus::Completed => {
                patch.set("completedDate", Value::String(date.to_rfc3339()))
            }
            None if from == TaskStatus::Completed => patch.set("completedDate", Value::Null),
            _ => patch,
        }
    }

    pub fn field(id: impl Into<String>, update: &FieldUpdate) -> Self {
        Self::new(id).set(update.field().wire_name(), update.wire_value())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "invalid date '{trimmed}' (expected RFC 3339 or YYYY-MM-DD)"
            ))
        })
}

/// Treat an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn parse_optional_date(raw: &str) -> Result<Option<DateTime<Utc>>> {
    if raw.is_empty() {
        Ok(None)
    } else {
        parse_date(raw).map(Some)
    }
}
