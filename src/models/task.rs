use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use crate::engine::{CollectionStore, Filter};
use crate::{Error, FieldValue, Record, Result};

/// Name under which [`TaskStatus`] installs its filter.
pub const STATUS_FILTER: &str = "status";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    fn rank(&self) -> f64 {
        match self {
            Priority::Low => 1.0,
            Priority::Medium => 2.0,
            Priority::High => 3.0,
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::InvalidFilter(format!("unknown priority '{}'", other))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A todo entry. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: u64,
    #[serde(default)]
    pub completed_at: Option<u64>,
    #[serde(default)]
    pub due_date: Option<u64>,
    #[serde(default)]
    pub notes: String,
}

impl Task {
    /// Builds a task whose id is its creation time, as the todo page did.
    pub fn new(text: &str, priority: Priority, created_at: u64) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Invalid("task description is empty".to_string()));
        }
        Ok(Self {
            id: created_at.to_string(),
            text: text.to_string(),
            priority,
            completed: false,
            created_at,
            completed_at: None,
            due_date: None,
            notes: String::new(),
        })
    }

    pub fn toggle_complete(&mut self, now: u64) {
        self.completed = !self.completed;
        self.completed_at = self.completed.then_some(now);
    }

    pub fn complete(&mut self, now: u64) {
        if !self.completed {
            self.completed = true;
            self.completed_at = Some(now);
        }
    }

    pub fn is_overdue(&self, now: u64) -> bool {
        !self.completed && self.due_date.map_or(false, |due| due < now)
    }
}

impl Record for Task {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(Cow::Borrowed(&self.id)),
            "text" => FieldValue::Text(Cow::Borrowed(&self.text)),
            "notes" => FieldValue::Text(Cow::Borrowed(&self.notes)),
            "priority" => FieldValue::Text(Cow::Borrowed(self.priority.as_str())),
            "priorityRank" => FieldValue::Number(self.priority.rank()),
            "completed" => FieldValue::Bool(self.completed),
            "createdAt" => FieldValue::Number(self.created_at as f64),
            "completedAt" => FieldValue::Number(self.completed_at? as f64),
            "dueDate" => FieldValue::Number(self.due_date? as f64),
            _ => return None,
        })
    }
}

/// The all / active / completed tabs of the todo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskStatus {
    pub fn filter(self) -> Option<Filter> {
        match self {
            TaskStatus::All => None,
            TaskStatus::Active => Some(Filter::flag("completed", false)),
            TaskStatus::Completed => Some(Filter::flag("completed", true)),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(TaskStatus::All),
            "active" => Ok(TaskStatus::Active),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(Error::InvalidFilter(format!("unknown task status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl CollectionStore<Task> {
    pub fn show_status(&mut self, status: TaskStatus) {
        match status.filter() {
            Some(filter) => self.set_filter(STATUS_FILTER, filter),
            None => {
                self.clear_filter(STATUS_FILTER);
            }
        }
    }

    pub fn toggle_complete(&mut self, id: &str, now: u64) -> Result<&Task> {
        self.update(&id.to_string(), |t| t.toggle_complete(now))
    }

    /// Marks every selected task complete and clears the selection.
    pub fn complete_selected(&mut self, now: u64) -> usize {
        self.update_selected(|t| t.complete(now))
    }

    pub fn clear_completed(&mut self) -> usize {
        self.remove_where(|t| t.completed)
    }

    pub fn stats(&self) -> TodoStats {
        let completed = self.count_where(|t| t.completed);
        TodoStats {
            total: self.len(),
            active: self.len() - completed,
            completed,
        }
    }
}

/// Starter tasks for an empty todo list.
pub fn sample_tasks(now: u64) -> Vec<Task> {
    let task = |id: &str, text: &str, priority: Priority, notes: &str| Task {
        id: id.to_string(),
        text: text.to_string(),
        priority,
        completed: false,
        created_at: now,
        completed_at: None,
        due_date: None,
        notes: notes.to_string(),
    };
    vec![
        task("1", "Welcome to your Todo App!", Priority::High, "This is a sample task to get you started."),
        task("2", "Click the checkbox to mark tasks as complete", Priority::Medium, ""),
        task("3", "Use the edit button to modify task details", Priority::Low, ""),
    ]
}
