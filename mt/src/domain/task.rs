//! Task domain type

use chrono::NaiveDate;
use docstore::{Record, now_ms};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::generate_id;
use super::priority::Priority;

/// Date format accepted for deadlines
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// A unit of work owned by exactly one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: String,

    /// Short title (non-empty); also the key the prioritization model answers with
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,

    /// Owning project
    pub project_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Rationale for the priority; only present alongside a priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Optional due date (YYYY-MM-DD)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,

    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub updated_at: i64,
}

impl Task {
    /// Create an open task with a generated id
    pub fn new(title: impl Into<String>, project_id: impl Into<String>) -> Self {
        let title = title.into();
        let now = now_ms();
        Self {
            id: generate_id("task", &title),
            title,
            description: None,
            completed: false,
            project_id: project_id.into(),
            priority: None,
            reason: None,
            deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn is_open(&self) -> bool {
        !self.completed
    }

    /// Set priority and rationale together
    pub fn assign_priority(&mut self, priority: Priority, reason: impl Into<String>) {
        debug!(%self.id, %priority, "Task::assign_priority: called");
        self.priority = Some(priority);
        self.reason = Some(reason.into());
    }

    /// Remove priority and, with it, the rationale
    pub fn clear_priority(&mut self) {
        debug!(%self.id, "Task::clear_priority: called");
        self.priority = None;
        self.reason = None;
    }

    /// Whether assigning `priority`/`reason` would change this task
    pub fn differs_from_assignment(&self, priority: Priority, reason: &str) -> bool {
        self.priority != Some(priority) || self.reason.as_deref() != Some(reason)
    }

    /// Bump the modification time
    pub fn touch(&mut self) {
        self.updated_at = now_ms();
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title must not be empty".to_string());
        }
        if self.project_id.trim().is_empty() {
            return Err("Task must belong to a project".to_string());
        }
        if self.reason.is_some() && self.priority.is_none() {
            return Err("Task reason requires a priority".to_string());
        }
        if let Some(deadline) = &self.deadline {
            parse_deadline(deadline)?;
        }
        Ok(())
    }
}

/// Parse a deadline string, rejecting anything that is not YYYY-MM-DD
pub fn parse_deadline(deadline: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(deadline.trim(), DEADLINE_FORMAT)
        .map_err(|e| format!("Invalid deadline '{}': {} (expected YYYY-MM-DD)", deadline, e))
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "tasks"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_new_is_open() {
        let task = Task::new("Design new homepage mockup", "proj-1");
        assert!(task.is_open());
        assert!(task.id.contains("-task-design-new-homepage-mockup"));
        assert_eq!(task.project_id, "proj-1");
        assert!(task.priority.is_none());
        assert!(task.reason.is_none());
    }

    #[test]
    fn test_assign_and_clear_priority() {
        let mut task = Task::new("A", "p");
        task.assign_priority(Priority::High, "urgent");
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.reason.as_deref(), Some("urgent"));
        assert!(task.validate().is_ok());

        task.clear_priority();
        assert!(task.priority.is_none());
        assert!(task.reason.is_none());
    }

    #[test]
    fn test_differs_from_assignment() {
        let mut task = Task::new("A", "p");
        assert!(task.differs_from_assignment(Priority::Low, "later"));

        task.assign_priority(Priority::Low, "later");
        assert!(!task.differs_from_assignment(Priority::Low, "later"));
        assert!(task.differs_from_assignment(Priority::Low, "much later"));
        assert!(task.differs_from_assignment(Priority::High, "later"));
    }

    #[test]
    fn test_validate_reason_requires_priority() {
        let mut task = Task::new("A", "p");
        task.reason = Some("why".to_string());
        assert!(task.validate().is_err());

        // A manual priority without a reason is fine
        let mut task = Task::new("A", "p");
        task.priority = Some(Priority::Medium);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_validate_title_and_deadline() {
        assert!(Task::new(" ", "p").validate().is_err());
        assert!(Task::new("A", "").validate().is_err());
        assert!(Task::new("A", "p").with_deadline("2024-07-01").validate().is_ok());
        assert!(Task::new("A", "p").with_deadline("next week").validate().is_err());
    }

    #[test]
    fn test_task_serde() {
        let mut task = Task::new("A", "p").with_description("desc");
        task.assign_priority(Priority::Medium, "soon");

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "Medium");
        assert_eq!(json["project_id"], "p");
        assert!(json.get("deadline").is_none());

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_task_deserialize_minimal_document() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "task-5",
            "title": "Create social media content calendar",
            "project_id": "proj-2"
        }))
        .unwrap();
        assert!(task.is_open());
        assert!(task.description.is_none());
    }
}
