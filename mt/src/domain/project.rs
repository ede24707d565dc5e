//! Project domain type

use docstore::{Record, now_ms};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::generate_id;

/// Reserved id of the bucket that holds tasks without an explicit project
pub const UNCATEGORIZED_PROJECT_ID: &str = "uncategorized";

/// Display name of the uncategorized bucket
pub const UNCATEGORIZED_PROJECT_NAME: &str = "Uncategorized";

/// A named grouping of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: String,

    /// Display name (non-empty)
    pub name: String,

    /// What the project is trying to achieve; used as the prioritization goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub updated_at: i64,
}

impl Project {
    /// Create a new project with a generated id
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = now_ms();
        Self {
            id: generate_id("project", &name),
            name,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The reserved uncategorized project
    pub fn uncategorized() -> Self {
        let now = now_ms();
        Self {
            id: UNCATEGORIZED_PROJECT_ID.to_string(),
            name: UNCATEGORIZED_PROJECT_NAME.to_string(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_uncategorized(&self) -> bool {
        self.id == UNCATEGORIZED_PROJECT_ID
    }

    /// Goal text sent to the prioritization model
    ///
    /// The description when one is set, otherwise the project name.
    pub fn goal(&self) -> &str {
        debug!(%self.id, "Project::goal: called");
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description,
            _ => &self.name,
        }
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Project name must not be empty".to_string());
        }
        Ok(())
    }
}

impl Record for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "projects"
    }
}
