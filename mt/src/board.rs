//! Board - project and task CRUD over the document store
//!
//! Every mutation writes the store first and only touches the in-memory
//! task collection once the write succeeded.

use std::collections::HashMap;
use std::sync::Arc;

use docstore::{Record, WriteOp, now_ms};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{IdResolver, Priority, Project, Task, UNCATEGORIZED_PROJECT_ID, UNCATEGORIZED_PROJECT_NAME};
use crate::state::{DocumentStore, StateError, TaskCollection, create_record, get_record, query_records};

/// Errors from board operations
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("No project matches '{0}'")]
    ProjectNotFound(String),

    #[error("No task matches '{0}'")]
    TaskNotFound(String),

    #[error("'{reference}' is ambiguous, candidates: {}", .candidates.join(", "))]
    Ambiguous { reference: String, candidates: Vec<String> },

    #[error("The {0} project cannot be deleted")]
    ProtectedProject(String),

    #[error(transparent)]
    State(#[from] StateError),
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Project reference (id, id prefix or slug fragment); uncategorized when absent
    pub project: Option<String>,
    /// YYYY-MM-DD
    pub deadline: Option<String>,
}

/// Partial edit of a task; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    /// Empty string clears the description
    pub description: Option<String>,
    /// Empty string clears the deadline
    pub deadline: Option<String>,
    /// `Some(None)` clears the priority and its reason
    pub priority: Option<Option<Priority>>,
    pub reason: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
            && self.reason.is_none()
    }
}

/// Project and task operations
pub struct Board {
    store: Arc<dyn DocumentStore>,
    tasks: TaskCollection,
}

impl Board {
    /// Open the board, creating the uncategorized project when missing
    pub async fn open(store: Arc<dyn DocumentStore>) -> BoardResult<Self> {
        debug!("Board::open: called");
        let existing: Option<Project> = get_record(store.as_ref(), UNCATEGORIZED_PROJECT_ID).await?;
        if existing.is_none() {
            info!("Creating {} project", UNCATEGORIZED_PROJECT_NAME);
            create_record(store.as_ref(), &Project::uncategorized()).await?;
        }

        let tasks = TaskCollection::load(store.as_ref()).await?;
        Ok(Self { store, tasks })
    }

    /// Shared store handle
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Shared task collection handle
    pub fn tasks(&self) -> TaskCollection {
        self.tasks.clone()
    }

    // === Projects ===

    pub async fn projects(&self) -> BoardResult<Vec<Project>> {
        debug!("Board::projects: called");
        Ok(query_records(self.store.as_ref(), vec![]).await?)
    }

    /// Resolve a project reference to a project
    pub async fn project(&self, reference: &str) -> BoardResult<Project> {
        debug!(%reference, "Board::project: called");
        let projects = self.projects().await?;
        let ids: HashMap<String, String> = projects.iter().map(|p| (p.id.clone(), p.name.clone())).collect();
        let id = resolve(&ids, reference)?.ok_or_else(|| BoardError::ProjectNotFound(reference.to_string()))?;
        projects
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| BoardError::ProjectNotFound(reference.to_string()))
    }

    pub async fn add_project(&self, name: &str, description: Option<String>) -> BoardResult<Project> {
        debug!(%name, "Board::add_project: called");
        let mut project = Project::new(name.trim());
        project.description = non_empty(description);
        project.validate().map_err(BoardError::Invalid)?;

        create_record(self.store.as_ref(), &project).await?;
        info!(project_id = %project.id, "Added project");
        Ok(project)
    }

    /// Rename a project or change its description (empty clears it)
    pub async fn update_project(
        &self,
        reference: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> BoardResult<Project> {
        debug!(%reference, "Board::update_project: called");
        let mut project = self.project(reference).await?;
        if let Some(name) = name {
            project.name = name.trim().to_string();
        }
        if let Some(description) = description {
            project.description = non_empty(Some(description));
        }
        project.updated_at = now_ms();
        project.validate().map_err(BoardError::Invalid)?;

        let fields = json!({
            "name": project.name,
            "description": project.description,
            "updated_at": project.updated_at,
        });
        self.store
            .update(Project::collection_name(), &project.id, fields)
            .await?;
        info!(project_id = %project.id, "Updated project");
        Ok(project)
    }

    /// Delete a project and all of its tasks in one batch
    ///
    /// Returns the number of tasks removed.
    pub async fn delete_project(&self, reference: &str) -> BoardResult<usize> {
        debug!(%reference, "Board::delete_project: called");
        let project = self.project(reference).await?;
        if project.is_uncategorized() {
            return Err(BoardError::ProtectedProject(project.name));
        }

        let mut ops: Vec<WriteOp> = self
            .tasks
            .snapshot()
            .await
            .into_iter()
            .filter(|t| t.project_id == project.id)
            .map(|t| WriteOp::delete(Task::collection_name(), t.id))
            .collect();
        ops.push(WriteOp::delete(Project::collection_name(), project.id.clone()));

        self.store.batch_write(ops).await?;
        let removed = self.tasks.remove_project(&project.id).await;
        info!(project_id = %project.id, removed, "Deleted project");
        Ok(removed)
    }

    // === Tasks ===

    /// Resolve a task reference to a cached task
    pub async fn task(&self, reference: &str) -> BoardResult<Task> {
        debug!(%reference, "Board::task: called");
        let tasks = self.tasks.snapshot().await;
        let ids: HashMap<String, String> = tasks.iter().map(|t| (t.id.clone(), t.title.clone())).collect();
        let id = resolve(&ids, reference)?.ok_or_else(|| BoardError::TaskNotFound(reference.to_string()))?;
        tasks
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::TaskNotFound(reference.to_string()))
    }

    pub async fn add_task(&self, new: NewTask) -> BoardResult<Task> {
        debug!(title = %new.title, "Board::add_task: called");
        let project_id = match new.project.as_deref() {
            Some(reference) => self.project(reference).await?.id,
            None => UNCATEGORIZED_PROJECT_ID.to_string(),
        };

        let mut task = Task::new(new.title.trim(), project_id);
        task.description = non_empty(new.description);
        task.deadline = non_empty(new.deadline);
        task.validate().map_err(BoardError::Invalid)?;

        create_record(self.store.as_ref(), &task).await?;
        self.tasks.insert(task.clone()).await;
        info!(task_id = %task.id, project_id = %task.project_id, "Added task");
        Ok(task)
    }

    pub async fn update_task(&self, reference: &str, patch: TaskPatch) -> BoardResult<Task> {
        debug!(%reference, "Board::update_task: called");
        if patch.is_empty() {
            return Err(BoardError::Invalid("Nothing to update".to_string()));
        }

        let mut task = self.task(reference).await?;
        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = non_empty(Some(description));
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = non_empty(Some(deadline));
        }
        match patch.priority {
            Some(Some(priority)) => task.priority = Some(priority),
            Some(None) => task.clear_priority(),
            None => {}
        }
        if let Some(reason) = patch.reason {
            task.reason = non_empty(Some(reason));
        }
        task.validate().map_err(BoardError::Invalid)?;

        self.save_task(task).await
    }

    /// Flip a task between open and completed
    pub async fn toggle_task(&self, reference: &str) -> BoardResult<Task> {
        debug!(%reference, "Board::toggle_task: called");
        let mut task = self.task(reference).await?;
        task.completed = !task.completed;
        self.save_task(task).await
    }

    pub async fn move_task(&self, reference: &str, project_reference: &str) -> BoardResult<Task> {
        debug!(%reference, %project_reference, "Board::move_task: called");
        let mut task = self.task(reference).await?;
        task.project_id = self.project(project_reference).await?.id;
        self.save_task(task).await
    }

    pub async fn delete_task(&self, reference: &str) -> BoardResult<Task> {
        debug!(%reference, "Board::delete_task: called");
        let task = self.task(reference).await?;
        self.store.delete(Task::collection_name(), &task.id).await?;
        self.tasks.remove(&task.id).await;
        info!(task_id = %task.id, "Deleted task");
        Ok(task)
    }

    // === Views ===

    pub async fn open_tasks(&self, project_id: &str) -> Vec<Task> {
        self.tasks.open_tasks_for(project_id).await
    }

    pub async fn all_open_tasks(&self) -> Vec<Task> {
        self.tasks.open_tasks().await
    }

    pub async fn completed_tasks(&self) -> Vec<Task> {
        self.tasks.completed_tasks().await
    }

    async fn save_task(&self, mut task: Task) -> BoardResult<Task> {
        task.touch();
        self.store
            .update(Task::collection_name(), &task.id, task_fields(&task))
            .await?;
        self.tasks.apply(std::slice::from_ref(&task)).await;
        info!(task_id = %task.id, "Updated task");
        Ok(task)
    }
}

/// Every mutable task field, with `null` for cleared options
fn task_fields(task: &Task) -> Value {
    json!({
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "project_id": task.project_id,
        "priority": task.priority,
        "reason": task.reason,
        "deadline": task.deadline,
        "updated_at": task.updated_at,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn resolve(ids: &HashMap<String, String>, reference: &str) -> BoardResult<Option<String>> {
    IdResolver::new(ids)
        .resolve(reference.trim())
        .map_err(|candidates| BoardError::Ambiguous {
            reference: reference.to_string(),
            candidates,
        })
}
