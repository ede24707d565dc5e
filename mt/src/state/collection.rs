//! TaskCollection - shared in-memory view of persisted tasks
//!
//! Loaded once from the store and kept in step by callers after every
//! successful write. Order is insertion order, matching the store.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::Task;

use super::document::{DocumentStore, query_records};
use super::messages::StateResponse;

/// Cheaply cloneable handle to the cached task list
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }

    /// Load every task from the store
    pub async fn load(store: &dyn DocumentStore) -> StateResponse<Self> {
        debug!("TaskCollection::load: called");
        let tasks: Vec<Task> = query_records(store, vec![]).await?;
        debug!(count = tasks.len(), "TaskCollection::load: loaded");
        Ok(Self::from_tasks(tasks))
    }

    /// Copy of every cached task
    pub async fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Open tasks of one project, in collection order
    pub async fn open_tasks_for(&self, project_id: &str) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .iter()
            .filter(|t| t.is_open() && t.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Open tasks across all projects
    pub async fn open_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.iter().filter(|t| t.is_open()).cloned().collect()
    }

    /// Completed tasks across all projects
    pub async fn completed_tasks(&self) -> Vec<Task> {
        self.tasks.read().await.iter().filter(|t| t.completed).cloned().collect()
    }

    /// Replace cached tasks by id; unknown ids are appended
    pub async fn apply(&self, updated: &[Task]) {
        debug!(count = updated.len(), "TaskCollection::apply: called");
        let mut tasks = self.tasks.write().await;
        for task in updated {
            match tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task.clone(),
                None => tasks.push(task.clone()),
            }
        }
    }

    /// Copy priority, reason and updated_at onto the cached tasks with the same ids
    ///
    /// Other fields keep their current cached values. Ids no longer cached are skipped.
    pub async fn apply_priorities(&self, assigned: &[Task]) {
        debug!(count = assigned.len(), "TaskCollection::apply_priorities: called");
        let mut tasks = self.tasks.write().await;
        for task in assigned {
            match tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => {
                    existing.priority = task.priority;
                    existing.reason = task.reason.clone();
                    existing.updated_at = task.updated_at;
                }
                None => debug!(task_id = %task.id, "TaskCollection::apply_priorities: task no longer cached"),
            }
        }
    }

    pub async fn insert(&self, task: Task) {
        debug!(%task.id, "TaskCollection::insert: called");
        self.tasks.write().await.push(task);
    }

    pub async fn remove(&self, id: &str) -> Option<Task> {
        debug!(%id, "TaskCollection::remove: called");
        let mut tasks = self.tasks.write().await;
        let idx = tasks.iter().position(|t| t.id == id)?;
        Some(tasks.remove(idx))
    }

    /// Drop every task of a project, returning how many were removed
    pub async fn remove_project(&self, project_id: &str) -> usize {
        debug!(%project_id, "TaskCollection::remove_project: called");
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.project_id != project_id);
        before - tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use crate::state::document::mock::MockDocumentStore;

    fn task(title: &str, project: &str) -> Task {
        Task::new(title, project)
    }

    #[tokio::test]
    async fn test_open_tasks_for_filters_project_and_completion() {
        let mut done = task("Done", "p1");
        done.completed = true;
        let collection = TaskCollection::from_tasks(vec![task("A", "p1"), task("B", "p2"), done, task("C", "p1")]);

        let open: Vec<String> = collection
            .open_tasks_for("p1")
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(open, vec!["A", "C"]);
        assert_eq!(collection.completed_tasks().await.len(), 1);
        assert_eq!(collection.open_tasks().await.len(), 3);
    }

    #[tokio::test]
    async fn test_apply_replaces_by_id_and_keeps_order() {
        let a = task("A", "p1");
        let b = task("B", "p1");
        let collection = TaskCollection::from_tasks(vec![a.clone(), b.clone()]);

        let mut changed = a.clone();
        changed.assign_priority(Priority::High, "urgent");
        collection.apply(&[changed.clone()]).await;

        let snapshot = collection.snapshot().await;
        assert_eq!(snapshot, vec![changed, b]);
    }

    #[tokio::test]
    async fn test_apply_priorities_keeps_newer_fields() {
        let a = task("A", "p1");
        let collection = TaskCollection::from_tasks(vec![a.clone()]);

        // Cached copy changes after the assignment was computed from `a`
        let mut edited = a.clone();
        edited.completed = true;
        edited.title = "A renamed".to_string();
        collection.apply(&[edited]).await;

        let mut assigned = a.clone();
        assigned.assign_priority(Priority::Medium, "soon");
        assigned.updated_at = a.updated_at + 10;
        collection.apply_priorities(&[assigned.clone(), task("Gone", "p1")]).await;

        let cached = collection.get(&a.id).await.unwrap();
        assert!(cached.completed);
        assert_eq!(cached.title, "A renamed");
        assert_eq!(cached.priority, Some(Priority::Medium));
        assert_eq!(cached.reason.as_deref(), Some("soon"));
        assert_eq!(cached.updated_at, assigned.updated_at);
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_and_remove_project() {
        let a = task("A", "p1");
        let collection = TaskCollection::from_tasks(vec![a.clone(), task("B", "p2"), task("C", "p2")]);

        assert_eq!(collection.remove(&a.id).await.map(|t| t.title), Some("A".to_string()));
        assert!(collection.remove(&a.id).await.is_none());
        assert_eq!(collection.remove_project("p2").await, 2);
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let collection = TaskCollection::new();
        let other = collection.clone();
        other.insert(task("A", "p1")).await;
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let store = MockDocumentStore::new();
        let a = task("A", "p1");
        store.seed(&a);
        store.seed(&task("B", "p1"));

        let collection = TaskCollection::load(&store).await.unwrap();
        assert_eq!(collection.len().await, 2);
        assert_eq!(collection.get(&a.id).await, Some(a));
    }

    #[tokio::test]
    async fn test_load_propagates_store_failure() {
        let store = MockDocumentStore::new();
        store.fail_queries();
        assert!(TaskCollection::load(&store).await.is_err());
    }
}
