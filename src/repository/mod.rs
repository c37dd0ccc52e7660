use crate::validation;
use crate::work_item::WorkItem;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("work item {0} not found")]
    ItemNotFound(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read access to the tracker's tasks and stories.
///
/// Implementations return raw records, deleted and finished ones included;
/// deciding what counts as load is up to
/// [`select_load_bearing_items`](crate::snapshot::select_load_bearing_items).
pub trait WorkItemRepository {
    fn sprint_items(&self, sprint_id: &str) -> RepositoryResult<Vec<WorkItem>>;
    fn project_items_without_sprint(&self, project_id: &str) -> RepositoryResult<Vec<WorkItem>>;
}

impl<R: WorkItemRepository + ?Sized> WorkItemRepository for &R {
    fn sprint_items(&self, sprint_id: &str) -> RepositoryResult<Vec<WorkItem>> {
        (**self).sprint_items(sprint_id)
    }

    fn project_items_without_sprint(&self, project_id: &str) -> RepositoryResult<Vec<WorkItem>> {
        (**self).project_items_without_sprint(project_id)
    }
}

pub fn validate_items(items: &[WorkItem]) -> RepositoryResult<()> {
    validation::validate_work_items(items)
        .map_err(|err| RepositoryError::InvalidData(err.to_string()))
}

/// Items held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    items: Vec<WorkItem>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<WorkItem>) -> RepositoryResult<Self> {
        validate_items(&items)?;
        Ok(Self { items })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Replace the item with the same id in place, or append it.
    /// Returns true when an existing item was replaced.
    pub fn upsert(&mut self, item: WorkItem) -> RepositoryResult<bool> {
        validation::validate_work_item(&item)
            .map_err(|err| RepositoryError::InvalidData(err.to_string()))?;
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                Ok(true)
            }
            None => {
                self.items.push(item);
                Ok(false)
            }
        }
    }

    /// Mark an item deleted. The record stays so history is kept; deleting
    /// twice keeps the first timestamp.
    pub fn soft_delete(
        &mut self,
        id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<&WorkItem> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| RepositoryError::ItemNotFound(id.to_string()))?;
        if item.deleted_at.is_none() {
            item.deleted_at = Some(at);
        }
        Ok(item)
    }

    pub fn sprint_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .items
            .iter()
            .filter_map(|item| item.sprint_id.as_deref())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl WorkItemRepository for InMemoryRepository {
    fn sprint_items(&self, sprint_id: &str) -> RepositoryResult<Vec<WorkItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.belongs_to_sprint(sprint_id))
            .cloned()
            .collect())
    }

    fn project_items_without_sprint(&self, project_id: &str) -> RepositoryResult<Vec<WorkItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.project_id == project_id && item.sprint_id.is_none())
            .cloned()
            .collect())
    }
}

pub mod file;

pub use file::{load_items_from_csv, load_items_from_json, save_items_to_csv, save_items_to_json};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_item::{StoryStatus, TaskStatus};

    fn repo() -> InMemoryRepository {
        InMemoryRepository::from_items(vec![
            WorkItem::task("T-1", TaskStatus::Todo)
                .in_project("p1")
                .in_sprint("s1"),
            WorkItem::story("S-1", StoryStatus::Ready).in_project("p1"),
            WorkItem::task("T-2", TaskStatus::Done)
                .in_project("p2")
                .in_sprint("s2"),
        ])
        .unwrap()
    }

    #[test]
    fn reads_by_sprint_and_backlog() {
        let repo = repo();
        let sprint: Vec<String> = repo
            .sprint_items("s1")
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(sprint, ["T-1"]);
        let backlog = repo.project_items_without_sprint("p1").unwrap();
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog[0].id, "S-1");
        assert_eq!(repo.sprint_ids(), ["s1", "s2"]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut repo = repo();
        let replaced = repo
            .upsert(WorkItem::task("T-1", TaskStatus::Done).in_sprint("s1"))
            .unwrap();
        assert!(replaced);
        assert_eq!(repo.items()[0].status.as_str(), "task:done");
        assert!(!repo.upsert(WorkItem::task("T-9", TaskStatus::Todo)).unwrap());
        assert_eq!(repo.len(), 4);
    }

    #[test]
    fn soft_delete_keeps_first_timestamp() {
        let mut repo = repo();
        let first = Utc::now();
        repo.soft_delete("T-1", first).unwrap();
        let later = first + chrono::Duration::hours(1);
        let item = repo.soft_delete("T-1", later).unwrap();
        assert_eq!(item.deleted_at, Some(first));
        assert!(matches!(
            repo.soft_delete("nope", later),
            Err(RepositoryError::ItemNotFound(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected_on_construction() {
        let result = InMemoryRepository::from_items(vec![
            WorkItem::task("T-1", TaskStatus::Todo),
            WorkItem::task("T-1", TaskStatus::Todo),
        ]);
        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }
}
