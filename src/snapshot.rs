use crate::work_item::WorkItem;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The planner's view of an open, non-deleted item in the active sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBearingItem {
    pub id: String,
    pub story_points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub assignees: BTreeSet<String>,
}

impl LoadBearingItem {
    /// Overdue items are still committed work for the anchor day.
    pub fn is_committed_on(&self, anchor: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due <= anchor)
    }
}

impl From<&WorkItem> for LoadBearingItem {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            story_points: item.effective_points(),
            due_date: item.due_date,
            assignees: item.assignees.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBearingSet {
    pub sprint_id: String,
    pub anchor: NaiveDate,
    pub items: Vec<LoadBearingItem>,
}

impl LoadBearingSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadBearingItem> {
        self.items.iter()
    }

    /// Points already committed for the anchor day.
    pub fn current_day_points(&self) -> u64 {
        self.items
            .iter()
            .filter(|item| item.is_committed_on(self.anchor))
            .map(|item| u64::from(item.story_points))
            .sum()
    }

    pub fn backlog_points(&self) -> u64 {
        self.total_points() - self.current_day_points()
    }

    pub fn total_points(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.story_points))
            .sum()
    }

    /// Earliest due date first, undated items last. Equal keys keep input order.
    pub fn ordered_by_due_date(&self) -> Vec<LoadBearingItem> {
        let mut ordered = self.items.clone();
        ordered.sort_by_key(|item| (item.due_date.is_none(), item.due_date));
        ordered
    }
}

/// Filter a project's items down to the ones that put load on `sprint_id`.
///
/// Deleted items, items outside the sprint and items in a terminal status are
/// dropped. The remaining items keep their input order.
pub fn select_load_bearing_items(
    items: &[WorkItem],
    sprint_id: &str,
    anchor: NaiveDate,
) -> LoadBearingSet {
    let selected: Vec<LoadBearingItem> = items
        .iter()
        .filter(|item| !item.is_deleted())
        .filter(|item| item.belongs_to_sprint(sprint_id))
        .filter(|item| item.status.is_load_bearing())
        .map(LoadBearingItem::from)
        .collect();

    tracing::debug!(
        sprint_id,
        %anchor,
        input = items.len(),
        selected = selected.len(),
        "selected load-bearing items"
    );

    LoadBearingSet {
        sprint_id: sprint_id.to_string(),
        anchor,
        items: selected,
    }
}
