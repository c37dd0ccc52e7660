use super::{RepositoryError, RepositoryResult, validate_items};
use crate::work_item::{WorkItem, WorkStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exported_at: Option<DateTime<Utc>>,
    items: Vec<WorkItem>,
}

pub fn save_items_to_json<P: AsRef<Path>>(items: &[WorkItem], path: P) -> RepositoryResult<()> {
    validate_items(items)?;
    let snapshot = ItemsSnapshot {
        exported_at: Some(Utc::now()),
        items: items.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

/// Accepts either `{"items": [...]}` or a bare array of items.
pub fn load_items_from_json<P: AsRef<Path>>(path: P) -> RepositoryResult<Vec<WorkItem>> {
    let file = File::open(path)?;
    let value: serde_json::Value = serde_json::from_reader(file)?;
    let items: Vec<WorkItem> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        serde_json::from_value::<ItemsSnapshot>(value)?.items
    };
    validate_items(&items)?;
    tracing::debug!(count = items.len(), "loaded work items from json");
    Ok(items)
}

#[derive(Default, Serialize, Deserialize)]
struct WorkItemCsvRecord {
    id: String,
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    story_points: String,
    status: String,
    #[serde(default)]
    sprint_id: String,
    #[serde(default)]
    deleted_at: String,
    #[serde(default)]
    due_date: String,
    #[serde(default)]
    assignees: String,
}

impl From<&WorkItem> for WorkItemCsvRecord {
    fn from(item: &WorkItem) -> Self {
        Self {
            id: item.id.clone(),
            project_id: item.project_id.clone(),
            title: item.title.clone().unwrap_or_default(),
            story_points: item
                .story_points
                .map(|p| p.to_string())
                .unwrap_or_default(),
            status: item.status.as_str().to_string(),
            sprint_id: item.sprint_id.clone().unwrap_or_default(),
            deleted_at: item
                .deleted_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
            due_date: format_date(item.due_date),
            assignees: item.assignees.iter().cloned().collect::<Vec<_>>().join(";"),
        }
    }
}

impl WorkItemCsvRecord {
    fn into_item(self) -> RepositoryResult<WorkItem> {
        let status: WorkStatus = self
            .status
            .parse()
            .map_err(|err| RepositoryError::InvalidData(format!("item {}: {err}", self.id)))?;
        let mut item = WorkItem::new(self.id, status);
        item.project_id = self.project_id.trim().to_string();
        item.title = parse_string_option(self.title);
        item.story_points = parse_points(&self.story_points)?;
        item.sprint_id = parse_string_option(self.sprint_id);
        item.deleted_at = parse_timestamp(&self.deleted_at)?;
        item.due_date = parse_date(&self.due_date)?;
        item.assignees = split_assignees(&self.assignees);
        Ok(item)
    }
}

pub fn save_items_to_csv<P: AsRef<Path>>(items: &[WorkItem], path: P) -> RepositoryResult<()> {
    validate_items(items)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for item in items {
        writer.serialize(WorkItemCsvRecord::from(item))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_items_from_csv<P: AsRef<Path>>(path: P) -> RepositoryResult<Vec<WorkItem>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut items = Vec::new();
    for record in reader.deserialize::<WorkItemCsvRecord>() {
        items.push(record?.into_item()?);
    }
    validate_items(&items)?;
    tracing::debug!(count = items.len(), "loaded work items from csv");
    Ok(items)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> RepositoryResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| RepositoryError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_timestamp(input: &str) -> RepositoryResult<Option<DateTime<Utc>>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(input.trim())
        .map(|at| Some(at.with_timezone(&Utc)))
        .map_err(|e| RepositoryError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}

/// Story points must be whole numbers; "2.5" is rejected rather than rounded.
fn parse_points(input: &str) -> RepositoryResult<Option<u32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|e| RepositoryError::InvalidData(format!("invalid story points '{input}': {e}")))
}

fn split_assignees(input: &str) -> BTreeSet<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}
