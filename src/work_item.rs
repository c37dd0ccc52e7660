use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Draft,
    Ready,
    InProgress,
    Done,
}

/// Status of a work item, tagged by the kind of item it belongs to.
///
/// Tasks and user stories use different lifecycles; planning only cares
/// whether an item is still open, which [`WorkStatus::is_load_bearing`]
/// answers for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum WorkStatus {
    Task(TaskStatus),
    Story(StoryStatus),
}

impl WorkStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkStatus::Task(TaskStatus::Done) | WorkStatus::Story(StoryStatus::Done)
        )
    }

    pub fn is_load_bearing(&self) -> bool {
        !self.is_terminal()
    }

    pub fn kind(&self) -> WorkItemKind {
        match self {
            WorkStatus::Task(_) => WorkItemKind::Task,
            WorkStatus::Story(_) => WorkItemKind::Story,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Task(TaskStatus::Todo) => "task:todo",
            WorkStatus::Task(TaskStatus::InProgress) => "task:in_progress",
            WorkStatus::Task(TaskStatus::Done) => "task:done",
            WorkStatus::Task(TaskStatus::Blocked) => "task:blocked",
            WorkStatus::Story(StoryStatus::Draft) => "story:draft",
            WorkStatus::Story(StoryStatus::Ready) => "story:ready",
            WorkStatus::Story(StoryStatus::InProgress) => "story:in_progress",
            WorkStatus::Story(StoryStatus::Done) => "story:done",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown work item status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for WorkStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_ascii_lowercase().as_str() {
            "task:todo" => WorkStatus::Task(TaskStatus::Todo),
            "task:in_progress" => WorkStatus::Task(TaskStatus::InProgress),
            "task:done" => WorkStatus::Task(TaskStatus::Done),
            "task:blocked" => WorkStatus::Task(TaskStatus::Blocked),
            "story:draft" => WorkStatus::Story(StoryStatus::Draft),
            "story:ready" => WorkStatus::Story(StoryStatus::Ready),
            "story:in_progress" => WorkStatus::Story(StoryStatus::InProgress),
            "story:done" => WorkStatus::Story(StoryStatus::Done),
            _ => return Err(UnknownStatus(s.to_string())),
        };
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Task,
    Story,
}

/// A task or user story as seen by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absent for unestimated items, which carry no load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    pub status: WorkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub assignees: BTreeSet<String>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, status: WorkStatus) -> Self {
        Self {
            id: id.into(),
            project_id: String::new(),
            title: None,
            story_points: None,
            status,
            sprint_id: None,
            deleted_at: None,
            due_date: None,
            assignees: BTreeSet::new(),
        }
    }

    pub fn task(id: impl Into<String>, status: TaskStatus) -> Self {
        Self::new(id, WorkStatus::Task(status))
    }

    pub fn story(id: impl Into<String>, status: StoryStatus) -> Self {
        Self::new(id, WorkStatus::Story(status))
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.story_points = Some(points);
        self
    }

    pub fn in_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn in_sprint(mut self, sprint_id: impl Into<String>) -> Self {
        self.sprint_id = Some(sprint_id.into());
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assignees.insert(assignee.into());
        self
    }

    pub fn kind(&self) -> WorkItemKind {
        self.status.kind()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn effective_points(&self) -> u32 {
        self.story_points.unwrap_or(0)
    }

    pub fn belongs_to_sprint(&self, sprint_id: &str) -> bool {
        self.sprint_id.as_deref() == Some(sprint_id)
    }
}
