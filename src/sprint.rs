use crate::assignee::{self, AssigneeLoad};
use crate::planner::{DAILY_CAPACITY, DailyPointsInfo, PlanError, PlanInputs, plan_validated};
use crate::repository::{RepositoryError, WorkItemRepository};
use crate::snapshot::{LoadBearingSet, select_load_bearing_items};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SprintPlanError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

pub type SprintPlanResult<T> = Result<T, SprintPlanError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPlan {
    pub sprint_id: String,
    pub anchor: NaiveDate,
    pub load_bearing_count: usize,
    pub backlog_points: u64,
    pub plan: DailyPointsInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneePlan {
    pub sprint_id: String,
    pub anchor: NaiveDate,
    pub loads: Vec<AssigneeLoad>,
    pub plans: BTreeMap<String, DailyPointsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_assignee: Option<String>,
}

/// Ties a work item repository to the capacity planner.
#[derive(Debug, Clone)]
pub struct SprintPlanner<R> {
    repository: R,
    daily_capacity: i64,
}

impl<R: WorkItemRepository> SprintPlanner<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            daily_capacity: DAILY_CAPACITY,
        }
    }

    pub fn with_daily_capacity(repository: R, daily_capacity: i64) -> Self {
        Self {
            repository,
            daily_capacity,
        }
    }

    pub fn daily_capacity(&self) -> i64 {
        self.daily_capacity
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn load_bearing(
        &self,
        sprint_id: &str,
        anchor: NaiveDate,
    ) -> SprintPlanResult<LoadBearingSet> {
        let items = self.repository.sprint_items(sprint_id)?;
        Ok(select_load_bearing_items(&items, sprint_id, anchor))
    }

    /// Place `new_work_points` on top of what the sprint already commits for
    /// `anchor`.
    pub fn plan_sprint(
        &self,
        sprint_id: &str,
        anchor: NaiveDate,
        new_work_points: i64,
    ) -> SprintPlanResult<SprintPlan> {
        // Bad configuration is reported before touching the repository.
        PlanInputs::new(0, new_work_points, self.daily_capacity)?;

        let set = self.load_bearing(sprint_id, anchor)?;
        let current = i64::try_from(set.current_day_points()).map_err(|_| {
            PlanError::Validation(format!(
                "sprint {sprint_id} commits more points than can be planned"
            ))
        })?;
        let inputs = PlanInputs::new(current, new_work_points, self.daily_capacity)?;
        let plan = plan_validated(anchor, &inputs)?;

        tracing::info!(
            sprint_id,
            %anchor,
            load_bearing = set.len(),
            current_day_points = plan.current_day_points,
            days_needed = plan.days_needed,
            "planned sprint capacity"
        );

        Ok(SprintPlan {
            sprint_id: sprint_id.to_string(),
            anchor,
            load_bearing_count: set.len(),
            backlog_points: set.backlog_points(),
            plan,
        })
    }

    pub fn plan_assignees(
        &self,
        sprint_id: &str,
        anchor: NaiveDate,
        new_work_points: i64,
    ) -> SprintPlanResult<AssigneePlan> {
        let set = self.load_bearing(sprint_id, anchor)?;
        let plans = assignee::plan_for_assignees(&set, new_work_points, self.daily_capacity)?;
        let suggested_assignee = assignee::least_loaded(&plans).map(ToOwned::to_owned);
        Ok(AssigneePlan {
            sprint_id: sprint_id.to_string(),
            anchor,
            loads: assignee::assignee_loads(&set),
            plans,
            suggested_assignee,
        })
    }

    /// Open points on project items that have not been pulled into a sprint.
    pub fn unplanned_points(&self, project_id: &str) -> SprintPlanResult<u64> {
        let items = self.repository.project_items_without_sprint(project_id)?;
        Ok(items
            .iter()
            .filter(|item| !item.is_deleted() && item.status.is_load_bearing())
            .map(|item| u64::from(item.effective_points()))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use crate::work_item::{StoryStatus, TaskStatus, WorkItem};

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo() -> InMemoryRepository {
        let anchor = d(2025, 5, 12);
        InMemoryRepository::from_items(vec![
            WorkItem::task("T-1", TaskStatus::InProgress)
                .in_project("p1")
                .in_sprint("s1")
                .with_points(5)
                .due_on(anchor)
                .assigned_to("ana"),
            WorkItem::task("T-2", TaskStatus::Todo)
                .in_project("p1")
                .in_sprint("s1")
                .with_points(3)
                .due_on(d(2025, 5, 20)),
            WorkItem::task("T-3", TaskStatus::Done)
                .in_project("p1")
                .in_sprint("s1")
                .with_points(8)
                .due_on(anchor),
            WorkItem::story("S-1", StoryStatus::Draft)
                .in_project("p1")
                .with_points(13),
            WorkItem::story("S-2", StoryStatus::Done)
                .in_project("p1")
                .with_points(2),
        ])
        .unwrap()
    }

    #[test]
    fn plans_new_work_on_top_of_todays_commitment() {
        let planner = SprintPlanner::new(repo());
        let plan = planner.plan_sprint("s1", d(2025, 5, 12), 12).unwrap();
        assert_eq!(plan.load_bearing_count, 2);
        assert_eq!(plan.backlog_points, 3);
        assert_eq!(plan.plan.current_day_points, 5);
        let points: Vec<u64> = plan.plan.distribution.iter().map(|d| d.points).collect();
        assert_eq!(points, [8, 8, 1]);
        assert_eq!(plan.plan.days_needed, 2);
    }

    #[test]
    fn unknown_sprint_plans_from_an_empty_day() {
        let planner = SprintPlanner::new(repo());
        let plan = planner.plan_sprint("nope", d(2025, 5, 12), 4).unwrap();
        assert_eq!(plan.load_bearing_count, 0);
        assert_eq!(plan.plan.distribution[0].points, 4);
    }

    #[test]
    fn configuration_error_surfaces_through_the_service() {
        let planner = SprintPlanner::with_daily_capacity(repo(), 0);
        let err = planner.plan_sprint("s1", d(2025, 5, 12), 4).unwrap_err();
        assert!(matches!(err, SprintPlanError::Plan(PlanError::Configuration(_))));
    }

    #[test]
    fn unplanned_points_skip_done_items() {
        let planner = SprintPlanner::new(repo());
        assert_eq!(planner.unplanned_points("p1").unwrap(), 13);
        assert_eq!(planner.unplanned_points("other").unwrap(), 0);
    }

    #[test]
    fn assignee_plan_suggests_someone() {
        let planner = SprintPlanner::new(repo());
        let plan = planner.plan_assignees("s1", d(2025, 5, 12), 2).unwrap();
        assert_eq!(plan.loads.len(), 1);
        assert_eq!(plan.suggested_assignee.as_deref(), Some("ana"));
        assert_eq!(plan.plans["ana"].distribution[0].points, 7);
    }
}
