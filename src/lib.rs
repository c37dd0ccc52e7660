pub mod assignee;
pub mod cache;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod planner;
pub mod repository;
pub mod snapshot;
pub mod sprint;
pub mod validation;
pub mod work_item;

pub use assignee::{AssigneeLoad, assignee_loads, least_loaded, plan_for_assignees};
pub use cache::PlanCache;
pub use config::{ConfigError, PlannerConfig};
pub use planner::{
    DAILY_CAPACITY, DailyAllocation, DailyPointsInfo, MAX_PLAN_DAYS, PlanError, PlanResult,
    plan_capacity, plan_capacity_default,
};
pub use repository::{
    InMemoryRepository, RepositoryError, RepositoryResult, WorkItemRepository,
    load_items_from_csv, load_items_from_json, save_items_to_csv, save_items_to_json,
};
pub use snapshot::{LoadBearingItem, LoadBearingSet, select_load_bearing_items};
pub use sprint::{AssigneePlan, SprintPlan, SprintPlanError, SprintPlanner};
pub use work_item::{StoryStatus, TaskStatus, WorkItem, WorkItemKind, WorkStatus};
