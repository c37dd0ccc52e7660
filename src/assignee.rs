use crate::planner::{DailyPointsInfo, PlanError, PlanInputs, PlanResult, plan_validated};
use crate::snapshot::LoadBearingSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeLoad {
    pub assignee: String,
    pub current_day_points: u64,
    pub open_items: usize,
}

/// Anchor-day load per contributor.
///
/// Shared items count in full for every assignee. Unassigned items are not
/// attributed to anyone.
pub fn assignee_loads(set: &LoadBearingSet) -> Vec<AssigneeLoad> {
    let mut loads: BTreeMap<&str, AssigneeLoad> = BTreeMap::new();
    for item in set.iter() {
        let committed = item.is_committed_on(set.anchor);
        for assignee in &item.assignees {
            let load = loads.entry(assignee.as_str()).or_insert_with(|| AssigneeLoad {
                assignee: assignee.clone(),
                current_day_points: 0,
                open_items: 0,
            });
            load.open_items += 1;
            if committed {
                load.current_day_points += u64::from(item.story_points);
            }
        }
    }
    loads.into_values().collect()
}

/// Plan `new_work_points` separately against each assignee's load.
pub fn plan_for_assignees(
    set: &LoadBearingSet,
    new_work_points: i64,
    daily_capacity: i64,
) -> PlanResult<BTreeMap<String, DailyPointsInfo>> {
    // Validates capacity and new work once, before fanning out.
    PlanInputs::new(0, new_work_points, daily_capacity)?;

    let loads = assignee_loads(set);
    let plans: Vec<PlanResult<(String, DailyPointsInfo)>> = loads
        .par_iter()
        .map(|load| {
            let current = i64::try_from(load.current_day_points).map_err(|_| {
                PlanError::Validation(format!(
                    "{} commits more points than can be planned",
                    load.assignee
                ))
            })?;
            let inputs = PlanInputs::new(current, new_work_points, daily_capacity)?;
            let plan = plan_validated(set.anchor, &inputs)?;
            Ok((load.assignee.clone(), plan))
        })
        .collect();

    plans.into_iter().collect()
}

/// The assignee who would finish the new work soonest.
///
/// Ties go to the lighter final day, then to the name that sorts first.
pub fn least_loaded(plans: &BTreeMap<String, DailyPointsInfo>) -> Option<&str> {
    plans
        .iter()
        .min_by_key(|&(name, plan)| {
            let last = plan.last_day().map(|day| day.points).unwrap_or(0);
            (plan.days_needed, last, name.as_str())
        })
        .map(|(name, _)| name.as_str())
}
