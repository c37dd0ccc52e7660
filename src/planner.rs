use crate::validation;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Story points a contributor is assumed to absorb per calendar day.
pub const DAILY_CAPACITY: i64 = 8;

/// Longest plan, in days after the anchor, that will be produced.
pub const MAX_PLAN_DAYS: u64 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Daily capacity is zero or negative.
    #[error("daily capacity must be a positive number of story points (got {0})")]
    Configuration(String),

    /// Negative, fractional or out-of-range point values.
    #[error("invalid story points: {0}")]
    Validation(String),

    #[error("day {offset_days} after {anchor} is outside the supported calendar range")]
    DateOutOfRange { anchor: NaiveDate, offset_days: u64 },
}

pub type PlanResult<T> = Result<T, PlanError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAllocation {
    pub date: NaiveDate,
    pub points: u64,
}

/// Result of placing new work on top of the anchor day's commitment.
///
/// `distribution[0]` is always the anchor day; `days_needed` counts only the
/// days after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPointsInfo {
    pub current_day_points: u64,
    pub days_needed: u64,
    pub distribution: Vec<DailyAllocation>,
}

impl DailyPointsInfo {
    pub fn total_points(&self) -> u64 {
        self.distribution.iter().map(|day| day.points).sum()
    }

    pub fn last_day(&self) -> Option<&DailyAllocation> {
        self.distribution.last()
    }

    pub fn finish_date(&self) -> Option<NaiveDate> {
        self.last_day().map(|day| day.date)
    }

    pub fn to_cli_summary(&self) -> String {
        let days = self
            .distribution
            .iter()
            .map(|day| format!("{}={}", day.date, day.points))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "today={}, extra_days={}, days=[{}]",
            self.current_day_points, self.days_needed, days
        )
    }
}

/// A day-by-day allocation that has not been pinned to a calendar yet.
///
/// Every day between the anchor day and the last day holds exactly
/// `daily_capacity`, so the shape is stored instead of the per-day list.
/// Depends only on `(current, new, capacity)`, which is what makes plans
/// memoizable; see [`crate::cache::PlanCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointAllocation {
    pub current_day_points: u64,
    pub anchor_day_points: u64,
    pub days_needed: u64,
    pub last_day_points: u64,
    pub daily_capacity: u64,
}

impl PointAllocation {
    /// Points placed `offset` days after the anchor.
    pub fn points_on(&self, offset: u64) -> u64 {
        match offset {
            0 => self.anchor_day_points,
            o if o == self.days_needed => self.last_day_points,
            o if o < self.days_needed => self.daily_capacity,
            _ => 0,
        }
    }

    pub fn dated(&self, anchor: NaiveDate) -> PlanResult<DailyPointsInfo> {
        let mut distribution = Vec::with_capacity(self.days_needed as usize + 1);
        for offset in 0..=self.days_needed {
            distribution.push(DailyAllocation {
                date: date_at(anchor, offset)?,
                points: self.points_on(offset),
            });
        }
        Ok(DailyPointsInfo {
            current_day_points: self.current_day_points,
            days_needed: self.days_needed,
            distribution,
        })
    }
}

/// Validated planner inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanInputs {
    pub current_day_points: u64,
    pub new_work_points: u64,
    pub daily_capacity: u64,
}

impl PlanInputs {
    /// Capacity is checked first: a non-positive capacity is reported as a
    /// configuration error whatever the point values are.
    pub fn new(
        current_day_points: i64,
        new_work_points: i64,
        daily_capacity: i64,
    ) -> PlanResult<Self> {
        let daily_capacity = check_capacity(daily_capacity)?;
        let current_day_points =
            validation::points_from_i64("currentDayPoints", current_day_points)?;
        let new_work_points = validation::points_from_i64("newWorkPoints", new_work_points)?;
        let inputs = Self {
            current_day_points,
            new_work_points,
            daily_capacity,
        };
        let days_needed = inputs.days_needed();
        if days_needed > MAX_PLAN_DAYS {
            return Err(PlanError::Validation(format!(
                "new work needs {days_needed} extra days at {daily_capacity} points per day, \
                 more than the {MAX_PLAN_DAYS} day planning window"
            )));
        }
        Ok(inputs)
    }

    pub fn remaining_today(&self) -> u64 {
        self.daily_capacity.saturating_sub(self.current_day_points)
    }

    pub fn days_needed(&self) -> u64 {
        let remaining = self.remaining_today();
        if self.new_work_points <= remaining {
            0
        } else {
            (self.new_work_points - remaining).div_ceil(self.daily_capacity)
        }
    }

    /// Fails before any allocation if the last day cannot be represented.
    pub fn ensure_dates_in_range(&self, anchor: NaiveDate) -> PlanResult<()> {
        date_at(anchor, self.days_needed()).map(|_| ())
    }

    pub fn allocate(&self) -> PointAllocation {
        let placed_today = self.new_work_points.min(self.remaining_today());
        let anchor_day_points = self.current_day_points + placed_today;
        let leftover = self.new_work_points - placed_today;
        let days_needed = self.days_needed();
        let last_day_points = if days_needed == 0 {
            anchor_day_points
        } else {
            leftover - (days_needed - 1) * self.daily_capacity
        };

        PointAllocation {
            current_day_points: self.current_day_points,
            anchor_day_points,
            days_needed,
            last_day_points,
            daily_capacity: self.daily_capacity,
        }
    }
}

pub fn check_capacity(daily_capacity: i64) -> PlanResult<u64> {
    if daily_capacity <= 0 {
        return Err(PlanError::Configuration(daily_capacity.to_string()));
    }
    Ok(daily_capacity as u64)
}

fn date_at(anchor: NaiveDate, offset_days: u64) -> PlanResult<NaiveDate> {
    anchor
        .checked_add_days(Days::new(offset_days))
        .ok_or(PlanError::DateOutOfRange {
            anchor,
            offset_days,
        })
}

/// Spread `new_work_points` over the anchor day and the days after it.
///
/// The anchor day is topped up to `daily_capacity` first; leftover points
/// fill following days at `daily_capacity` each, the last one possibly
/// partial. Points already committed on the anchor day are never moved, even
/// when they exceed capacity.
pub fn plan_capacity(
    anchor: NaiveDate,
    current_day_points: i64,
    new_work_points: i64,
    daily_capacity: i64,
) -> PlanResult<DailyPointsInfo> {
    let inputs = PlanInputs::new(current_day_points, new_work_points, daily_capacity)?;
    plan_validated(anchor, &inputs)
}

pub fn plan_capacity_default(
    anchor: NaiveDate,
    current_day_points: i64,
    new_work_points: i64,
) -> PlanResult<DailyPointsInfo> {
    plan_capacity(anchor, current_day_points, new_work_points, DAILY_CAPACITY)
}

pub(crate) fn plan_validated(
    anchor: NaiveDate,
    inputs: &PlanInputs,
) -> PlanResult<DailyPointsInfo> {
    inputs.ensure_dates_in_range(anchor)?;
    if inputs.current_day_points > inputs.daily_capacity {
        tracing::warn!(
            %anchor,
            current_day_points = inputs.current_day_points,
            daily_capacity = inputs.daily_capacity,
            "anchor day is already over capacity"
        );
    }
    let plan = inputs.allocate().dated(anchor)?;
    tracing::debug!(
        %anchor,
        current_day_points = inputs.current_day_points,
        new_work_points = inputs.new_work_points,
        daily_capacity = inputs.daily_capacity,
        days_needed = plan.days_needed,
        "planned capacity"
    );
    Ok(plan)
}
