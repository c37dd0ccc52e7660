use crate::planner::{PlanError, PlanResult};
use crate::work_item::WorkItem;
use std::collections::HashSet;
use thiserror::Error;

/// The story-point scale used when estimating tasks and stories.
pub const POINT_SCALE: [u32; 6] = [1, 2, 3, 5, 8, 13];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ItemValidationError {
    message: String,
}

impl ItemValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn points_from_i64(field: &str, value: i64) -> PlanResult<u64> {
    if value < 0 {
        return Err(PlanError::Validation(format!(
            "{field} must be non-negative (got {value})"
        )));
    }
    if value > i64::from(u32::MAX) {
        return Err(PlanError::Validation(format!(
            "{field} is out of range (got {value})"
        )));
    }
    Ok(value as u64)
}

/// Convert a caller-supplied number into whole story points.
///
/// Story points are integral; a fractional value is an input error, never
/// rounded.
pub fn points_from_f64(field: &str, value: f64) -> PlanResult<u64> {
    if !value.is_finite() {
        return Err(PlanError::Validation(format!(
            "{field} must be a finite number (got {value})"
        )));
    }
    if value < 0.0 {
        return Err(PlanError::Validation(format!(
            "{field} must be non-negative (got {value})"
        )));
    }
    if value.fract() != 0.0 {
        return Err(PlanError::Validation(format!(
            "{field} must be a whole number of story points (got {value})"
        )));
    }
    if value > f64::from(u32::MAX) {
        return Err(PlanError::Validation(format!(
            "{field} is out of range (got {value})"
        )));
    }
    Ok(value as u64)
}

/// Capacity is a configuration value, so it is checked separately from points.
pub fn capacity_from_f64(value: f64) -> PlanResult<i64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PlanError::Configuration(value.to_string()));
    }
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(PlanError::Validation(format!(
            "daily capacity must be a whole number of story points (got {value})"
        )));
    }
    Ok(value as i64)
}

pub fn is_on_point_scale(points: u32) -> bool {
    POINT_SCALE.contains(&points)
}

pub fn validate_work_item(item: &WorkItem) -> Result<(), ItemValidationError> {
    if item.id.trim().is_empty() {
        return Err(ItemValidationError::new("work item requires a non-empty id"));
    }
    if let Some(sprint) = item.sprint_id.as_deref() {
        if sprint.trim().is_empty() {
            return Err(ItemValidationError::new(format!(
                "work item {} has an empty sprint id",
                item.id
            )));
        }
    }
    if item.assignees.iter().any(|a| a.trim().is_empty()) {
        return Err(ItemValidationError::new(format!(
            "work item {} has an empty assignee",
            item.id
        )));
    }
    if let Some(points) = item.story_points {
        if points > 0 && !is_on_point_scale(points) {
            tracing::warn!(item = %item.id, points, "story points outside the estimation scale");
        }
    }
    Ok(())
}

pub fn validate_work_items(items: &[WorkItem]) -> Result<(), ItemValidationError> {
    let mut seen_ids = HashSet::with_capacity(items.len());
    for item in items {
        if !seen_ids.insert(item.id.as_str()) {
            return Err(ItemValidationError::new(format!(
                "duplicate work item id {}",
                item.id
            )));
        }
        validate_work_item(item)?;
    }
    Ok(())
}
