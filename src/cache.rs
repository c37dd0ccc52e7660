use crate::planner::{DailyPointsInfo, PlanInputs, PlanResult, PointAllocation};
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Memoizes undated allocation shapes by `(current, new, capacity)`.
///
/// Cached and uncached plans are identical; the anchor date is applied after
/// lookup. When the cache is full it is cleared rather than evicting
/// entry by entry.
#[derive(Debug)]
pub struct PlanCache {
    entries: RwLock<HashMap<PlanInputs, PointAllocation>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl PlanCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn plan(
        &self,
        anchor: NaiveDate,
        current_day_points: i64,
        new_work_points: i64,
        daily_capacity: i64,
    ) -> PlanResult<DailyPointsInfo> {
        let inputs = PlanInputs::new(current_day_points, new_work_points, daily_capacity)?;
        let allocation = self.allocation(anchor, inputs)?;
        allocation.dated(anchor)
    }

    fn allocation(
        &self,
        anchor: NaiveDate,
        inputs: PlanInputs,
    ) -> PlanResult<PointAllocation> {
        if let Some(found) = self.entries.read().get(&inputs) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*found);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        inputs.ensure_dates_in_range(anchor)?;
        let allocation = inputs.allocate();

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&inputs) {
            tracing::debug!(entries = entries.len(), "plan cache full, clearing");
            entries.clear();
        }
        entries.insert(inputs, allocation);
        Ok(allocation)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
