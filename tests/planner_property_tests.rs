use chrono::NaiveDate;
use proptest::prelude::*;
use sprint_capacity::{PlanCache, PlanError, plan_capacity};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn points(plan: &sprint_capacity::DailyPointsInfo) -> Vec<u64> {
    plan.distribution.iter().map(|day| day.points).collect()
}

#[test]
fn boundary_full_day_without_new_work() {
    let plan = plan_capacity(d(2025, 1, 6), 8, 0, 8).unwrap();
    assert_eq!(plan.days_needed, 0);
    assert_eq!(points(&plan), [8]);
}

#[test]
fn boundary_twenty_points_from_empty_day() {
    let plan = plan_capacity(d(2025, 1, 6), 0, 20, 8).unwrap();
    assert_eq!(plan.days_needed, 2);
    assert_eq!(points(&plan), [8, 8, 4]);
}

#[test]
fn boundary_overcommitted_day() {
    let plan = plan_capacity(d(2025, 1, 6), 10, 5, 8).unwrap();
    assert_eq!(plan.days_needed, 1);
    assert_eq!(points(&plan), [10, 5]);
}

#[test]
fn distribution_crosses_month_and_year_boundaries() {
    let plan = plan_capacity(d(2025, 12, 31), 0, 17, 8).unwrap();
    let dates: Vec<NaiveDate> = plan.distribution.iter().map(|day| day.date).collect();
    assert_eq!(dates, [d(2025, 12, 31), d(2026, 1, 1), d(2026, 1, 2)]);
    assert_eq!(plan.finish_date(), Some(d(2026, 1, 2)));
}

fn expected_days_needed(c: u64, n: u64, cap: u64) -> u64 {
    let remaining = cap.saturating_sub(c);
    if n > remaining {
        (n - remaining).div_ceil(cap)
    } else {
        0
    }
}

proptest! {
    #[test]
    fn distribution_sums_to_committed_plus_new(c in 0i64..200, n in 0i64..500, cap in 1i64..40) {
        let plan = plan_capacity(d(2025, 3, 3), c, n, cap).unwrap();
        prop_assert_eq!(plan.total_points(), (c + n) as u64);
        prop_assert_eq!(plan.current_day_points, c as u64);
    }

    #[test]
    fn days_needed_matches_closed_form(c in 0i64..200, n in 0i64..500, cap in 1i64..40) {
        let plan = plan_capacity(d(2025, 3, 3), c, n, cap).unwrap();
        prop_assert_eq!(plan.days_needed, expected_days_needed(c as u64, n as u64, cap as u64));
        prop_assert_eq!(plan.days_needed as usize, plan.distribution.len() - 1);
    }

    #[test]
    fn only_the_anchor_day_may_exceed_capacity(c in 0i64..200, n in 0i64..500, cap in 1i64..40) {
        let plan = plan_capacity(d(2025, 3, 3), c, n, cap).unwrap();
        let first = plan.distribution[0].points;
        prop_assert!(first <= (c as u64).max(cap as u64));
        prop_assert!(first >= c as u64);
        for day in &plan.distribution[1..] {
            prop_assert!(day.points <= cap as u64);
            prop_assert!(day.points > 0);
        }
    }

    #[test]
    fn dates_are_consecutive_from_anchor(c in 0i64..50, n in 0i64..300, cap in 1i64..20) {
        let anchor = d(2024, 2, 27);
        let plan = plan_capacity(anchor, c, n, cap).unwrap();
        prop_assert_eq!(plan.distribution[0].date, anchor);
        for pair in plan.distribution.windows(2) {
            prop_assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
        }
    }

    #[test]
    fn planning_is_idempotent(c in 0i64..200, n in 0i64..500, cap in 1i64..40) {
        let first = plan_capacity(d(2025, 3, 3), c, n, cap).unwrap();
        let second = plan_capacity(d(2025, 3, 3), c, n, cap).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn cache_agrees_with_direct_planning(c in 0i64..30, n in 0i64..60, cap in 1i64..10) {
        let cache = PlanCache::with_capacity(8);
        let anchor = d(2025, 3, 3);
        let cached = cache.plan(anchor, c, n, cap).unwrap();
        let again = cache.plan(anchor, c, n, cap).unwrap();
        prop_assert_eq!(&cached, &again);
        prop_assert_eq!(cached, plan_capacity(anchor, c, n, cap).unwrap());
    }

    #[test]
    fn non_positive_capacity_is_always_a_configuration_error(
        c in -50i64..50,
        n in -50i64..50,
        cap in -20i64..=0,
    ) {
        let result = plan_capacity(d(2025, 3, 3), c, n, cap);
        prop_assert!(matches!(result, Err(PlanError::Configuration(_))));
    }
}
