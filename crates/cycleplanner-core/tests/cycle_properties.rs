//! Cycle mapping properties over generated calendars, plus the fixed
//! 2025-2026 scenarios.

use chrono::{Duration, NaiveDate};
use cycleplanner_core::calendar::{self, NonInstructionalCalendar};
use cycleplanner_core::{
    CycleConfig, CycleContext, CycleDay, CycleSettings, Planner, PlannerError, PlannerSettings,
    SchoolYear,
};
use proptest::prelude::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn cd(n: u8) -> CycleDay {
    CycleDay::new(n).unwrap()
}

fn closures(base: NaiveDate, offsets: &[i64]) -> NonInstructionalCalendar {
    let mut days = NonInstructionalCalendar::default();
    for offset in offsets {
        // duplicates are rejected; the first one is enough
        let _ = days.add(base + Duration::days(*offset), "closure");
    }
    days
}

fn context(days: &NonInstructionalCalendar) -> CycleContext<'_> {
    CycleContext {
        school_year: SchoolYear::starting(2025),
        non_instructional: days,
        settings: CycleSettings::default(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn cycle_advances_by_instructional_days(
        start in 0i64..330,
        span in 0i64..120,
        start_day in 1u32..=6,
        holidays in proptest::collection::vec(0i64..460, 0..24),
    ) {
        let base = d(2025, 7, 1);
        let days = closures(base, &holidays);
        let ctx = context(&days);
        let config = CycleConfig { start_day, ..CycleConfig::default() };

        let d1 = base + Duration::days(start);
        let d2 = d1 + Duration::days(span);
        prop_assume!(calendar::is_instructional_day(d1, &days));
        prop_assume!(calendar::is_instructional_day(d2, &days));

        let first = config.cycle_day_for_date(d1, &ctx).unwrap();
        let second = config.cycle_day_for_date(d2, &ctx).unwrap();
        let elapsed = calendar::instructional_days_between(d1, d2, &days) - 1;
        let expected = (i64::from(first.get()) - 1 + elapsed).rem_euclid(6) + 1;
        prop_assert_eq!(i64::from(second.get()), expected);
    }

    #[test]
    fn recompute_fills_six_instructional_days(
        start_day in 1u32..=6,
        holidays in proptest::collection::vec(0i64..40, 0..15),
    ) {
        let days = closures(d(2025, 8, 1), &holidays);
        let ctx = context(&days);
        let mut config = CycleConfig { start_day, ..CycleConfig::default() };

        let window = config.recompute_cycle_dates(&ctx).unwrap().clone();
        prop_assert_eq!(window.len(), 6);
        for (day, date) in &window {
            prop_assert!(calendar::is_instructional_day(*date, &days), "Day {} on {}", day, date);
        }
        let dates: Vec<NaiveDate> = window.values().copied().collect();
        prop_assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(window[&cd(1)], config.anchor_date(&ctx).unwrap());
    }

    #[test]
    fn recompute_is_idempotent(
        start_day in 1u32..=6,
        holidays in proptest::collection::vec(0i64..40, 0..15),
    ) {
        let days = closures(d(2025, 8, 1), &holidays);
        let ctx = context(&days);
        let mut config = CycleConfig { start_day, ..CycleConfig::default() };

        let first = config.recompute_cycle_dates(&ctx).unwrap().clone();
        let second = config.recompute_cycle_dates(&ctx).unwrap().clone();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn default_year_window_starts_on_first_august_weekday() {
    let planner = Planner::new(PlannerSettings::default()).unwrap();
    let window = planner.cycle_dates().unwrap();

    // 2025-08-01 is a Friday
    assert_eq!(window[&cd(1)], d(2025, 8, 1));
    assert_eq!(window[&cd(2)], d(2025, 8, 4));
    assert_eq!(window[&cd(6)], d(2025, 8, 8));
}

#[test]
fn closing_a_window_date_pushes_later_days_back() {
    let mut planner = Planner::new(PlannerSettings::default()).unwrap();
    let day3 = planner.cycle_dates().unwrap()[&cd(3)];
    assert_eq!(day3, d(2025, 8, 5));

    planner.add_non_instructional_day(day3, "Flooding").unwrap();
    let window = planner.recompute_cycle_dates().unwrap();

    assert!(window[&cd(3)] > day3);
    assert_eq!(window[&cd(3)], d(2025, 8, 6));
    assert_eq!(window[&cd(1)], d(2025, 8, 1));
    assert_eq!(window[&cd(2)], d(2025, 8, 4));
    assert_eq!(window[&cd(6)], d(2025, 8, 11));
}

#[test]
fn closures_do_not_shift_the_cycle() {
    let mut planner = Planner::new(PlannerSettings::default()).unwrap();
    let before = planner.cycle_day_for_date(d(2025, 8, 12)).unwrap();
    planner.add_non_instructional_day(d(2025, 8, 6), "Staff day").unwrap();

    // one fewer instructional day in between
    let after = planner.cycle_day_for_date(d(2025, 8, 12)).unwrap();
    assert_eq!(i64::from(after.get()), (i64::from(before.get()) - 2).rem_euclid(6) + 1);
    // the closed day itself reports the day before it
    assert_eq!(
        planner.cycle_day_for_date(d(2025, 8, 6)).unwrap(),
        planner.cycle_day_for_date(d(2025, 8, 5)).unwrap()
    );
}

#[test]
fn month_anchor_overrides_only_reached_slots() {
    let mut planner = Planner::new(PlannerSettings::default()).unwrap();
    // September is index 8; 2025-09-01 is a Monday
    let preview = planner.preview_month_cycle(8, cd(4)).unwrap();
    assert_eq!(preview[&cd(4)], d(2025, 9, 1));
    assert_eq!(preview[&cd(2)], d(2025, 9, 5));
    assert_eq!(preview[&cd(3)], d(2025, 9, 8));
    assert_eq!(planner.cycle_dates().unwrap()[&cd(1)], d(2025, 8, 1));

    let window = planner.set_month_first_cycle_day(8, cd(4)).unwrap();
    assert!(window.values().all(|date| *date >= d(2025, 9, 1)));
    assert_eq!(
        planner.cycle_config().unwrap().month_first_cycle_day.get(&8),
        Some(&cd(4))
    );

    let rebuilt = planner.recompute_cycle_dates().unwrap();
    assert_eq!(rebuilt[&cd(1)], d(2025, 8, 1));
}

#[test]
fn unplaceable_window_leaves_previous_dates() {
    let settings = PlannerSettings {
        cycle: CycleSettings {
            anchor_month: 8,
            scan_window_days: 9,
        },
        ..PlannerSettings::default()
    };
    let mut planner = Planner::new(settings).unwrap();
    let before = planner.cycle_dates().unwrap().clone();

    // Aug 1-9 holds exactly six weekdays; losing one leaves five
    let err = planner
        .add_non_instructional_day(d(2025, 8, 7), "Storm")
        .unwrap_err();
    assert!(matches!(err, PlannerError::Configuration(_)));
    assert_eq!(planner.cycle_dates().unwrap(), &before);
    assert!(planner.is_instructional_day(d(2025, 8, 7)).unwrap());
}
