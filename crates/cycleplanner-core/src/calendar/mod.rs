//! Calendar utilities: school years, weekends and non-instructional days.
//!
//! Everything downstream (the cycle engine, the schedule registry) only
//! consumes *instructional* days: dates that are neither a Saturday/Sunday
//! nor flagged in the school year's non-instructional set.

pub mod non_instructional;
pub mod school_year;

pub use non_instructional::{NonInstructionalCalendar, NonInstructionalDay};
pub use school_year::SchoolYear;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// True iff the date falls on a Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True iff the date is flagged in the given non-instructional set.
pub fn is_non_instructional(date: NaiveDate, days: &NonInstructionalCalendar) -> bool {
    days.contains(date)
}

/// A date that is neither a weekend nor flagged non-instructional.
pub fn is_instructional_day(date: NaiveDate, days: &NonInstructionalCalendar) -> bool {
    !is_weekend(date) && !is_non_instructional(date, days)
}

/// Number of Monday-Friday dates in the closed range `[from, to]`.
///
/// Returns 0 when `to < from`.
pub fn weekdays_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return 0;
    }
    let total = (to - from).num_days() + 1;
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;
    let tail_start = from + Duration::days(full_weeks * 7);
    for offset in 0..(total % 7) {
        if !is_weekend(tail_start + Duration::days(offset)) {
            count += 1;
        }
    }
    count
}

/// Number of instructional days in the closed range `[from, to]`.
///
/// Weekdays are counted in closed form; flagged dates are then subtracted
/// through a range lookup on the set, so the cost does not grow with the
/// width of the range.
pub fn instructional_days_between(
    from: NaiveDate,
    to: NaiveDate,
    days: &NonInstructionalCalendar,
) -> i64 {
    if to < from {
        return 0;
    }
    let flagged = days
        .dates_in_range(from, to)
        .filter(|d| !is_weekend(*d))
        .count() as i64;
    weekdays_between(from, to) - flagged
}

/// First instructional day at or after `from`, scanning at most `limit` days.
pub fn next_instructional_day(
    from: NaiveDate,
    days: &NonInstructionalCalendar,
    limit: i64,
) -> Option<NaiveDate> {
    (0..limit)
        .map(|offset| from + Duration::days(offset))
        .find(|d| is_instructional_day(*d, days))
}

/// Last instructional day at or before `from`, scanning at most `limit` days.
pub fn previous_instructional_day(
    from: NaiveDate,
    days: &NonInstructionalCalendar,
    limit: i64,
) -> Option<NaiveDate> {
    (0..limit)
        .map(|offset| from - Duration::days(offset))
        .find(|d| is_instructional_day(*d, days))
}

/// Last calendar day of the given month (1-based month).
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}
