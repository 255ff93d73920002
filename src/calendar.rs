//! Calendar arithmetic for recurring tasks.
//!
//! Two distinct operations live here and are intentionally not unified:
//!
//! - [`add_interval`] steps by a fixed number of days. Monthly (30 days) and yearly
//!   (365 days) are approximations; yearly recurrence drifts across leap years.
//! - [`adjust_for_month_boundary`] is the calendar-accurate "same day next month"
//!   step, clamping to the last day of shorter months. Monthly recurrence always
//!   uses this one.
//!
//! Both are total: results saturate at the end of chrono's representable range.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::fields::Recurrence;

/// Add one unit of `interval` to `instant` using fixed-length steps.
pub fn add_interval(instant: NaiveDateTime, interval: Recurrence) -> NaiveDateTime {
    let step = match interval {
        Recurrence::Daily => Duration::days(1),
        Recurrence::Weekly => Duration::weeks(1),
        Recurrence::Monthly => Duration::days(30),
        Recurrence::Yearly => Duration::days(365),
    };
    instant.checked_add_signed(step).unwrap_or(NaiveDateTime::MAX)
}

/// Same day and time in the following month.
///
/// December rolls over to January of the next year. Days that do not exist in
/// the target month are clamped to its last day (Jan 31 → Feb 28 or Feb 29).
pub fn adjust_for_month_boundary(instant: NaiveDateTime) -> NaiveDateTime {
    let (year, month) = if instant.month() == 12 {
        (instant.year() + 1, 1)
    } else {
        (instant.year(), instant.month() + 1)
    };
    let day = instant.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(instant.time()))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Gregorian leap year: divisible by 4, except centuries not divisible by 400.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}
