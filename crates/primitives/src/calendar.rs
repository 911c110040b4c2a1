//! Calendar and rounding helpers.

use chrono::{Datelike, Duration, Weekday};

use crate::Date;

/// Friday of the Monday-based week containing `date`.
///
/// Weekend dates map back to the Friday just before them.
#[must_use]
pub fn friday_of_week(date: Date) -> Date {
    let offset = 4 - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(offset)
}

/// Whether `date` falls Monday through Friday.
#[must_use]
pub fn is_weekday(date: Date) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}
