//! Utility functions for the matchmaking service

use crate::types::Day;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

/// Generate a new unique record ID
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Combine a calendar date and a wall-clock time into a UTC timestamp
pub fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

/// Next timestamp strictly after `after` that falls on `day` at `time`
pub fn next_occurrence(day: Day, time: NaiveTime, after: DateTime<Utc>) -> DateTime<Utc> {
    let today = after.date_naive();
    let today_index = Day::from(today.weekday()).index();
    let days_ahead = (day.index() + 7 - today_index) % 7;

    let candidate = at_time(today + Duration::days(days_ahead as i64), time);
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}
