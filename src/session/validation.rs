//! Pure timing checks for sessions

use crate::error::{MeshwellError, Result};
use crate::types::{Availability, Day, GameId, Session};
use crate::utils::at_time;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A session a host wants to schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub game_id: GameId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub competitive: bool,
}

/// Check a requested schedule and return its start and end timestamps
///
/// The session must start strictly after `now`, start before it ends on the
/// same day, and last at least `min_length`.
pub fn validate_schedule(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    now: DateTime<Utc>,
    min_length: Duration,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = at_time(date, start_time);
    let end = at_time(date, end_time);

    if start <= now {
        return Err(MeshwellError::validation("Oops, that day has already passed!").into());
    }
    if start_time >= end_time {
        return Err(MeshwellError::validation("Start time cannot be after End time!").into());
    }
    if end - start < min_length {
        return Err(MeshwellError::validation(format!(
            "Session must last at least {} minutes",
            min_length.num_minutes()
        ))
        .into());
    }

    Ok((start, end))
}

/// Whether `session` falls entirely inside `window` on the window's weekday
/// and matches its competitive flag
pub fn session_fits_window(session: &Session, window: &Availability) -> bool {
    let start_day = session.start.date_naive();
    if session.end_time.date_naive() != start_day {
        return false;
    }

    Day::from(start_day.weekday()) == window.day
        && session.competitive == window.competitive
        && window.start_time <= session.start.time()
        && session.end_time.time() <= window.end_time
}

/// Whether a window is long enough to host a session
pub fn window_fits_session(window: &Availability, min_length: Duration) -> bool {
    window.end_time - window.start_time >= min_length
}
