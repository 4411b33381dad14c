//! Pure checks for availability windows

use crate::error::{MeshwellError, Result};
use crate::types::{Availability, AvailabilityId, Day};
use chrono::NaiveTime;

/// Reject windows that do not start strictly before they end
pub fn validate_window(start: NaiveTime, end: NaiveTime) -> Result<()> {
    if start >= end {
        return Err(MeshwellError::validation("You cannot start after/when you finish!").into());
    }
    Ok(())
}

/// Whether window `start..=end` collides with `existing_start..=existing_end`
///
/// Both ranges are closed, so windows that only touch at an endpoint still
/// collide.
pub fn windows_overlap(
    start: NaiveTime,
    end: NaiveTime,
    existing_start: NaiveTime,
    existing_end: NaiveTime,
) -> bool {
    let start_inside = existing_start <= start && start <= existing_end;
    let end_inside = existing_start <= end && end <= existing_end;
    let contains = start <= existing_start && existing_end <= end;
    start_inside || end_inside || contains
}

/// First stored window on `day` that the proposed window collides with
///
/// `exclude` skips the window being edited.
pub fn find_overlap<'a>(
    existing: &'a [Availability],
    day: Day,
    start: NaiveTime,
    end: NaiveTime,
    exclude: Option<AvailabilityId>,
) -> Option<&'a Availability> {
    existing.iter().find(|window| {
        window.day == day
            && Some(window.id) != exclude
            && windows_overlap(start, end, window.start_time, window.end_time)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generate_id;
    use proptest::prelude::*;

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn window(day: Day, start: NaiveTime, end: NaiveTime) -> Availability {
        Availability {
            id: generate_id(),
            profile_id: generate_id(),
            day,
            start_time: start,
            end_time: end,
            competitive: false,
        }
    }

    #[test]
    fn test_window_must_start_before_end() {
        assert!(validate_window(hm(10, 0), hm(9, 0)).is_err());
        assert!(validate_window(hm(9, 0), hm(9, 0)).is_err());
        assert!(validate_window(hm(9, 0), hm(10, 0)).is_ok());
    }

    #[test]
    fn test_overlap_conditions() {
        let (es, ee) = (hm(18, 0), hm(20, 0));
        // start inside
        assert!(windows_overlap(hm(19, 0), hm(21, 0), es, ee));
        // end inside
        assert!(windows_overlap(hm(17, 0), hm(19, 0), es, ee));
        // containment
        assert!(windows_overlap(hm(17, 0), hm(21, 0), es, ee));
        // touching endpoints
        assert!(windows_overlap(hm(20, 0), hm(22, 0), es, ee));
        assert!(windows_overlap(hm(16, 0), hm(18, 0), es, ee));
        // disjoint
        assert!(!windows_overlap(hm(20, 1), hm(22, 0), es, ee));
        assert!(!windows_overlap(hm(9, 0), hm(10, 0), es, ee));
    }

    #[test]
    fn test_find_overlap_respects_day_and_exclusion() {
        let existing = vec![window(Day::Friday, hm(18, 0), hm(20, 0))];

        assert!(find_overlap(&existing, Day::Saturday, hm(18, 0), hm(20, 0), None).is_none());
        assert!(find_overlap(&existing, Day::Friday, hm(19, 0), hm(21, 0), None).is_some());
        assert!(
            find_overlap(&existing, Day::Friday, hm(19, 0), hm(21, 0), Some(existing[0].id))
                .is_none()
        );
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            a in 0u32..1438, a_len in 1u32..600,
            b in 0u32..1438, b_len in 1u32..600,
        ) {
            let a_end = (a + a_len).min(1439);
            let b_end = (b + b_len).min(1439);
            let t = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();

            prop_assert_eq!(
                windows_overlap(t(a), t(a_end), t(b), t(b_end)),
                windows_overlap(t(b), t(b_end), t(a), t(a_end))
            );
        }

        #[test]
        fn prop_overlap_matches_interval_intersection(
            a in 0u32..1438, a_len in 1u32..600,
            b in 0u32..1438, b_len in 1u32..600,
        ) {
            let a_end = (a + a_len).min(1439);
            let b_end = (b + b_len).min(1439);
            let t = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();

            let intersects = a <= b_end && b <= a_end;
            prop_assert_eq!(windows_overlap(t(a), t(a_end), t(b), t(b_end)), intersects);
        }
    }
}
