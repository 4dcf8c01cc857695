use chrono::NaiveDate;

use crate::model::leave_request::LeaveRequest;

/// Two inclusive date spans `[a_start, a_end]` and `[b_start, b_end]`
/// overlap iff `a_start <= b_end && b_start <= a_end`. Sharing a single
/// day counts as overlap.
pub fn spans_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// First existing request whose span conflicts with the candidate span,
/// skipping `exclude_id` (the request being edited). The caller supplies
/// only requests that block scheduling (pending or approved, same employee).
pub fn first_conflict<'a>(
    start: NaiveDate,
    end: NaiveDate,
    existing: &'a [LeaveRequest],
    exclude_id: Option<u64>,
) -> Option<&'a LeaveRequest> {
    existing
        .iter()
        .filter(|req| Some(req.id) != exclude_id)
        .find(|req| spans_overlap(start, end, req.start_date, req.end_date))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::leave_request::{LeaveStatus, LeaveType};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(id: u64, start: NaiveDate, end: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 1,
            leave_type: LeaveType::Vacation,
            start_date: start,
            end_date: end,
            reason: "trip".into(),
            status: LeaveStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            attachments: vec![],
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn detects_partial_overlap_from_either_side() {
        // existing starts inside the candidate
        assert!(spans_overlap(
            day(2025, 6, 1),
            day(2025, 6, 5),
            day(2025, 6, 4),
            day(2025, 6, 6),
        ));
        // existing ends inside the candidate
        assert!(spans_overlap(
            day(2025, 6, 4),
            day(2025, 6, 6),
            day(2025, 6, 1),
            day(2025, 6, 5),
        ));
    }

    #[test]
    fn detects_containment_both_directions() {
        assert!(spans_overlap(
            day(2025, 6, 2),
            day(2025, 6, 3),
            day(2025, 6, 1),
            day(2025, 6, 5),
        ));
        assert!(spans_overlap(
            day(2025, 6, 1),
            day(2025, 6, 5),
            day(2025, 6, 2),
            day(2025, 6, 3),
        ));
    }

    #[test]
    fn shared_boundary_day_is_an_overlap() {
        assert!(spans_overlap(
            day(2025, 6, 1),
            day(2025, 6, 5),
            day(2025, 6, 5),
            day(2025, 6, 8),
        ));
    }

    #[test]
    fn disjoint_spans_do_not_overlap() {
        assert!(!spans_overlap(
            day(2025, 6, 1),
            day(2025, 6, 5),
            day(2025, 6, 6),
            day(2025, 6, 8),
        ));
    }

    #[test]
    fn first_conflict_returns_the_first_match() {
        let existing = vec![
            request(1, day(2025, 1, 1), day(2025, 1, 3)),
            request(2, day(2025, 6, 1), day(2025, 6, 5)),
            request(3, day(2025, 6, 4), day(2025, 6, 7)),
        ];
        let hit = first_conflict(day(2025, 6, 4), day(2025, 6, 6), &existing, None).unwrap();
        assert_eq!(hit.id, 2);
    }

    #[test]
    fn first_conflict_skips_the_excluded_request() {
        let existing = vec![request(2, day(2025, 6, 1), day(2025, 6, 5))];
        assert!(first_conflict(day(2025, 6, 2), day(2025, 6, 4), &existing, Some(2)).is_none());
        assert!(first_conflict(day(2025, 6, 2), day(2025, 6, 4), &existing, Some(9)).is_some());
    }
}
