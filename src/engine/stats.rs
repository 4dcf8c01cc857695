use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};

/// Per-type yearly summary. Spans count both endpoints, so a single-day
/// request contributes one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveTypeStats {
    pub total_days: i64,
    pub approved_days: i64,
    pub pending_days: i64,
    pub count: i64,
}

#[derive(Default)]
struct Group {
    span_days: i64,
    approved_span_days: i64,
    count: i64,
    approved_count: i64,
    pending_count: i64,
}

/// Groups a year's requests by type and derives the day counts. Pending
/// days use the ceiled average span across all of the type's requests
/// rather than the actual pending spans, so they drift when pending
/// requests have unequal lengths.
pub fn compute_year_stats(requests: &[LeaveRequest]) -> HashMap<LeaveType, LeaveTypeStats> {
    let mut groups: HashMap<LeaveType, Group> = HashMap::new();
    for request in requests {
        let group = groups.entry(request.leave_type).or_default();
        let span = request.span_days();
        group.span_days += span;
        group.count += 1;
        match request.status {
            LeaveStatus::Approved => {
                group.approved_span_days += span;
                group.approved_count += 1;
            }
            LeaveStatus::Pending => group.pending_count += 1,
            LeaveStatus::Rejected | LeaveStatus::Cancelled => {}
        }
    }
    groups
        .into_iter()
        .map(|(leave_type, group)| {
            let pending_days = if group.pending_count > 0 {
                let average = (group.span_days as f64 / group.count as f64).ceil() as i64;
                average * group.pending_count + group.pending_count
            } else {
                0
            };
            let stats = LeaveTypeStats {
                total_days: group.span_days + group.count,
                approved_days: group.approved_span_days + group.approved_count,
                pending_days,
                count: group.count,
            };
            (leave_type, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;

    fn request(
        leave_type: LeaveType,
        status: LeaveStatus,
        start: (u32, u32),
        end: (u32, u32),
    ) -> LeaveRequest {
        LeaveRequest {
            id: 0,
            employee_id: 1,
            leave_type,
            start_date: NaiveDate::from_ymd_opt(2025, start.0, start.1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, end.0, end.1).unwrap(),
            reason: String::new(),
            status,
            reviewed_by: None,
            reviewed_at: None,
            attachments: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn single_approved_request_counts_inclusive_days() {
        let requests = [request(
            LeaveType::Vacation,
            LeaveStatus::Approved,
            (6, 1),
            (6, 3),
        )];
        let stats = compute_year_stats(&requests);
        let vacation = &stats[&LeaveType::Vacation];
        assert_eq!(vacation.total_days, 3);
        assert_eq!(vacation.approved_days, 3);
        assert_eq!(vacation.pending_days, 0);
        assert_eq!(vacation.count, 1);
    }

    #[test]
    fn types_are_grouped_independently() {
        let requests = [
            request(LeaveType::Vacation, LeaveStatus::Approved, (6, 1), (6, 3)),
            request(LeaveType::Sick, LeaveStatus::Pending, (7, 10), (7, 10)),
        ];
        let stats = compute_year_stats(&requests);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[&LeaveType::Vacation].total_days, 3);
        let sick = &stats[&LeaveType::Sick];
        assert_eq!(sick.total_days, 1);
        assert_eq!(sick.approved_days, 0);
        assert_eq!(sick.pending_days, 1);
    }

    #[test]
    fn pending_days_come_from_the_average_span() {
        // Spans of 1 and 4 days by subtraction: the true inclusive pending
        // total is 7, the averaged figure is 8.
        let requests = [
            request(LeaveType::Personal, LeaveStatus::Pending, (3, 1), (3, 2)),
            request(LeaveType::Personal, LeaveStatus::Pending, (4, 1), (4, 5)),
        ];
        let stats = compute_year_stats(&requests);
        let personal = &stats[&LeaveType::Personal];
        assert_eq!(personal.total_days, 7);
        assert_eq!(personal.pending_days, 8);
        assert_eq!(personal.approved_days, 0);
        assert_eq!(personal.count, 2);
    }

    #[test]
    fn rejected_and_cancelled_count_toward_totals_only() {
        let requests = [
            request(LeaveType::Vacation, LeaveStatus::Approved, (6, 1), (6, 3)),
            request(LeaveType::Vacation, LeaveStatus::Rejected, (8, 1), (8, 2)),
            request(LeaveType::Vacation, LeaveStatus::Cancelled, (9, 1), (9, 1)),
        ];
        let stats = compute_year_stats(&requests);
        let vacation = &stats[&LeaveType::Vacation];
        assert_eq!(vacation.count, 3);
        assert_eq!(vacation.total_days, 6);
        assert_eq!(vacation.approved_days, 3);
        assert_eq!(vacation.pending_days, 0);
    }

    #[test]
    fn no_requests_means_no_entries() {
        assert!(compute_year_stats(&[]).is_empty());
    }
}
