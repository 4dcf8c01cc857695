use chrono::{DateTime, Utc};
use strum_macros::Display;

use crate::engine::error::EngineError;
use crate::model::attendance::Interval;

/// Which interval sequence of the day record is being toggled. Break and
/// namaz sequences carry the same single-open invariant but independently:
/// one of each may be running at the same time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IntervalKind {
    Break,
    Namaz,
}

/// True iff the sequence ends in a still-running interval.
pub fn is_open(intervals: &[Interval]) -> bool {
    intervals.last().is_some_and(Interval::is_open)
}

/// Append a new open interval starting now. Refuses while any interval in
/// the sequence is still running.
pub fn open(
    intervals: &[Interval],
    now: DateTime<Utc>,
    kind: IntervalKind,
) -> Result<Vec<Interval>, EngineError> {
    if intervals.iter().any(Interval::is_open) {
        return Err(EngineError::IntervalAlreadyOpen { kind });
    }

    let mut next = intervals.to_vec();
    next.push(Interval {
        start: now,
        end: None,
    });
    Ok(next)
}

/// Close the single running interval (the last element with an absent end)
/// and report the minutes it spanned.
pub fn close(
    intervals: &[Interval],
    now: DateTime<Utc>,
    kind: IntervalKind,
) -> Result<(Vec<Interval>, f64), EngineError> {
    let idx = intervals
        .iter()
        .rposition(Interval::is_open)
        .ok_or(EngineError::NoOpenInterval { kind })?;

    let mut next = intervals.to_vec();
    next[idx].end = Some(now);

    let minutes = (now - next[idx].start).num_milliseconds() as f64 / 60_000.0;
    Ok((next, minutes))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap()
    }

    #[test]
    fn opening_appends_a_running_interval() {
        let seq = open(&[], at(12, 0), IntervalKind::Break).unwrap();
        assert_eq!(seq.len(), 1);
        assert!(seq[0].is_open());
        assert!(is_open(&seq));
    }

    #[test]
    fn opening_twice_is_rejected() {
        let seq = open(&[], at(12, 0), IntervalKind::Break).unwrap();
        let err = open(&seq, at(12, 5), IntervalKind::Break).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IntervalAlreadyOpen {
                kind: IntervalKind::Break
            }
        ));
    }

    #[test]
    fn closing_reports_elapsed_minutes() {
        let seq = open(&[], at(12, 0), IntervalKind::Break).unwrap();
        let (seq, minutes) = close(&seq, at(12, 15), IntervalKind::Break).unwrap();
        assert_eq!(minutes, 15.0);
        assert_eq!(seq[0].end, Some(at(12, 15)));
        assert!(!is_open(&seq));
    }

    #[test]
    fn closing_without_an_open_interval_is_rejected() {
        let err = close(&[], at(12, 0), IntervalKind::Namaz).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NoOpenInterval {
                kind: IntervalKind::Namaz
            }
        ));
    }

    #[test]
    fn earlier_closed_intervals_are_preserved() {
        let seq = open(&[], at(10, 0), IntervalKind::Break).unwrap();
        let (seq, _) = close(&seq, at(10, 10), IntervalKind::Break).unwrap();
        let seq = open(&seq, at(15, 0), IntervalKind::Break).unwrap();
        let (seq, minutes) = close(&seq, at(15, 30), IntervalKind::Break).unwrap();

        assert_eq!(seq.len(), 2);
        assert_eq!(minutes, 30.0);
        assert_eq!(seq[0].end, Some(at(10, 10)));
        assert_eq!(seq[1].end, Some(at(15, 30)));
    }

    #[test]
    fn sub_minute_spans_come_back_fractional() {
        let seq = open(&[], at(12, 0), IntervalKind::Namaz).unwrap();
        let closed_at = at(12, 0) + Duration::seconds(90);
        let (_, minutes) = close(&seq, closed_at, IntervalKind::Namaz).unwrap();
        assert!((minutes - 1.5).abs() < 1e-9);
    }
}
