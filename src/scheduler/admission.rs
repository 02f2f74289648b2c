use chrono::{Duration, NaiveDate};

use crate::calendar::CalendarError;
use crate::limits::MAX_PERIOD_DAYS;
use crate::model::DateRange;

use super::ScheduleError;

pub(crate) fn validate_range(range: &DateRange) -> Result<(), ScheduleError> {
    if range.len_days() > MAX_PERIOD_DAYS {
        return Err(ScheduleError::LimitExceeded("period too long"));
    }
    Ok(())
}

/// A bulk creation may only target a period that has not started yet.
pub fn check_admissible(range: DateRange, today: NaiveDate) -> Result<(), ScheduleError> {
    if range.to < today {
        return Err(ScheduleError::PeriodInPast { range, today });
    }
    if range.from <= today {
        return Err(ScheduleError::PeriodInProgress { range, today });
    }
    Ok(())
}

/// A range the operator still has to confirm. `defaulted` is set when the end
/// date was filled in from the default horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeProposal {
    pub range: DateRange,
    pub defaulted: bool,
}

pub fn propose_range(
    start: NaiveDate,
    end: Option<NaiveDate>,
    horizon_days: i64,
) -> Result<RangeProposal, ScheduleError> {
    let (to, defaulted) = match end {
        Some(to) => (to, false),
        None => {
            let to = start
                .checked_add_signed(Duration::days(horizon_days))
                .ok_or(CalendarError::DateOutOfRange(start))?;
            (to, true)
        }
    };
    let range = DateRange::new(start, to).ok_or(ScheduleError::InvalidRange { from: start, to })?;
    validate_range(&range)?;
    Ok(RangeProposal { range, defaulted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::DEFAULT_HORIZON_DAYS;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range(from: NaiveDate, to: NaiveDate) -> DateRange {
        DateRange::new(from, to).unwrap()
    }

    #[test]
    fn in_progress_when_today_inside() {
        let r = range(d(2025, 1, 1), d(2025, 1, 31));
        let today = d(2025, 1, 15);
        assert_eq!(
            check_admissible(r, today),
            Err(ScheduleError::PeriodInProgress { range: r, today })
        );
    }

    #[test]
    fn boundaries_count_as_in_progress() {
        let r = range(d(2025, 1, 1), d(2025, 1, 31));
        assert!(matches!(check_admissible(r, d(2025, 1, 1)), Err(ScheduleError::PeriodInProgress { .. })));
        assert!(matches!(check_admissible(r, d(2025, 1, 31)), Err(ScheduleError::PeriodInProgress { .. })));
    }

    #[test]
    fn past_when_ended_before_today() {
        let r = range(d(2025, 1, 1), d(2025, 1, 31));
        assert!(matches!(check_admissible(r, d(2025, 2, 1)), Err(ScheduleError::PeriodInPast { .. })));
    }

    #[test]
    fn future_is_admissible() {
        let r = range(d(2025, 1, 1), d(2025, 1, 31));
        assert_eq!(check_admissible(r, d(2024, 12, 31)), Ok(()));
    }

    #[test]
    fn admissibility_exhaustive_around_range() {
        let r = range(d(2025, 3, 10), d(2025, 3, 16));
        for offset in -20..20 {
            let today = d(2025, 3, 10) + Duration::days(offset);
            let result = check_admissible(r, today);
            if today < r.from {
                assert_eq!(result, Ok(()));
            } else if today <= r.to {
                assert!(matches!(result, Err(ScheduleError::PeriodInProgress { .. })));
            } else {
                assert!(matches!(result, Err(ScheduleError::PeriodInPast { .. })));
            }
        }
    }

    #[test]
    fn missing_end_defaults_to_horizon() {
        let p = propose_range(d(2025, 1, 1), None, DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(p.range.to, d(2025, 1, 31));
        assert!(p.defaulted);
    }

    #[test]
    fn explicit_end_is_kept() {
        let p = propose_range(d(2025, 1, 1), Some(d(2025, 1, 7)), DEFAULT_HORIZON_DAYS).unwrap();
        assert_eq!(p.range.to, d(2025, 1, 7));
        assert!(!p.defaulted);
    }

    #[test]
    fn inverted_or_huge_range_rejected() {
        assert_eq!(
            propose_range(d(2025, 1, 7), Some(d(2025, 1, 1)), 30),
            Err(ScheduleError::InvalidRange { from: d(2025, 1, 7), to: d(2025, 1, 1) })
        );
        assert!(matches!(
            propose_range(d(2025, 1, 1), Some(d(2027, 1, 1)), 30),
            Err(ScheduleError::LimitExceeded(_))
        ));
    }

    #[test]
    fn horizon_past_calendar_end_is_an_error() {
        let start = NaiveDate::MAX - Duration::days(3);
        assert_eq!(
            propose_range(start, None, DEFAULT_HORIZON_DAYS),
            Err(ScheduleError::Calendar(CalendarError::DateOutOfRange(start)))
        );
    }
}
