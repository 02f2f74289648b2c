//! Calendar range arithmetic. Everything here is pure and timezone-naive:
//! weeks run Monday through Sunday and dates carry no time component.

use std::iter::FusedIterator;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::limits::{MAX_YEAR, MIN_YEAR};
use crate::model::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("year {0} out of range")]
    YearOutOfRange(i32),
    #[error("month {0} out of range")]
    InvalidMonth(u32),
    #[error("week {week} out of range for {year}-{month:02} ({count} weeks)")]
    WeekOutOfRange {
        year: i32,
        month: u32,
        week: u32,
        count: u32,
    },
    #[error("week containing {0} falls outside the supported calendar")]
    DateOutOfRange(NaiveDate),
}

/// The Monday-to-Sunday week containing `date`.
pub fn week_range(date: NaiveDate) -> Result<DateRange, CalendarError> {
    let back = date.weekday().num_days_from_monday() as i64;
    let from = date.checked_sub_signed(Duration::days(back));
    let to = from.and_then(|monday| monday.checked_add_signed(Duration::days(6)));
    match (from, to) {
        (Some(from), Some(to)) => Ok(DateRange { from, to }),
        _ => Err(CalendarError::DateOutOfRange(date)),
    }
}

/// First through last day of the month.
pub fn month_range(year: i32, month: u32) -> Result<DateRange, CalendarError> {
    check_year_month(year, month)?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::YearOutOfRange(year))?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .ok_or(CalendarError::YearOutOfRange(year))?;
    Ok(DateRange { from: first, to: last })
}

/// Position of the 1st inside its Monday-anchored week (Monday = 0, Sunday = 6).
pub fn first_weekday_offset(year: i32, month: u32) -> Result<u32, CalendarError> {
    let month = month_range(year, month)?;
    Ok(month.from.weekday().num_days_from_monday())
}

/// Number of Monday-anchored weeks touching the month:
/// `ceil((first_weekday_offset + days_in_month) / 7)`.
pub fn week_count_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    let range = month_range(year, month)?;
    let offset = range.from.weekday().num_days_from_monday();
    let days = range.len_days() as u32;
    Ok((offset + days).div_ceil(7))
}

/// The `week_index`-th week (1-based) of the month, anchored on the Monday
/// on or before the 1st. The returned range may spill into adjacent months.
pub fn week_range_in_month(year: i32, month: u32, week_index: u32) -> Result<DateRange, CalendarError> {
    let count = week_count_in_month(year, month)?;
    if week_index == 0 || week_index > count {
        return Err(CalendarError::WeekOutOfRange {
            year,
            month,
            week: week_index,
            count,
        });
    }
    let anchor = week_range(month_range(year, month)?.from)?.from;
    let from = anchor + Duration::days((week_index as i64 - 1) * 7);
    Ok(DateRange {
        from,
        to: from + Duration::days(6),
    })
}

/// 1-based index of the week of its own month that contains `date`.
pub fn week_index_in_month(date: NaiveDate) -> u32 {
    let offset = date.with_day(1).unwrap_or(date).weekday().num_days_from_monday();
    (offset + date.day() - 1) / 7 + 1
}

/// Week starts (Mondays) for every week touching `year`, Jan 1 through Dec 31.
pub fn weeks_of_year(year: i32) -> Result<YearWeeks, CalendarError> {
    let jan = month_range(year, 1)?;
    let dec = month_range(year, 12)?;
    Ok(YearWeeks {
        first: week_range(jan.from)?.from,
        last_day: dec.to,
    })
}

/// Restartable description of a year's weeks. Iterating never consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWeeks {
    first: NaiveDate,
    last_day: NaiveDate,
}

impl YearWeeks {
    pub fn iter(&self) -> WeekStarts {
        WeekStarts {
            next: self.first,
            last_day: self.last_day,
        }
    }

    /// Full Monday-to-Sunday ranges instead of bare week starts.
    pub fn ranges(&self) -> impl Iterator<Item = DateRange> + use<> {
        self.iter().filter_map(|start| week_range(start).ok())
    }

    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IntoIterator for YearWeeks {
    type Item = NaiveDate;
    type IntoIter = WeekStarts;

    fn into_iter(self) -> WeekStarts {
        self.iter()
    }
}

impl IntoIterator for &YearWeeks {
    type Item = NaiveDate;
    type IntoIter = WeekStarts;

    fn into_iter(self) -> WeekStarts {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct WeekStarts {
    next: NaiveDate,
    last_day: NaiveDate,
}

impl Iterator for WeekStarts {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.next > self.last_day {
            return None;
        }
        let current = self.next;
        self.next = current + Duration::days(7);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.last_day {
            0
        } else {
            ((self.last_day - self.next).num_days() / 7 + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WeekStarts {}
impl FusedIterator for WeekStarts {}

/// What the operator picked as the target of a bulk creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "camelCase")]
pub enum TargetPeriod {
    /// The week containing the given date.
    Week { containing: NaiveDate },
    /// A numbered week of a month, as shown in the week picker.
    WeekOfMonth { year: i32, month: u32, week: u32 },
    Month { year: i32, month: u32 },
}

impl TargetPeriod {
    pub fn resolve(&self) -> Result<DateRange, CalendarError> {
        match *self {
            TargetPeriod::Week { containing } => week_range(containing),
            TargetPeriod::WeekOfMonth { year, month, week } => week_range_in_month(year, month, week),
            TargetPeriod::Month { year, month } => month_range(year, month),
        }
    }
}

fn check_year_month(year: i32, month: u32) -> Result<(), CalendarError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(CalendarError::YearOutOfRange(year));
    }
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn is_monday(date: NaiveDate) -> bool {
        date.weekday() == chrono::Weekday::Mon
    }

    #[test]
    fn week_range_monday_anchored_and_contains_date() {
        let start = d(2023, 12, 1);
        for i in 0..800 {
            let date = start + Duration::days(i);
            let w = week_range(date).unwrap();
            assert!(is_monday(w.from), "{date}: {} is not a Monday", w.from);
            assert_eq!(w.len_days(), 7);
            assert!(w.contains(date));
        }
    }

    #[test]
    fn week_range_sunday_belongs_to_previous_monday() {
        // 2025-03-09 is a Sunday
        let w = week_range(d(2025, 3, 9)).unwrap();
        assert_eq!(w.from, d(2025, 3, 3));
        assert_eq!(w.to, d(2025, 3, 9));
    }

    #[test]
    fn week_range_at_calendar_edges_is_an_error() {
        assert_eq!(
            week_range(NaiveDate::MAX),
            Err(CalendarError::DateOutOfRange(NaiveDate::MAX))
        );
        assert_eq!(
            week_range(NaiveDate::MIN),
            Err(CalendarError::DateOutOfRange(NaiveDate::MIN))
        );
        let target = TargetPeriod::Week { containing: NaiveDate::MAX };
        assert_eq!(target.resolve(), Err(CalendarError::DateOutOfRange(NaiveDate::MAX)));
    }

    #[test]
    fn month_range_handles_leap_years_and_december() {
        assert_eq!(month_range(2024, 2).unwrap().to, d(2024, 2, 29));
        assert_eq!(month_range(2025, 2).unwrap().to, d(2025, 2, 28));
        let dec = month_range(2025, 12).unwrap();
        assert_eq!((dec.from, dec.to), (d(2025, 12, 1), d(2025, 12, 31)));
    }

    #[test]
    fn month_range_rejects_bad_input() {
        assert_eq!(month_range(2025, 0), Err(CalendarError::InvalidMonth(0)));
        assert_eq!(month_range(2025, 13), Err(CalendarError::InvalidMonth(13)));
        assert_eq!(month_range(1969, 5), Err(CalendarError::YearOutOfRange(1969)));
    }

    #[test]
    fn february_2025_has_five_weeks() {
        assert_eq!(week_count_in_month(2025, 2).unwrap(), 5);
    }

    #[test]
    fn sunday_start_month_gets_a_trailing_week() {
        // June 2025 starts on a Sunday; the 30th is a Monday.
        assert_eq!(first_weekday_offset(2025, 6).unwrap(), 6);
        assert_eq!(week_count_in_month(2025, 6).unwrap(), 6);
        let last = week_range_in_month(2025, 6, 6).unwrap();
        assert_eq!(last.from, d(2025, 6, 30));
    }

    #[test]
    fn sunday_start_offset_is_six_not_zero() {
        // With Sunday = 0 the formula would give ceil((0 + 30) / 7) = 5 weeks
        // and leave 2025-06-30 uncovered.
        let june = month_range(2025, 6).unwrap();
        assert_eq!(june.from.weekday(), chrono::Weekday::Sun);
        let count = week_count_in_month(2025, 6).unwrap();
        assert_ne!(count, (june.len_days() as u32).div_ceil(7));
        assert!(week_range_in_month(2025, 6, count).unwrap().contains(d(2025, 6, 30)));
        assert_eq!(first_weekday_offset(2025, 2).unwrap(), 5);
        // February 2021 starts on a Monday and fits in four whole weeks.
        assert_eq!(first_weekday_offset(2021, 2).unwrap(), 0);
        assert_eq!(week_count_in_month(2021, 2).unwrap(), 4);
    }

    #[test]
    fn week_count_matches_formula() {
        for year in 2020..=2030 {
            for month in 1..=12 {
                let range = month_range(year, month).unwrap();
                let offset = first_weekday_offset(year, month).unwrap() as i64;
                let expected = (offset + range.len_days() + 6) / 7;
                assert_eq!(week_count_in_month(year, month).unwrap() as i64, expected);
            }
        }
    }

    #[test]
    fn month_weeks_cover_every_day_exactly_once() {
        for year in 2020..=2030 {
            for month in 1..=12 {
                let range = month_range(year, month).unwrap();
                let count = week_count_in_month(year, month).unwrap();
                let mut seen: Vec<NaiveDate> = Vec::new();
                for week in 1..=count {
                    let w = week_range_in_month(year, month, week).unwrap();
                    if let Some(clipped) = w.clip(&range) {
                        seen.extend(clipped.days());
                    }
                }
                let expected: Vec<NaiveDate> = range.days().collect();
                assert_eq!(seen, expected, "{year}-{month:02}");
            }
        }
    }

    #[test]
    fn week_range_in_month_rejects_out_of_range_index() {
        assert!(matches!(
            week_range_in_month(2025, 2, 0),
            Err(CalendarError::WeekOutOfRange { week: 0, count: 5, .. })
        ));
        assert!(week_range_in_month(2025, 2, 6).is_err());
    }

    #[test]
    fn week_range_in_month_first_week_anchors_before_first() {
        let w = week_range_in_month(2025, 2, 1).unwrap();
        assert_eq!(w.from, d(2025, 1, 27));
        assert_eq!(w.to, d(2025, 2, 2));
        let w3 = week_range_in_month(2025, 2, 3).unwrap();
        assert_eq!(w3.from, d(2025, 2, 10));
    }

    #[test]
    fn week_index_in_month_agrees_with_week_ranges() {
        for month in 1..=12 {
            let range = month_range(2026, month).unwrap();
            for date in range.days() {
                let idx = week_index_in_month(date);
                let w = week_range_in_month(2026, month, idx).unwrap();
                assert!(w.contains(date));
            }
        }
    }

    #[test]
    fn weeks_of_year_2025() {
        let weeks = weeks_of_year(2025).unwrap();
        let starts: Vec<_> = weeks.iter().collect();
        assert_eq!(starts.first(), Some(&d(2024, 12, 30)));
        assert_eq!(starts.last(), Some(&d(2025, 12, 29)));
        assert_eq!(starts.len(), 53);
        assert_eq!(weeks.len(), 53);
        assert!(starts.iter().all(|s| is_monday(*s)));
    }

    #[test]
    fn weeks_of_year_is_restartable() {
        let weeks = weeks_of_year(2024).unwrap();
        let first: Vec<_> = weeks.into_iter().collect();
        let second: Vec<_> = (&weeks).into_iter().collect();
        assert_eq!(first, second);
        let ranges: Vec<_> = weeks.ranges().collect();
        assert_eq!(ranges.len(), first.len());
        assert!(ranges.first().unwrap().contains(d(2024, 1, 1)));
        assert!(ranges.last().unwrap().contains(d(2024, 12, 31)));
    }

    #[test]
    fn week_starts_is_fused() {
        let mut it = weeks_of_year(2025).unwrap().iter();
        for _ in 0..53 {
            assert!(it.next().is_some());
        }
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
        assert_eq!(it.len(), 0);
    }

    #[test]
    fn target_period_resolves() {
        let week = TargetPeriod::Week { containing: d(2025, 3, 12) }.resolve().unwrap();
        assert_eq!(week.from, d(2025, 3, 10));
        let month = TargetPeriod::Month { year: 2025, month: 2 }.resolve().unwrap();
        assert_eq!(month.len_days(), 28);
        let wom = TargetPeriod::WeekOfMonth { year: 2025, month: 2, week: 2 }.resolve().unwrap();
        assert_eq!(wom.from, d(2025, 2, 3));
    }
}
