use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub type ShiftId = Ulid;
pub type DoctorId = Ulid;
pub type PeriodId = Ulid;

/// Inclusive range of calendar dates `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `to` precedes `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// Intersection of two ranges, if any.
    pub fn clip(&self, other: &DateRange) -> Option<DateRange> {
        DateRange::new(self.from.max(other.from), self.to.min(other.to))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let from = self.from;
        (0..self.len_days()).map(move |i| from + Duration::days(i))
    }
}

#[derive(Deserialize)]
struct RawDateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(raw: RawDateRange) -> Result<Self, String> {
        DateRange::new(raw.from, raw.to)
            .ok_or_else(|| format!("end date {} precedes start date {}", raw.to, raw.from))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.from, self.to)
    }
}

/// A named recurring daily window, e.g. Morning 07:00-12:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub shift_type: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Shift {
    pub fn new(shift_type: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: Ulid::new(),
            shift_type: shift_type.into(),
            start,
            end,
        }
    }

    /// Half-open: `start <= t < end`.
    pub fn contains_time(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }

    pub fn overlaps(&self, other: &Shift) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn window(&self) -> ShiftWindow {
        ShiftWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// Display form of a shift's daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl fmt::Display for ShiftWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub full_name: String,
    pub specialty: String,
}

impl Doctor {
    pub fn new(full_name: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            full_name: full_name.into(),
            specialty: specialty.into(),
        }
    }
}

/// One shift of a period and the doctors working it. The set keeps ids unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub shift_id: ShiftId,
    pub doctor_ids: BTreeSet<DoctorId>,
}

/// A validated bulk-creation batch. Only the scheduler builds these, so every
/// assignment is non-empty and `range.from <= range.to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkSchedulePeriod {
    range: DateRange,
    assignments: Vec<ShiftAssignment>,
}

impl WorkSchedulePeriod {
    pub(crate) fn new(range: DateRange, assignments: Vec<ShiftAssignment>) -> Self {
        debug_assert!(assignments.iter().all(|a| !a.doctor_ids.is_empty()));
        Self { range, assignments }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.range.from
    }

    pub fn effective_to(&self) -> NaiveDate {
        self.range.to
    }

    pub fn assignments(&self) -> &[ShiftAssignment] {
        &self.assignments
    }

    /// Shift slots held by `doctor` on any single day of this period.
    pub fn slots_for(&self, doctor: &DoctorId) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.doctor_ids.contains(doctor))
            .count()
    }
}

/// A period as held by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPeriod {
    pub id: PeriodId,
    pub period: WorkSchedulePeriod,
}

/// Listing projection of a stored period with shift and doctor details resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    pub id: PeriodId,
    pub range: DateRange,
    pub shifts: Vec<PeriodShift>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodShift {
    pub shift: Shift,
    pub doctors: Vec<Doctor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyScheduleSummary {
    pub date: NaiveDate,
    pub shift_count: u32,
    pub doctor_count: u32,
}

impl DailyScheduleSummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            shift_count: 0,
            doctor_count: 0,
        }
    }
}

/// Origin of a doctor's presence on a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScheduleStatus {
    #[default]
    Normal,
    /// The doctor took the shift over from a colleague.
    Exchange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorScheduleEntry {
    pub doctor: Doctor,
    pub date: NaiveDate,
    pub shift: Shift,
    pub status: ScheduleStatus,
}

/// A doctor with no shift anywhere in `week`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub week: DateRange,
    pub doctor: Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn date_range_rejects_inverted() {
        assert!(DateRange::new(d(2025, 1, 2), d(2025, 1, 1)).is_none());
        assert!(DateRange::new(d(2025, 1, 1), d(2025, 1, 1)).is_some());
    }

    #[test]
    fn date_range_deserialize_checks_order() {
        let ok: DateRange = serde_json::from_str(r#"{"from":"2025-03-10","to":"2025-03-16"}"#).unwrap();
        assert_eq!(ok.len_days(), 7);
        let inverted = serde_json::from_str::<DateRange>(r#"{"from":"2025-03-16","to":"2025-03-10"}"#);
        let err = inverted.unwrap_err().to_string();
        assert!(err.contains("precedes"), "{err}");
    }

    #[test]
    fn date_range_days_inclusive() {
        let r = DateRange::new(d(2025, 2, 27), d(2025, 3, 2)).unwrap();
        let days: Vec<_> = r.days().collect();
        assert_eq!(days, vec![d(2025, 2, 27), d(2025, 2, 28), d(2025, 3, 1), d(2025, 3, 2)]);
        assert_eq!(r.len_days(), 4);
    }

    #[test]
    fn date_range_clip() {
        let a = DateRange::new(d(2025, 1, 27), d(2025, 2, 2)).unwrap();
        let feb = DateRange::new(d(2025, 2, 1), d(2025, 2, 28)).unwrap();
        assert_eq!(a.clip(&feb), DateRange::new(d(2025, 2, 1), d(2025, 2, 2)));

        let march = DateRange::new(d(2025, 3, 1), d(2025, 3, 31)).unwrap();
        assert!(a.clip(&march).is_none());
        assert!(!a.overlaps(&march));
    }

    #[test]
    fn shift_half_open() {
        let s = Shift::new("Morning", t(7, 0), t(12, 0));
        assert!(s.contains_time(t(7, 0)));
        assert!(s.contains_time(t(11, 59)));
        assert!(!s.contains_time(t(12, 0)));
    }

    #[test]
    fn shift_window_display() {
        let s = Shift::new("Evening", t(17, 0), t(21, 30));
        assert_eq!(s.window().to_string(), "17:00 - 21:30");
    }

    #[test]
    fn adjacent_shifts_do_not_overlap() {
        let a = Shift::new("Morning", t(7, 0), t(12, 0));
        let b = Shift::new("Afternoon", t(12, 0), t(17, 0));
        let c = Shift::new("Late morning", t(11, 0), t(13, 0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn period_slots_for_counts_assignments() {
        let doc = Ulid::new();
        let other = Ulid::new();
        let range = DateRange::single(d(2025, 3, 10));
        let period = WorkSchedulePeriod::new(
            range,
            vec![
                ShiftAssignment {
                    shift_id: Ulid::new(),
                    doctor_ids: [doc, other].into_iter().collect(),
                },
                ShiftAssignment {
                    shift_id: Ulid::new(),
                    doctor_ids: [doc].into_iter().collect(),
                },
            ],
        );
        assert_eq!(period.slots_for(&doc), 2);
        assert_eq!(period.slots_for(&other), 1);
        assert_eq!(period.slots_for(&Ulid::new()), 0);
    }

    #[test]
    fn status_defaults_to_normal() {
        assert_eq!(ScheduleStatus::default(), ScheduleStatus::Normal);
    }
}
