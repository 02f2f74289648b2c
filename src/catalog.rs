use std::collections::HashSet;

use chrono::NaiveTime;

use crate::limits::MAX_SHIFT_TYPE_LEN;
use crate::model::{Shift, ShiftId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("shift {0} must start before it ends")]
    EmptyWindow(String),
    #[error("shifts {0} and {1} overlap")]
    Overlap(String, String),
    #[error("duplicate shift type: {0}")]
    DuplicateType(String),
    #[error("shift type label invalid: {0:?}")]
    InvalidLabel(String),
}

/// Fixed daily shifts, kept sorted by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftCatalog {
    shifts: Vec<Shift>,
}

impl ShiftCatalog {
    pub fn new(mut shifts: Vec<Shift>) -> Result<Self, CatalogError> {
        let mut labels = HashSet::new();
        for shift in &shifts {
            let label = shift.shift_type.trim();
            if label.is_empty() || label.len() > MAX_SHIFT_TYPE_LEN {
                return Err(CatalogError::InvalidLabel(shift.shift_type.clone()));
            }
            if shift.start >= shift.end {
                return Err(CatalogError::EmptyWindow(shift.shift_type.clone()));
            }
            if !labels.insert(label.to_lowercase()) {
                return Err(CatalogError::DuplicateType(shift.shift_type.clone()));
            }
        }

        shifts.sort_by_key(|s| s.start);
        for pair in shifts.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(CatalogError::Overlap(
                    pair[0].shift_type.clone(),
                    pair[1].shift_type.clone(),
                ));
            }
        }
        Ok(Self { shifts })
    }

    /// The shift whose `[start, end)` contains `time`, if any.
    pub fn classify(&self, time: NaiveTime) -> Option<&Shift> {
        // Everything at index >= bound starts after `time`.
        let bound = self.shifts.partition_point(|s| s.start <= time);
        let candidate = self.shifts[..bound].last()?;
        candidate.contains_time(time).then_some(candidate)
    }

    pub fn get(&self, id: &ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == *id)
    }

    /// Case-insensitive lookup by type label.
    pub fn by_type(&self, shift_type: &str) -> Option<&Shift> {
        let wanted = shift_type.trim();
        self.shifts
            .iter()
            .find(|s| s.shift_type.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn contains(&self, id: &ShiftId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shift> {
        self.shifts.iter()
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn clinic() -> ShiftCatalog {
        ShiftCatalog::new(vec![
            Shift::new("Evening", t(17, 0), t(21, 0)),
            Shift::new("Morning", t(7, 0), t(12, 0)),
            Shift::new("Afternoon", t(13, 0), t(17, 0)),
        ])
        .unwrap()
    }

    #[test]
    fn catalog_sorted_by_start() {
        let cat = clinic();
        let names: Vec<_> = cat.iter().map(|s| s.shift_type.as_str()).collect();
        assert_eq!(names, vec!["Morning", "Afternoon", "Evening"]);
    }

    #[test]
    fn classify_buckets_times() {
        let cat = clinic();
        assert_eq!(cat.classify(t(7, 0)).unwrap().shift_type, "Morning");
        assert_eq!(cat.classify(t(11, 59)).unwrap().shift_type, "Morning");
        assert_eq!(cat.classify(t(17, 0)).unwrap().shift_type, "Evening");
        assert_eq!(cat.classify(t(16, 30)).unwrap().shift_type, "Afternoon");
    }

    #[test]
    fn classify_gap_is_none() {
        let cat = clinic();
        assert!(cat.classify(t(12, 30)).is_none()); // lunch gap
        assert!(cat.classify(t(6, 59)).is_none());
        assert!(cat.classify(t(21, 0)).is_none()); // end is exclusive
    }

    #[test]
    fn classify_empty_catalog() {
        assert!(ShiftCatalog::default().classify(t(9, 0)).is_none());
    }

    #[test]
    fn rejects_overlap() {
        let err = ShiftCatalog::new(vec![
            Shift::new("Morning", t(7, 0), t(12, 0)),
            Shift::new("Midday", t(11, 0), t(14, 0)),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::Overlap("Morning".into(), "Midday".into()));
    }

    #[test]
    fn rejects_empty_window() {
        let err = ShiftCatalog::new(vec![Shift::new("Night", t(22, 0), t(6, 0))]).unwrap_err();
        assert_eq!(err, CatalogError::EmptyWindow("Night".into()));
    }

    #[test]
    fn rejects_duplicate_labels_case_insensitively() {
        let err = ShiftCatalog::new(vec![
            Shift::new("Morning", t(7, 0), t(12, 0)),
            Shift::new("morning", t(13, 0), t(14, 0)),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateType(_)));
    }

    #[test]
    fn lookup_by_id_and_type() {
        let cat = clinic();
        let morning = cat.by_type("MORNING").unwrap().clone();
        assert_eq!(cat.get(&morning.id), Some(&morning));
        assert!(cat.contains(&morning.id));
        assert!(cat.by_type("Night").is_none());
    }
}
