use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::limits::{MAX_DOCTORS_PER_SHIFT, MAX_SHIFTS_PER_BATCH};
use crate::model::*;

use super::precheck::PrecheckBoard;
use super::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Added,
    /// The doctor already held this slot; nothing changed.
    AlreadySelected,
}

/// Whether a doctor may take one more slot in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible { remaining: u32 },
    Blocked { existing: u32, in_batch: u32 },
    /// No settled precheck answer for this round.
    Unknown,
}

/// Operator choices for one creation attempt: the shifts picked and the
/// doctors placed on each. Also tracks how many slots each doctor holds.
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    range: DateRange,
    max_per_doctor: u32,
    selections: BTreeMap<ShiftId, BTreeSet<DoctorId>>,
    slots: HashMap<DoctorId, u32>,
}

impl CandidateBatch {
    pub fn new(range: DateRange, max_per_doctor: u32) -> Self {
        Self {
            range,
            max_per_doctor,
            selections: BTreeMap::new(),
            slots: HashMap::new(),
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn max_per_doctor(&self) -> u32 {
        self.max_per_doctor
    }

    /// Returns false if the shift was already part of the batch.
    pub fn add_shift(&mut self, shift_id: ShiftId) -> Result<bool, ScheduleError> {
        if self.selections.contains_key(&shift_id) {
            return Ok(false);
        }
        if self.selections.len() >= MAX_SHIFTS_PER_BATCH {
            return Err(ScheduleError::LimitExceeded("too many shifts in batch"));
        }
        self.selections.insert(shift_id, BTreeSet::new());
        Ok(true)
    }

    /// Drop a shift and release the slots its doctors held.
    pub fn remove_shift(&mut self, shift_id: &ShiftId) -> Option<BTreeSet<DoctorId>> {
        let doctors = self.selections.remove(shift_id)?;
        for doctor_id in &doctors {
            self.release(doctor_id);
        }
        Some(doctors)
    }

    pub fn shifts(&self) -> impl Iterator<Item = (&ShiftId, &BTreeSet<DoctorId>)> {
        self.selections.iter()
    }

    /// Slots `doctor_id` holds within this batch.
    pub fn slots_for(&self, doctor_id: &DoctorId) -> u32 {
        self.slots.get(doctor_id).copied().unwrap_or(0)
    }

    pub fn selected_doctors(&self) -> BTreeSet<DoctorId> {
        self.slots.keys().copied().collect()
    }

    pub fn is_selected(&self, shift_id: &ShiftId, doctor_id: &DoctorId) -> bool {
        self.selections
            .get(shift_id)
            .is_some_and(|doctors| doctors.contains(doctor_id))
    }

    pub fn eligibility(&self, doctor_id: &DoctorId, board: &PrecheckBoard) -> Eligibility {
        let in_batch = self.slots_for(doctor_id);
        let Some(existing) = board.known(doctor_id) else {
            return if in_batch >= self.max_per_doctor {
                Eligibility::Blocked { existing: 0, in_batch }
            } else {
                Eligibility::Unknown
            };
        };
        let used = existing + in_batch;
        if used >= self.max_per_doctor {
            Eligibility::Blocked { existing, in_batch }
        } else {
            Eligibility::Eligible {
                remaining: self.max_per_doctor - used,
            }
        }
    }

    /// Place a doctor on a shift. Re-selecting a held slot is a no-op; a new
    /// slot must fit under the cap both within the batch and together with the
    /// doctor's existing load on the period's first day.
    pub fn select(
        &mut self,
        shift_id: ShiftId,
        doctor_id: DoctorId,
        board: &PrecheckBoard,
    ) -> Result<Selection, ScheduleError> {
        let Some(doctors) = self.selections.get(&shift_id) else {
            return Err(ScheduleError::UnknownShift(shift_id));
        };
        if doctors.contains(&doctor_id) {
            return Ok(Selection::AlreadySelected);
        }
        if doctors.len() >= MAX_DOCTORS_PER_SHIFT {
            return Err(ScheduleError::LimitExceeded("too many doctors on shift"));
        }

        let in_batch = self.slots_for(&doctor_id);
        if in_batch + 1 > self.max_per_doctor {
            return Err(self.cap_exceeded(doctor_id));
        }
        let existing = board
            .known(&doctor_id)
            .ok_or(ScheduleError::EligibilityUnknown(doctor_id))?;
        if existing + in_batch + 1 > self.max_per_doctor {
            return Err(self.cap_exceeded(doctor_id));
        }

        if let Some(doctors) = self.selections.get_mut(&shift_id) {
            doctors.insert(doctor_id);
        }
        *self.slots.entry(doctor_id).or_insert(0) += 1;
        Ok(Selection::Added)
    }

    /// Returns false if the doctor was not on that shift.
    pub fn deselect(&mut self, shift_id: &ShiftId, doctor_id: &DoctorId) -> bool {
        let removed = self
            .selections
            .get_mut(shift_id)
            .is_some_and(|doctors| doctors.remove(doctor_id));
        if removed {
            self.release(doctor_id);
        }
        removed
    }

    /// Re-check every selected doctor against the settled board. Fails if any
    /// doctor's load is unresolved or the combined load now exceeds the cap.
    pub fn verify(&self, board: &PrecheckBoard) -> Result<(), ScheduleError> {
        for (doctor_id, in_batch) in &self.slots {
            if *in_batch > self.max_per_doctor {
                return Err(self.cap_exceeded(*doctor_id));
            }
            let existing = board
                .known(doctor_id)
                .ok_or(ScheduleError::EligibilityUnknown(*doctor_id))?;
            if existing + in_batch > self.max_per_doctor {
                return Err(self.cap_exceeded(*doctor_id));
            }
        }
        Ok(())
    }

    /// Verify, prune empty shifts and build the period to persist.
    pub fn finalize(&self, board: &PrecheckBoard) -> Result<WorkSchedulePeriod, ScheduleError> {
        self.verify(board)?;
        let assignments: Vec<ShiftAssignment> = self
            .selections
            .iter()
            .filter(|(_, doctors)| !doctors.is_empty())
            .map(|(shift_id, doctors)| ShiftAssignment {
                shift_id: *shift_id,
                doctor_ids: doctors.clone(),
            })
            .collect();
        if assignments.is_empty() {
            return Err(ScheduleError::EmptyBatch);
        }
        Ok(WorkSchedulePeriod::new(self.range, assignments))
    }

    fn release(&mut self, doctor_id: &DoctorId) {
        if let Some(count) = self.slots.get_mut(doctor_id) {
            *count -= 1;
            if *count == 0 {
                self.slots.remove(doctor_id);
            }
        }
    }

    fn cap_exceeded(&self, doctor_id: DoctorId) -> ScheduleError {
        ScheduleError::DoctorCapExceeded {
            doctor_id,
            date: self.range.from,
        }
    }
}
