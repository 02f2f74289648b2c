use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::calendar::month_range;
use crate::catalog::ShiftCatalog;
use crate::limits::*;
use crate::model::*;
use crate::page::{Page, PageRequest, Searchable};

use super::{DoctorDirectory, RepositoryError, ScheduleRepository, ShiftSource};

/// `(date, shift, original doctor)` of a swapped slot.
type ExchangeKey = (NaiveDate, ShiftId, DoctorId);

/// Process-local schedule store. Holds the roster, a fixed catalog, persisted
/// periods and recorded shift exchanges.
pub struct InMemoryScheduleStore {
    catalog: ShiftCatalog,
    doctors: DashMap<DoctorId, Doctor>,
    periods: DashMap<PeriodId, StoredPeriod>,
    /// Original holder → (recording sequence, replacement doctor).
    exchanges: DashMap<ExchangeKey, (u64, DoctorId)>,
    next_exchange: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryScheduleStore {
    pub fn new(catalog: ShiftCatalog) -> Self {
        Self {
            catalog,
            doctors: DashMap::new(),
            periods: DashMap::new(),
            exchanges: DashMap::new(),
            next_exchange: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> &ShiftCatalog {
        &self.catalog
    }

    // ── Roster ───────────────────────────────────────────────

    pub fn add_doctor(&self, doctor: Doctor) {
        self.doctors.insert(doctor.id, doctor);
    }

    pub fn remove_doctor(&self, id: &DoctorId) -> Option<Doctor> {
        self.doctors.remove(id).map(|(_, d)| d)
    }

    pub fn doctor(&self, id: &DoctorId) -> Option<Doctor> {
        self.doctors.get(id).map(|e| e.value().clone())
    }

    // ── Periods ──────────────────────────────────────────────

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }

    pub fn get_period(&self, id: &PeriodId) -> Option<StoredPeriod> {
        self.periods.get(id).map(|e| e.value().clone())
    }

    pub fn delete_period(&self, id: &PeriodId) -> Option<StoredPeriod> {
        self.periods.remove(id).map(|(_, p)| p)
    }

    /// Record that `to` takes over `from`'s slot on `shift_id` for `date`.
    /// A slot that is already the result of an exchange cannot be handed on.
    pub fn record_exchange(
        &self,
        date: NaiveDate,
        shift_id: ShiftId,
        from: DoctorId,
        to: DoctorId,
    ) -> Result<(), RepositoryError> {
        self.ensure_online()?;
        if !self.doctors.contains_key(&to) {
            return Err(RepositoryError::NotFound(to));
        }
        match self.slots_on(date).get(&(shift_id, from)) {
            None => return Err(RepositoryError::NotFound(from)),
            Some(ScheduleStatus::Exchange) => {
                return Err(RepositoryError::Rejected(format!(
                    "slot of {from} on {date} is already an exchange"
                )));
            }
            Some(ScheduleStatus::Normal) => {}
        }
        let seq = self.next_exchange.fetch_add(1, Ordering::SeqCst);
        self.exchanges.insert((date, shift_id, from), (seq, to));
        debug!("exchange on {date}: {from} -> {to} for shift {shift_id}");
        Ok(())
    }

    /// Simulate the collaborator going away; every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("schedule store offline".into()));
        }
        Ok(())
    }

    /// Effective `(shift, doctor) → status` slots for one day, exchanges applied.
    fn slots_on(&self, date: NaiveDate) -> BTreeMap<(ShiftId, DoctorId), ScheduleStatus> {
        let mut slots = BTreeMap::new();
        for entry in self.periods.iter() {
            let period = &entry.value().period;
            if !period.range().contains(date) {
                continue;
            }
            for assignment in period.assignments() {
                for doctor_id in &assignment.doctor_ids {
                    slots.insert((assignment.shift_id, *doctor_id), ScheduleStatus::Normal);
                }
            }
        }
        let mut swaps: Vec<(u64, ShiftId, DoctorId, DoctorId)> = self
            .exchanges
            .iter()
            .filter(|e| e.key().0 == date)
            .map(|e| {
                let (_, shift_id, from) = *e.key();
                let (seq, to) = *e.value();
                (seq, shift_id, from, to)
            })
            .collect();
        swaps.sort_unstable_by_key(|s| s.0);
        for (_, shift_id, from, to) in swaps {
            if slots.remove(&(shift_id, from)).is_some() {
                slots.insert((shift_id, to), ScheduleStatus::Exchange);
            }
        }
        slots
    }

    fn summarize(&self, stored: &StoredPeriod) -> PeriodSummary {
        let mut shifts: Vec<PeriodShift> = stored
            .period
            .assignments()
            .iter()
            .filter_map(|a| {
                let shift = self.catalog.get(&a.shift_id)?.clone();
                let mut doctors: Vec<Doctor> = a.doctor_ids.iter().filter_map(|id| self.doctor(id)).collect();
                doctors.sort_by(|x, y| x.full_name.cmp(&y.full_name));
                Some(PeriodShift { shift, doctors })
            })
            .collect();
        shifts.sort_by_key(|s| s.shift.start);
        PeriodSummary {
            id: stored.id,
            range: stored.period.range(),
            shifts,
        }
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleStore {
    async fn list_periods(&self, req: PageRequest) -> Result<Page<PeriodSummary>, RepositoryError> {
        self.ensure_online()?;
        let mut all: Vec<StoredPeriod> = self.periods.iter().map(|e| e.value().clone()).collect();
        // Ulids are time-ordered, so later batches win ties on effective-from.
        all.sort_by(|a, b| {
            b.period
                .effective_from()
                .cmp(&a.period.effective_from())
                .then(b.id.cmp(&a.id))
        });
        let req = PageRequest::new(req.page, req.page_size);
        Ok(Page::from_slice(&all, req).map(|p| self.summarize(&p)))
    }

    async fn daily_summaries(&self, year: i32, month: u32) -> Result<Vec<DailyScheduleSummary>, RepositoryError> {
        self.ensure_online()?;
        let range = month_range(year, month).map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        Ok(range
            .days()
            .map(|date| {
                let slots = self.slots_on(date);
                if slots.is_empty() {
                    return DailyScheduleSummary::empty(date);
                }
                let shifts: HashSet<ShiftId> = slots.keys().map(|(s, _)| *s).collect();
                let doctors: HashSet<DoctorId> = slots.keys().map(|(_, d)| *d).collect();
                DailyScheduleSummary {
                    date,
                    shift_count: shifts.len() as u32,
                    doctor_count: doctors.len() as u32,
                }
            })
            .collect())
    }

    async fn doctor_schedules_in_range(&self, range: DateRange) -> Result<Vec<DoctorScheduleEntry>, RepositoryError> {
        self.ensure_online()?;
        if range.len_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(RepositoryError::LimitExceeded("query window too wide"));
        }
        let mut entries = Vec::new();
        for date in range.days() {
            let mut day: Vec<DoctorScheduleEntry> = Vec::new();
            for ((shift_id, doctor_id), status) in self.slots_on(date) {
                let Some(shift) = self.catalog.get(&shift_id) else {
                    warn!("period references unknown shift {shift_id}");
                    continue;
                };
                let Some(doctor) = self.doctor(&doctor_id) else {
                    warn!("period references doctor {doctor_id} missing from roster");
                    continue;
                };
                day.push(DoctorScheduleEntry {
                    doctor,
                    date,
                    shift: shift.clone(),
                    status,
                });
            }
            day.sort_by(|a, b| {
                a.shift
                    .start
                    .cmp(&b.shift.start)
                    .then_with(|| a.doctor.full_name.cmp(&b.doctor.full_name))
            });
            entries.extend(day);
        }
        Ok(entries)
    }

    async fn doctor_shift_count_on_date(&self, doctor_id: DoctorId, date: NaiveDate) -> Result<u32, RepositoryError> {
        self.ensure_online()?;
        let count = self
            .slots_on(date)
            .keys()
            .filter(|(_, d)| *d == doctor_id)
            .count();
        Ok(count as u32)
    }

    async fn create_period(&self, period: &WorkSchedulePeriod) -> Result<PeriodId, RepositoryError> {
        self.ensure_online()?;
        for assignment in period.assignments() {
            if !self.catalog.contains(&assignment.shift_id) {
                return Err(RepositoryError::NotFound(assignment.shift_id));
            }
            if let Some(missing) = assignment
                .doctor_ids
                .iter()
                .find(|id| !self.doctors.contains_key(id))
            {
                return Err(RepositoryError::NotFound(*missing));
            }
        }
        let id = Ulid::new();
        self.periods.insert(
            id,
            StoredPeriod {
                id,
                period: period.clone(),
            },
        );
        debug!("stored period {id} covering {}", period.range());
        Ok(id)
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryScheduleStore {
    async fn doctors(&self, search: Option<&str>) -> Result<Vec<Doctor>, RepositoryError> {
        self.ensure_online()?;
        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        if needle.as_ref().is_some_and(|n| n.len() > MAX_SEARCH_LEN) {
            return Err(RepositoryError::LimitExceeded("search text too long"));
        }
        let mut found: Vec<Doctor> = self
            .doctors
            .iter()
            .map(|e| e.value().clone())
            .filter(|d| needle.as_deref().is_none_or(|n| d.matches(n)))
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl ShiftSource for InMemoryScheduleStore {
    async fn shift_catalog(&self) -> Result<ShiftCatalog, RepositoryError> {
        self.ensure_online()?;
        Ok(self.catalog.clone())
    }
}
