use chrono::NaiveDate;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::calendar::TargetPeriod;
use crate::config::SchedulingPolicy;
use crate::limits::MAX_PRECHECK_FANOUT;
use crate::model::*;

use super::admission::{check_admissible, propose_range, validate_range, RangeProposal};
use super::batch::{CandidateBatch, Eligibility, Selection};
use super::precheck::{MergeOutcome, PrecheckBoard, PrecheckReport, PrecheckRequest, RoundId};
use super::ScheduleError;

/// State of one creation attempt: target period, precheck answers and the
/// candidate batch. Nothing here outlives the attempt; dropping the session
/// cancels any precheck still in flight.
pub struct CreationSession {
    today: NaiveDate,
    policy: SchedulingPolicy,
    batch: Option<CandidateBatch>,
    board: PrecheckBoard,
    in_flight: Vec<AbortHandle>,
}

impl CreationSession {
    pub fn new(policy: SchedulingPolicy, today: NaiveDate) -> Self {
        Self {
            today,
            policy,
            batch: None,
            board: PrecheckBoard::new(),
            in_flight: Vec::new(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move the session's notion of today forward. Earlier dates are ignored.
    pub fn observe_today(&mut self, today: NaiveDate) {
        if today > self.today {
            debug!("session date advanced {} -> {today}", self.today);
            self.today = today;
        }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn range(&self) -> Option<DateRange> {
        self.batch.as_ref().map(|b| b.range())
    }

    pub fn round(&self) -> RoundId {
        self.board.round()
    }

    pub fn batch(&self) -> Option<&CandidateBatch> {
        self.batch.as_ref()
    }

    pub fn board(&self) -> &PrecheckBoard {
        &self.board
    }

    /// Fill in the default end date when none is given. The result still has
    /// to be passed to [`target`](Self::target) to take effect.
    pub fn propose(&self, start: NaiveDate, end: Option<NaiveDate>) -> Result<RangeProposal, ScheduleError> {
        propose_range(start, end, self.policy.default_horizon_days)
    }

    /// Switch to a new target period. Whatever was selected for the previous
    /// period is abandoned and in-flight prechecks are cancelled, whether or
    /// not the new period turns out to be admissible.
    pub fn target(&mut self, range: DateRange) -> Result<RoundId, ScheduleError> {
        self.abandon();
        validate_range(&range)?;
        check_admissible(range, self.today)?;
        let round = self.board.reset(Some(range.from));
        self.batch = Some(CandidateBatch::new(range, self.policy.max_shifts_per_doctor));
        debug!("session targets {range} ({round})");
        Ok(round)
    }

    pub fn target_period(&mut self, target: TargetPeriod) -> Result<DateRange, ScheduleError> {
        self.abandon();
        let range = target.resolve()?;
        self.target(range)?;
        Ok(range)
    }

    pub fn add_shift(&mut self, shift_id: ShiftId) -> Result<bool, ScheduleError> {
        self.batch_mut()?.add_shift(shift_id)
    }

    pub fn remove_shift(&mut self, shift_id: &ShiftId) -> Result<bool, ScheduleError> {
        Ok(self.batch_mut()?.remove_shift(shift_id).is_some())
    }

    pub fn select(&mut self, shift_id: ShiftId, doctor_id: DoctorId) -> Result<Selection, ScheduleError> {
        let batch = self.batch.as_mut().ok_or(ScheduleError::NoTargetPeriod)?;
        batch.select(shift_id, doctor_id, &self.board)
    }

    pub fn deselect(&mut self, shift_id: &ShiftId, doctor_id: &DoctorId) -> Result<bool, ScheduleError> {
        Ok(self.batch_mut()?.deselect(shift_id, doctor_id))
    }

    pub fn eligibility(&self, doctor_id: &DoctorId) -> Eligibility {
        match &self.batch {
            Some(batch) => batch.eligibility(doctor_id, &self.board),
            None => Eligibility::Unknown,
        }
    }

    /// Mark `doctors` pending for the current round and return the lookups to run.
    pub fn begin_precheck(&mut self, doctors: &[DoctorId]) -> Result<PrecheckRequest, ScheduleError> {
        if self.batch.is_none() {
            return Err(ScheduleError::NoTargetPeriod);
        }
        if doctors.len() > MAX_PRECHECK_FANOUT {
            return Err(ScheduleError::LimitExceeded("too many doctors in precheck"));
        }
        self.board.request(doctors).ok_or(ScheduleError::NoTargetPeriod)
    }

    /// Merge a finished precheck. Reports from an abandoned round are ignored.
    pub fn apply_precheck(&mut self, report: PrecheckReport) -> MergeOutcome {
        self.board.merge(report)
    }

    /// Register a spawned precheck so a retarget or drop can cancel it.
    pub fn track(&mut self, handle: AbortHandle) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }

    /// Build the period to persist. Admissibility is checked again against
    /// the latest observed today, so a session left open past midnight cannot
    /// create a started period once the caller has called
    /// [`observe_today`](Self::observe_today).
    pub fn finalize(&self) -> Result<WorkSchedulePeriod, ScheduleError> {
        let batch = self.batch.as_ref().ok_or(ScheduleError::NoTargetPeriod)?;
        check_admissible(batch.range(), self.today)?;
        batch.finalize(&self.board)
    }

    /// The batch was persisted; forget it.
    pub fn complete(&mut self) {
        info!("creation attempt for {:?} completed", self.range());
        self.abandon();
    }

    fn abandon(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
        self.batch = None;
        self.board.reset(None);
    }

    fn batch_mut(&mut self) -> Result<&mut CandidateBatch, ScheduleError> {
        self.batch.as_mut().ok_or(ScheduleError::NoTargetPeriod)
    }
}

impl Drop for CreationSession {
    fn drop(&mut self) {
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
    }
}
