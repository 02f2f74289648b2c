use chrono::NaiveDate;

use crate::calendar::CalendarError;
use crate::model::{DateRange, DoctorId, ShiftId};
use crate::repository::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("period {range} is already in progress (today is {today})")]
    PeriodInProgress { range: DateRange, today: NaiveDate },
    #[error("period {range} lies in the past (today is {today})")]
    PeriodInPast { range: DateRange, today: NaiveDate },
    #[error("doctor {doctor_id} would exceed the shift cap on {date}")]
    DoctorCapExceeded { doctor_id: DoctorId, date: NaiveDate },
    #[error("no shift has any doctor assigned")]
    EmptyBatch,
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(#[from] RepositoryError),
    #[error("existing load of doctor {0} is not known yet")]
    EligibilityUnknown(DoctorId),
    #[error("no target period selected")]
    NoTargetPeriod,
    #[error("shift {0} is not part of this batch")]
    UnknownShift(ShiftId),
    #[error("end date {to} precedes start date {from}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl ScheduleError {
    /// Only collaborator I/O failures are worth re-issuing unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScheduleError::RepositoryUnavailable(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::PeriodInProgress { .. } => "period_in_progress",
            ScheduleError::PeriodInPast { .. } => "period_in_past",
            ScheduleError::DoctorCapExceeded { .. } => "doctor_cap_exceeded",
            ScheduleError::EmptyBatch => "empty_batch",
            ScheduleError::RepositoryUnavailable(_) => "repository_unavailable",
            ScheduleError::EligibilityUnknown(_) => "eligibility_unknown",
            ScheduleError::NoTargetPeriod => "no_target_period",
            ScheduleError::UnknownShift(_) => "unknown_shift",
            ScheduleError::InvalidRange { .. } => "invalid_range",
            ScheduleError::LimitExceeded(_) => "limit_exceeded",
            ScheduleError::Calendar(_) => "calendar",
        }
    }
}
