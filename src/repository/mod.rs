//! Collaborator contracts for persisted schedules, the doctor roster and the
//! shift catalog. Every call is an independent async round trip; callers must
//! not assume any ordering between concurrent calls.

mod memory;

pub use memory::InMemoryScheduleStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use ulid::Ulid;

use crate::catalog::ShiftCatalog;
use crate::model::*;
use crate::page::{Page, PageRequest};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(Ulid),
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl RepositoryError {
    /// I/O failures may succeed if the operator re-issues the action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Periods ordered by effective-from, most recent first.
    async fn list_periods(&self, req: PageRequest) -> Result<Page<PeriodSummary>, RepositoryError>;

    /// One summary per calendar day of the month, zero-filled.
    async fn daily_summaries(&self, year: i32, month: u32) -> Result<Vec<DailyScheduleSummary>, RepositoryError>;

    async fn doctor_schedules_in_range(&self, range: DateRange) -> Result<Vec<DoctorScheduleEntry>, RepositoryError>;

    async fn doctor_shift_count_on_date(&self, doctor_id: DoctorId, date: NaiveDate) -> Result<u32, RepositoryError>;

    /// Persist a validated period. No deduplication happens here.
    async fn create_period(&self, period: &WorkSchedulePeriod) -> Result<PeriodId, RepositoryError>;
}

#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// Full roster when `search` is `None`, otherwise name/specialty matches.
    async fn doctors(&self, search: Option<&str>) -> Result<Vec<Doctor>, RepositoryError>;
}

#[async_trait]
pub trait ShiftSource: Send + Sync {
    async fn shift_catalog(&self) -> Result<ShiftCatalog, RepositoryError>;
}
