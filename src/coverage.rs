use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar::week_range;
use crate::limits::MAX_QUERY_WINDOW_DAYS;
use crate::model::*;
use crate::observability;
use crate::repository::{DoctorDirectory, RepositoryError, ScheduleRepository};

/// Roster members that appear nowhere in `entries`, in roster order.
pub fn unscheduled(roster: Vec<Doctor>, entries: &[DoctorScheduleEntry]) -> Vec<Doctor> {
    let scheduled: HashSet<DoctorId> = entries.iter().map(|e| e.doctor.id).collect();
    roster.into_iter().filter(|d| !scheduled.contains(&d.id)).collect()
}

/// Finds doctors with no shift in a window. Both the roster and the schedule
/// are re-read on every call.
#[derive(Clone)]
pub struct CoverageReconciler {
    directory: Arc<dyn DoctorDirectory>,
    repo: Arc<dyn ScheduleRepository>,
}

impl CoverageReconciler {
    pub fn new(directory: Arc<dyn DoctorDirectory>, repo: Arc<dyn ScheduleRepository>) -> Self {
        Self { directory, repo }
    }

    pub async fn doctors_without_schedule(&self, range: DateRange) -> Result<Vec<Doctor>, RepositoryError> {
        if range.len_days() > MAX_QUERY_WINDOW_DAYS {
            return Err(RepositoryError::LimitExceeded("query window too wide"));
        }
        let (roster, entries) = futures::try_join!(
            self.directory.doctors(None),
            self.repo.doctor_schedules_in_range(range),
        )?;
        let roster_size = roster.len();
        let missing = unscheduled(roster, &entries);
        debug!("{range}: {} of {roster_size} doctors unscheduled", missing.len());
        Ok(missing)
    }

    /// Gaps for the Monday-to-Sunday week containing `date`.
    pub async fn coverage_gaps(&self, date: NaiveDate) -> Result<Vec<CoverageGap>, RepositoryError> {
        let week = week_range(date).map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        let missing = self.doctors_without_schedule(week).await?;
        metrics::gauge!(observability::COVERAGE_GAP_DOCTORS).set(missing.len() as f64);
        Ok(missing
            .into_iter()
            .map(|doctor| CoverageGap { week, doctor })
            .collect())
    }
}
