use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::calendar::{month_range, week_range};
use crate::clock::Clock;
use crate::config::SchedulingPolicy;
use crate::coverage::CoverageReconciler;
use crate::model::*;
use crate::observability;
use crate::page::{Page, PageRequest};
use crate::repository::{DoctorDirectory, RepositoryError, ScheduleRepository};
use crate::scheduler::{CreationSession, MergeOutcome, PrecheckReport, ScheduleError};

/// Entries of one week grouped by day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyGrid {
    pub week: DateRange,
    pub days: BTreeMap<NaiveDate, Vec<DoctorScheduleEntry>>,
}

impl WeeklyGrid {
    fn from_entries(week: DateRange, entries: Vec<DoctorScheduleEntry>) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<DoctorScheduleEntry>> =
            week.days().map(|day| (day, Vec::new())).collect();
        for entry in entries {
            days.entry(entry.date).or_default().push(entry);
        }
        Self { week, days }
    }

    pub fn on(&self, date: NaiveDate) -> &[DoctorScheduleEntry] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Entry point for the UI layer: opens creation sessions, runs prechecks,
/// persists accepted batches and serves the read-side views.
#[derive(Clone)]
pub struct SchedulingService {
    repo: Arc<dyn ScheduleRepository>,
    directory: Arc<dyn DoctorDirectory>,
    clock: Arc<dyn Clock>,
    policy: SchedulingPolicy,
}

impl SchedulingService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        directory: Arc<dyn DoctorDirectory>,
        clock: Arc<dyn Clock>,
        policy: SchedulingPolicy,
    ) -> Self {
        Self {
            repo,
            directory,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn open_session(&self) -> CreationSession {
        CreationSession::new(self.policy, self.clock.today())
    }

    /// Check existing load for `doctors` and merge the answers into the session.
    pub async fn precheck(
        &self,
        session: &mut CreationSession,
        doctors: &[DoctorId],
    ) -> Result<MergeOutcome, ScheduleError> {
        let request = session.begin_precheck(doctors)?;
        let report = request.run(self.repo.as_ref()).await;
        Ok(session.apply_precheck(report))
    }

    /// Same as [`precheck`](Self::precheck) but runs on its own task. The
    /// session keeps an abort handle, so retargeting cancels it; the caller
    /// merges the report with [`CreationSession::apply_precheck`].
    pub fn spawn_precheck(
        &self,
        session: &mut CreationSession,
        doctors: &[DoctorId],
    ) -> Result<JoinHandle<PrecheckReport>, ScheduleError> {
        let request = session.begin_precheck(doctors)?;
        let repo = self.repo.clone();
        let handle = tokio::spawn(async move { request.run(repo.as_ref()).await });
        session.track(handle.abort_handle());
        Ok(handle)
    }

    /// Validate the session's batch and persist it. On success the session is
    /// cleared; on failure it is left untouched so the operator can fix or retry.
    pub async fn create_period(&self, session: &mut CreationSession) -> Result<PeriodId, ScheduleError> {
        session.observe_today(self.clock.today());
        let period = match session.finalize() {
            Ok(period) => period,
            Err(e) => {
                reject(&e);
                return Err(e);
            }
        };
        let id = match self.repo.create_period(&period).await {
            Ok(id) => id,
            Err(e) => {
                warn!("creating period {} failed: {e}", period.range());
                let e = ScheduleError::from(e);
                reject(&e);
                return Err(e);
            }
        };
        let slots: usize = period.assignments().iter().map(|a| a.doctor_ids.len()).sum();
        metrics::counter!(observability::PERIODS_CREATED_TOTAL).increment(1);
        metrics::histogram!(observability::PERIOD_SLOTS).record(slots as f64);
        info!("created period {id} for {} with {slots} slots", period.range());
        session.complete();
        Ok(id)
    }

    pub async fn list_periods(&self, req: PageRequest) -> Result<Page<PeriodSummary>, RepositoryError> {
        self.repo
            .list_periods(req)
            .await
            .inspect_err(|e| read_failed("list_periods", e))
    }

    pub async fn monthly_summary(&self, year: i32, month: u32) -> Result<Vec<DailyScheduleSummary>, ScheduleError> {
        month_range(year, month)?;
        Ok(self
            .repo
            .daily_summaries(year, month)
            .await
            .inspect_err(|e| read_failed("daily_summaries", e))?)
    }

    /// Weekly grid for the Monday-to-Sunday week containing `date`.
    pub async fn weekly_grid(&self, date: NaiveDate) -> Result<WeeklyGrid, RepositoryError> {
        let week = week_range(date).map_err(|e| RepositoryError::Rejected(e.to_string()))?;
        let entries = self
            .repo
            .doctor_schedules_in_range(week)
            .await
            .inspect_err(|e| read_failed("doctor_schedules_in_range", e))?;
        Ok(WeeklyGrid::from_entries(week, entries))
    }

    pub async fn coverage_gaps(&self, date: NaiveDate) -> Result<Vec<CoverageGap>, RepositoryError> {
        CoverageReconciler::new(self.directory.clone(), self.repo.clone())
            .coverage_gaps(date)
            .await
            .inspect_err(|e| read_failed("coverage_gaps", e))
    }

    pub async fn doctors(&self, search: Option<&str>) -> Result<Vec<Doctor>, RepositoryError> {
        self.directory
            .doctors(search)
            .await
            .inspect_err(|e| read_failed("doctors", e))
    }
}

fn reject(e: &ScheduleError) {
    info!("creation attempt rejected: {e}");
    metrics::counter!(observability::CREATION_REJECTED_TOTAL, "reason" => e.kind()).increment(1);
}

fn read_failed(operation: &'static str, e: &RepositoryError) {
    warn!("{operation} failed: {e}");
    metrics::counter!(observability::REPOSITORY_ERRORS_TOTAL, "operation" => operation).increment(1);
}
