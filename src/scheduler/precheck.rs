use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::model::DoctorId;
use crate::observability;
use crate::repository::ScheduleRepository;

/// Identifies the target period a precheck belongs to. Every retarget bumps
/// the round, so reports from an abandoned period can be recognised on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RoundId(u64);

impl RoundId {
    pub fn next(self) -> Self {
        RoundId(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round#{}", self.0)
    }
}

/// What we know about a doctor's existing shift count on the period's start date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorLoad {
    /// Lookup issued, no answer yet.
    Pending,
    Known(u32),
    /// Lookup failed. Treated like `Pending`, never as eligible.
    Unavailable(String),
}

/// One scatter of per-doctor load lookups. `request` is unique within the
/// board and orders requests issued in the same round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecheckRequest {
    pub round: RoundId,
    pub request: u64,
    pub date: NaiveDate,
    pub doctors: Vec<DoctorId>,
}

impl PrecheckRequest {
    /// Fire every lookup concurrently and gather once all of them settle.
    /// A failed lookup only affects its own doctor.
    pub async fn run<R>(self, repo: &R) -> PrecheckReport
    where
        R: ScheduleRepository + ?Sized,
    {
        let started = Instant::now();
        let date = self.date;
        let lookups = self.doctors.iter().map(|&doctor_id| async move {
            (doctor_id, repo.doctor_shift_count_on_date(doctor_id, date).await)
        });
        let results = join_all(lookups).await;

        let loads = results
            .into_iter()
            .map(|(doctor_id, result)| {
                let load = match result {
                    Ok(count) => DoctorLoad::Known(count),
                    Err(e) => {
                        warn!("precheck for doctor {doctor_id} on {date} failed: {e}");
                        metrics::counter!(observability::PRECHECK_FAILURES_TOTAL).increment(1);
                        DoctorLoad::Unavailable(e.to_string())
                    }
                };
                (doctor_id, load)
            })
            .collect();
        metrics::histogram!(observability::PRECHECK_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        PrecheckReport {
            round: self.round,
            request: self.request,
            date,
            loads,
        }
    }
}

/// The gathered answers of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecheckReport {
    pub round: RoundId,
    pub request: u64,
    pub date: NaiveDate,
    pub loads: Vec<(DoctorId, DoctorLoad)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Doctors whose load was updated, and answers dropped because a newer
    /// request for the same doctor is outstanding.
    Applied { applied: usize, superseded: usize },
    /// The report belongs to an earlier round and was dropped.
    Stale { report: RoundId, current: RoundId },
}

/// Per-doctor loads for the current round.
#[derive(Debug, Clone, Default)]
pub struct PrecheckBoard {
    round: RoundId,
    date: Option<NaiveDate>,
    loads: HashMap<DoctorId, DoctorLoad>,
    /// Latest request issued for each doctor; only its answer is kept.
    latest: HashMap<DoctorId, u64>,
    next_request: u64,
}

impl PrecheckBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Start a new round for `date`, forgetting every load of the old one.
    pub fn reset(&mut self, date: Option<NaiveDate>) -> RoundId {
        self.round = self.round.next();
        self.date = date;
        self.loads.clear();
        self.latest.clear();
        self.round
    }

    /// Mark `doctors` pending and build the request that will resolve them.
    /// Returns `None` when the board has no date to check against.
    pub fn request(&mut self, doctors: &[DoctorId]) -> Option<PrecheckRequest> {
        let date = self.date?;
        self.next_request += 1;
        let request = self.next_request;
        let mut unique = Vec::with_capacity(doctors.len());
        for &doctor_id in doctors {
            if !unique.contains(&doctor_id) {
                unique.push(doctor_id);
            }
            self.loads.insert(doctor_id, DoctorLoad::Pending);
            self.latest.insert(doctor_id, request);
        }
        Some(PrecheckRequest {
            round: self.round,
            request,
            date,
            doctors: unique,
        })
    }

    pub fn merge(&mut self, report: PrecheckReport) -> MergeOutcome {
        if report.round != self.round || Some(report.date) != self.date {
            debug!("discarding precheck report from {} (current {})", report.round, self.round);
            metrics::counter!(observability::PRECHECK_STALE_TOTAL).increment(1);
            return MergeOutcome::Stale {
                report: report.round,
                current: self.round,
            };
        }
        let (mut applied, mut superseded) = (0, 0);
        for (doctor_id, load) in report.loads {
            if self.latest.get(&doctor_id) != Some(&report.request) {
                superseded += 1;
                continue;
            }
            self.loads.insert(doctor_id, load);
            applied += 1;
        }
        if superseded > 0 {
            debug!("{superseded} answers of request {} superseded by newer lookups", report.request);
        }
        MergeOutcome::Applied { applied, superseded }
    }

    pub fn load(&self, doctor_id: &DoctorId) -> Option<&DoctorLoad> {
        self.loads.get(doctor_id)
    }

    /// Existing count for a doctor, only if it is known for this round.
    pub fn known(&self, doctor_id: &DoctorId) -> Option<u32> {
        match self.loads.get(doctor_id) {
            Some(DoctorLoad::Known(n)) => Some(*n),
            _ => None,
        }
    }

    /// True when none of `doctors` is pending or failed.
    pub fn is_settled<'a>(&self, doctors: impl IntoIterator<Item = &'a DoctorId>) -> bool {
        doctors.into_iter().all(|d| self.known(d).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn request_needs_a_date() {
        let mut board = PrecheckBoard::new();
        assert!(board.request(&[Ulid::new()]).is_none());
        board.reset(Some(d(2025, 3, 10)));
        assert!(board.request(&[Ulid::new()]).is_some());
    }

    #[test]
    fn request_marks_pending_and_dedups() {
        let mut board = PrecheckBoard::new();
        board.reset(Some(d(2025, 3, 10)));
        let doc = Ulid::new();
        let req = board.request(&[doc, doc]).unwrap();
        assert_eq!(req.doctors, vec![doc]);
        assert_eq!(board.load(&doc), Some(&DoctorLoad::Pending));
        assert!(!board.is_settled([&doc]));
    }

    #[test]
    fn merge_current_round() {
        let mut board = PrecheckBoard::new();
        board.reset(Some(d(2025, 3, 10)));
        let (a, b) = (Ulid::new(), Ulid::new());
        let req = board.request(&[a, b]).unwrap();
        let report = PrecheckReport {
            round: req.round,
            request: req.request,
            date: req.date,
            loads: vec![(a, DoctorLoad::Known(1)), (b, DoctorLoad::Unavailable("timeout".into()))],
        };
        assert_eq!(board.merge(report), MergeOutcome::Applied { applied: 2, superseded: 0 });
        assert_eq!(board.known(&a), Some(1));
        assert_eq!(board.known(&b), None);
        assert!(board.is_settled([&a]));
        assert!(!board.is_settled([&a, &b]));
    }

    #[test]
    fn merge_discards_stale_round() {
        let mut board = PrecheckBoard::new();
        board.reset(Some(d(2025, 3, 10)));
        let doc = Ulid::new();
        let old = board.request(&[doc]).unwrap();
        let new_round = board.reset(Some(d(2025, 4, 7)));

        let outcome = board.merge(PrecheckReport {
            round: old.round,
            request: old.request,
            date: old.date,
            loads: vec![(doc, DoctorLoad::Known(0))],
        });
        assert_eq!(outcome, MergeOutcome::Stale { report: old.round, current: new_round });
        assert!(board.load(&doc).is_none());
    }

    fn answer(req: &PrecheckRequest, load: DoctorLoad) -> PrecheckReport {
        PrecheckReport {
            round: req.round,
            request: req.request,
            date: req.date,
            loads: req.doctors.iter().map(|&d| (d, load.clone())).collect(),
        }
    }

    #[test]
    fn older_request_answering_last_is_ignored() {
        let mut board = PrecheckBoard::new();
        board.reset(Some(d(2025, 3, 10)));
        let doc = Ulid::new();
        let first = board.request(&[doc]).unwrap();
        let second = board.request(&[doc]).unwrap();
        assert!(second.request > first.request);

        assert_eq!(
            board.merge(answer(&second, DoctorLoad::Known(2))),
            MergeOutcome::Applied { applied: 1, superseded: 0 }
        );
        assert_eq!(
            board.merge(answer(&first, DoctorLoad::Known(0))),
            MergeOutcome::Applied { applied: 0, superseded: 1 }
        );
        assert_eq!(board.known(&doc), Some(2));
    }

    #[test]
    fn older_answer_does_not_settle_newer_lookup() {
        let mut board = PrecheckBoard::new();
        board.reset(Some(d(2025, 3, 10)));
        let (a, b) = (Ulid::new(), Ulid::new());
        let first = board.request(&[a, b]).unwrap();
        let _second = board.request(&[b]).unwrap();

        board.merge(answer(&first, DoctorLoad::Known(0)));
        // `a` was only in the first request; `b` still waits on the second.
        assert_eq!(board.known(&a), Some(0));
        assert_eq!(board.load(&b), Some(&DoctorLoad::Pending));
        assert!(!board.is_settled([&a, &b]));
    }

    #[test]
    fn rounds_increase() {
        let mut board = PrecheckBoard::new();
        let r1 = board.reset(None);
        let r2 = board.reset(None);
        assert!(r2 > r1);
        assert_eq!(r2.to_string(), "round#2");
    }
}
