//! Validation and materialisation of operator-directed shift assignments.

mod admission;
mod batch;
mod error;
mod precheck;
mod session;

pub use admission::{check_admissible, propose_range, RangeProposal};
pub use batch::{CandidateBatch, Eligibility, Selection};
pub use error::ScheduleError;
pub use precheck::{DoctorLoad, MergeOutcome, PrecheckBoard, PrecheckReport, PrecheckRequest, RoundId};
pub use session::CreationSession;
