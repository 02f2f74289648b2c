//! Hard limits and defaults for the scheduling engine.

/// Maximum shift slots a doctor may hold on one day (batch cap `K`).
pub const DEFAULT_MAX_SHIFTS_PER_DOCTOR: u32 = 2;

/// Days added to a start date when the operator gives no end date.
pub const DEFAULT_HORIZON_DAYS: i64 = 30;

/// Widest range a single creation batch may cover.
pub const MAX_PERIOD_DAYS: i64 = 366;

/// Widest window accepted by range queries (weekly grid, coverage).
pub const MAX_QUERY_WINDOW_DAYS: i64 = 62;

pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const MAX_SHIFTS_PER_BATCH: usize = 16;
pub const MAX_DOCTORS_PER_SHIFT: usize = 512;

/// Doctors checked in a single precheck round.
pub const MAX_PRECHECK_FANOUT: usize = 512;

pub const MAX_SEARCH_LEN: usize = 128;
pub const MAX_SHIFT_TYPE_LEN: usize = 64;

/// Calendar years accepted by the range calculator.
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 9999;
