use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

// ── Creation attempts ───────────────────────────────────────────

/// Counter: periods persisted.
pub const PERIODS_CREATED_TOTAL: &str = "clinicshift_periods_created_total";

/// Counter: creation attempts rejected. Labels: reason.
pub const CREATION_REJECTED_TOTAL: &str = "clinicshift_creation_rejected_total";

/// Histogram: doctor-shift slots per persisted period.
pub const PERIOD_SLOTS: &str = "clinicshift_period_slots";

// ── Precheck rounds ─────────────────────────────────────────────

/// Histogram: wall time of one precheck scatter/gather in seconds.
pub const PRECHECK_DURATION_SECONDS: &str = "clinicshift_precheck_duration_seconds";

/// Counter: individual doctor lookups that failed.
pub const PRECHECK_FAILURES_TOTAL: &str = "clinicshift_precheck_failures_total";

/// Counter: reports discarded because their round was abandoned.
pub const PRECHECK_STALE_TOTAL: &str = "clinicshift_precheck_stale_total";

// ── Read side ───────────────────────────────────────────────────

/// Counter: repository read failures. Labels: operation.
pub const REPOSITORY_ERRORS_TOTAL: &str = "clinicshift_repository_errors_total";

/// Gauge: doctors without any shift in the last reconciled week.
pub const COVERAGE_GAP_DOCTORS: &str = "clinicshift_coverage_gap_doctors";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
