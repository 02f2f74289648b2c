use tracing::warn;

use crate::limits::{DEFAULT_HORIZON_DAYS, DEFAULT_MAX_SHIFTS_PER_DOCTOR, MAX_PERIOD_DAYS};

/// Rules applied to every creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingPolicy {
    /// `K`: shift slots a doctor may hold on one day.
    pub max_shifts_per_doctor: u32,
    /// Days added to a start date when no end date is given.
    pub default_horizon_days: i64,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            max_shifts_per_doctor: DEFAULT_MAX_SHIFTS_PER_DOCTOR,
            default_horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub policy: SchedulingPolicy,
    pub metrics_port: Option<u16>,
}

impl Config {
    /// Read `CLINICSHIFT_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    /// Unparsable or out-of-range values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SchedulingPolicy::default();

        let max_shifts_per_doctor = parse_var(&lookup, "CLINICSHIFT_MAX_SHIFTS_PER_DOCTOR")
            .filter(|k: &u32| *k >= 1)
            .unwrap_or(defaults.max_shifts_per_doctor);
        let default_horizon_days = parse_var(&lookup, "CLINICSHIFT_DEFAULT_HORIZON_DAYS")
            .filter(|d: &i64| (0..MAX_PERIOD_DAYS).contains(d))
            .unwrap_or(defaults.default_horizon_days);
        let metrics_port = parse_var(&lookup, "CLINICSHIFT_METRICS_PORT");

        Self {
            policy: SchedulingPolicy {
                max_shifts_per_doctor,
                default_horizon_days,
            },
            metrics_port,
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.policy.max_shifts_per_doctor, 2);
        assert_eq!(cfg.policy.default_horizon_days, 30);
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("CLINICSHIFT_MAX_SHIFTS_PER_DOCTOR", "3"),
            ("CLINICSHIFT_DEFAULT_HORIZON_DAYS", " 14 "),
            ("CLINICSHIFT_METRICS_PORT", "9100"),
        ]));
        assert_eq!(cfg.policy.max_shifts_per_doctor, 3);
        assert_eq!(cfg.policy.default_horizon_days, 14);
        assert_eq!(cfg.metrics_port, Some(9100));
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = Config::from_lookup(lookup(&[
            ("CLINICSHIFT_MAX_SHIFTS_PER_DOCTOR", "0"),
            ("CLINICSHIFT_DEFAULT_HORIZON_DAYS", "forever"),
            ("CLINICSHIFT_METRICS_PORT", "99999"),
        ]));
        assert_eq!(cfg, Config::default());
    }
}
