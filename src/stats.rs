//! # Simulated Threat Dashboard
//! Deterministic "live" statistics for the portal dashboard.
//!
//! Nothing here measures anything real: counters are derived from the
//! injected clock so they tick upward convincingly through the UTC day and
//! reset at midnight. Two snapshots taken at the same instant are
//! identical, which keeps the module trivially testable.

use std::sync::Arc;

use chrono::{DateTime, Datelike, SecondsFormat, Timelike};
use serde::Serialize;

use crate::clock::Clock;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatStats {
    /// Qualitative level shown on the dashboard banner.
    pub threat_level: String,
    pub attacks_blocked_today: u64,
    pub phishing_attempts_today: u64,
    pub malware_samples_today: u64,
    pub breaches_disclosed_this_month: u32,
    /// Per-hour attack counts for the current day, index 0 = midnight UTC.
    pub hourly_attack_trend: Vec<u32>,
    pub updated_at: String,
}

pub struct ThreatStatsSimulator {
    clock: Arc<dyn Clock>,
}

impl ThreatStatsSimulator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn snapshot(&self) -> ThreatStats {
        let now_ms = self.clock.now_millis();
        let dt = DateTime::from_timestamp_millis(now_ms as i64).unwrap_or_default();
        let secs_of_day = dt.num_seconds_from_midnight() as u64;
        let day_seed = now_ms / 86_400_000;
        let month_seed = (dt.year() as u64) * 12 + dt.month() as u64;

        // Steady per-second rates plus a day-specific offset so consecutive
        // days don't start from the same numbers.
        let attacks = secs_of_day * 17 / 10 + mix(day_seed) % 900;
        let phishing = secs_of_day * 7 / 10 + mix(day_seed ^ 0x5eed) % 400;
        let malware = secs_of_day * 3 / 10 + mix(day_seed ^ 0xbeef) % 150;
        let breaches = 2 + (mix(month_seed) % 5) as u32 + dt.day() / 6;

        let trend = (0..24u32)
            .map(|hour| {
                if hour > dt.hour() {
                    0
                } else {
                    (mix(day_seed ^ u64::from(hour) << 8) % 240 + 60) as u32
                }
            })
            .collect();

        ThreatStats {
            threat_level: threat_level(day_seed, dt.hour()),
            attacks_blocked_today: attacks,
            phishing_attempts_today: phishing,
            malware_samples_today: malware,
            breaches_disclosed_this_month: breaches,
            hourly_attack_trend: trend,
            updated_at: dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

fn threat_level(day_seed: u64, hour: u32) -> String {
    const LEVELS: &[&str] = &["Guarded", "Elevated", "High", "Elevated", "Guarded"];
    let idx = (mix(day_seed ^ u64::from(hour / 6)) % LEVELS.len() as u64) as usize;
    LEVELS[idx].to_string()
}

/// splitmix64 finalizer; cheap deterministic scatter for the simulation.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn snapshots_at_the_same_instant_are_identical() {
        let clock = ManualClock::at_millis(1_700_000_000_000);
        let sim = ThreatStatsSimulator::new(clock);
        assert_eq!(sim.snapshot(), sim.snapshot());
    }

    #[test]
    fn counters_grow_within_a_day() {
        let clock = ManualClock::at_millis(1_700_000_000_000);
        let sim = ThreatStatsSimulator::new(clock.clone());
        let before = sim.snapshot();
        clock.advance_secs(3_600);
        let after = sim.snapshot();
        assert!(after.attacks_blocked_today > before.attacks_blocked_today);
        assert!(after.phishing_attempts_today > before.phishing_attempts_today);
    }

    #[test]
    fn trend_has_24_buckets_and_future_hours_are_zero() {
        // 1970-01-01T02:00:00Z: hour 2 of the epoch day.
        let clock = ManualClock::at_millis(2 * 3_600 * 1_000);
        let sim = ThreatStatsSimulator::new(clock);
        let snap = sim.snapshot();
        assert_eq!(snap.hourly_attack_trend.len(), 24);
        assert!(snap.hourly_attack_trend[3..].iter().all(|&v| v == 0));
        assert!(snap.hourly_attack_trend[..3].iter().all(|&v| v > 0));
    }
}
