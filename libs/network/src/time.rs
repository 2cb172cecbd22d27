//! Wall clock helpers for latency probing
//!
//! Probe timestamps travel to the runtime and back as milliseconds since the
//! UNIX epoch, so they come from `SystemTime` rather than a monotonic clock.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

/// Current wall time in milliseconds since the UNIX epoch
///
/// Returns 0 if the system clock is set before 1970.
pub fn system_timestamp_ms() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        Err(e) => {
            warn!(error = %e, "System time before UNIX epoch");
            0
        }
    }
}

/// One-way latency estimate from a timestamp echo
///
/// Half the round trip, assuming a symmetric path. A clock step backwards
/// between send and receive yields zero, never a negative value.
pub fn latency_from_echo(sent_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(sent_ms)) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_is_half_round_trip() {
        assert_eq!(latency_from_echo(1_000, 1_080), Duration::from_millis(40));
        assert_eq!(latency_from_echo(1_000, 1_000), Duration::ZERO);
    }

    #[test]
    fn test_odd_round_trip_keeps_sub_millisecond() {
        assert_eq!(latency_from_echo(0, 3), Duration::from_micros(1_500));
    }

    #[test]
    fn test_latency_never_negative() {
        assert_eq!(latency_from_echo(5_000, 4_000), Duration::ZERO);
    }

    #[test]
    fn test_system_timestamp_is_recent() {
        // After 2020-09-13
        assert!(system_timestamp_ms() > 1_600_000_000_000);
    }
}
