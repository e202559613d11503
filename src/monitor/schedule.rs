use crate::clock::Millis;

use super::config::MonitorConfig;

/// Result of a single expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Nothing to watch.
    NoToken,
    /// The token crossed the threshold (or could not be read).
    Expired,
    /// Still valid; `remaining_ms` is measured to `exp`.
    Valid { remaining_ms: Millis },
}

/// When the monitor should run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Stop; both timers cleared.
    Disarm,
    /// Check again after this many milliseconds.
    After(Millis),
}

/// Next wake time after `outcome`.
///
/// The regular interval always stays armed. Once less than the warning
/// window remains, a one-shot re-check at `min(cap, remaining)` is scheduled
/// as well, and whichever fires first wins.
#[must_use]
pub fn next_wake(outcome: CheckOutcome, config: &MonitorConfig) -> Wake {
    match outcome {
        CheckOutcome::NoToken | CheckOutcome::Expired => Wake::Disarm,
        CheckOutcome::Valid { remaining_ms } if remaining_ms < config.warning_ms => {
            let one_shot = config.recheck_cap_ms.min(remaining_ms).max(1);
            Wake::After(one_shot.min(config.interval_ms))
        }
        CheckOutcome::Valid { .. } => Wake::After(config.interval_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_and_expired_disarm() {
        let config = MonitorConfig::default();
        assert_eq!(next_wake(CheckOutcome::NoToken, &config), Wake::Disarm);
        assert_eq!(next_wake(CheckOutcome::Expired, &config), Wake::Disarm);
    }

    #[test]
    fn far_from_expiry_uses_interval() {
        let config = MonitorConfig::default();
        let outcome = CheckOutcome::Valid {
            remaining_ms: 3_600_000,
        };
        assert_eq!(next_wake(outcome, &config), Wake::After(60_000));
    }

    #[test]
    fn ninety_seconds_left_rechecks_within_thirty() {
        let config = MonitorConfig::default();
        let outcome = CheckOutcome::Valid {
            remaining_ms: 90_000,
        };
        match next_wake(outcome, &config) {
            Wake::After(ms) => assert!(ms <= 30_000, "scheduled at {ms}"),
            Wake::Disarm => panic!("should stay armed"),
        }
    }

    #[test]
    fn short_remaining_wins_over_cap() {
        let config = MonitorConfig::default().with_margin_ms(0);
        let outcome = CheckOutcome::Valid { remaining_ms: 4_000 };
        assert_eq!(next_wake(outcome, &config), Wake::After(4_000));
    }

    #[test]
    fn short_interval_still_bounds_the_one_shot() {
        let config = MonitorConfig::default().with_interval_ms(10_000);
        let outcome = CheckOutcome::Valid {
            remaining_ms: 100_000,
        };
        assert_eq!(next_wake(outcome, &config), Wake::After(10_000));
    }
}
