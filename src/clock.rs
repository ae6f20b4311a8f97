//! UTC ticks: 100 ns units since the Unix epoch.

use std::{fmt, sync, time};

/// Ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Source of the current time in UTC ticks.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Current time in UTC ticks.
    fn now_ticks(&self) -> i64;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ticks(&self) -> i64 {
        let now = chrono::Utc::now();
        now.timestamp() * TICKS_PER_SECOND + i64::from(now.timestamp_subsec_nanos() / 100)
    }
}

/// Clock that only moves when told to. Clones share the same time.
///
/// ```rust
/// use dynamodb_envelope::clock::{Clock, ManualClock, TICKS_PER_SECOND};
/// use std::time::Duration;
///
/// let clock = ManualClock::new(0);
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(clock.now_ticks(), 2 * TICKS_PER_SECOND);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock(sync::Arc<sync::atomic::AtomicI64>);

impl ManualClock {
    /// Clock starting at the given tick.
    pub fn new(ticks: i64) -> Self {
        Self(sync::Arc::new(sync::atomic::AtomicI64::new(ticks)))
    }

    /// Jump to the given tick.
    pub fn set(&self, ticks: i64) {
        self.0.store(ticks, sync::atomic::Ordering::SeqCst);
    }

    /// Move forward by a duration.
    pub fn advance(&self, duration: time::Duration) {
        self.0
            .fetch_add(duration_to_ticks(duration), sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ticks(&self) -> i64 {
        self.0.load(sync::atomic::Ordering::SeqCst)
    }
}

/// Length of a duration in ticks, saturating at `i64::MAX`.
pub fn duration_to_ticks(duration: time::Duration) -> i64 {
    i64::try_from(duration.as_nanos() / 100).unwrap_or(i64::MAX)
}

/// Unix epoch seconds of a tick value.
pub fn ticks_to_unix_seconds(ticks: i64) -> i64 {
    ticks.div_euclid(TICKS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::zero(time::Duration::ZERO, 0)]
    #[case::sub_tick(time::Duration::from_nanos(99), 0)]
    #[case::one_tick(time::Duration::from_nanos(100), 1)]
    #[case::millis(time::Duration::from_millis(3), 30_000)]
    #[case::seconds(time::Duration::from_secs(5), 5 * TICKS_PER_SECOND)]
    #[case::saturating(time::Duration::MAX, i64::MAX)]
    fn test_duration_to_ticks(#[case] duration: time::Duration, #[case] expected: i64) {
        assert_eq!(duration_to_ticks(duration), expected);
    }

    #[test]
    fn test_ticks_to_unix_seconds() {
        assert_eq!(ticks_to_unix_seconds(3 * TICKS_PER_SECOND + 9), 3);
        assert_eq!(ticks_to_unix_seconds(-1), -1);
    }

    #[test]
    fn test_manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(10);
        let other = clock.clone();
        other.advance(time::Duration::from_nanos(500));
        assert_eq!(clock.now_ticks(), 15);
        clock.set(3);
        assert_eq!(other.now_ticks(), 3);
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = chrono::Utc::now().timestamp();
        let ticks = SystemClock.now_ticks();
        let after = chrono::Utc::now().timestamp();
        assert!((before..=after).contains(&ticks_to_unix_seconds(ticks)));
    }
}
