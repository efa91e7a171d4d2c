use chrono::{DateTime, Local};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source read once per tick.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock for deterministic tests. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Time elapsed between `since` and `now`, zero if `now` is earlier.
///
/// Every timer in the crate (tile dwell, fixation gate, exit hold, session
/// limit) goes through this so all comparisons happen on `Duration`.
pub fn elapsed_since(since: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(since)
}

/// Pairs a monotonic instant with the local wall time observed at the same
/// moment, so later instants can be reported as wall-clock timestamps.
#[derive(Clone, Copy, Debug)]
pub struct WallAnchor {
    instant: Instant,
    wall: DateTime<Local>,
}

impl WallAnchor {
    pub fn new(instant: Instant, wall: DateTime<Local>) -> Self {
        Self { instant, wall }
    }

    pub fn capture(instant: Instant) -> Self {
        Self::new(instant, Local::now())
    }

    pub fn wall_time(&self, at: Instant) -> DateTime<Local> {
        let delta = if at >= self.instant {
            chrono::Duration::from_std(at - self.instant).unwrap_or(chrono::Duration::zero())
        } else {
            -chrono::Duration::from_std(self.instant - at).unwrap_or(chrono::Duration::zero())
        };
        self.wall + delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_since_saturates() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(250);
        assert_eq!(elapsed_since(t0, t1), Duration::from_millis(250));
        assert_eq!(elapsed_since(t1, t0), Duration::ZERO);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        let start = clock.now();
        other.advance_ms(1200);
        assert_eq!(elapsed_since(start, clock.now()), Duration::from_millis(1200));
    }

    #[test]
    fn wall_anchor_offsets_both_directions() {
        let t0 = Instant::now() + Duration::from_secs(10);
        let anchor = WallAnchor::capture(t0);
        let later = anchor.wall_time(t0 + Duration::from_millis(1500));
        let earlier = anchor.wall_time(t0 - Duration::from_millis(500));
        assert_eq!((later - anchor.wall_time(t0)).num_milliseconds(), 1500);
        assert_eq!((anchor.wall_time(t0) - earlier).num_milliseconds(), 500);
    }
}
