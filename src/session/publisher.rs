//! Throttled snapshot publication
//!
//! Ingestion can run arbitrarily fast; consumers should not. The
//! [`ThrottledPublisher`] bounds how often the aggregated state is pushed
//! out while every underlying append still happens synchronously. Only the
//! notification is throttled, never the data capture.
//!
//! The publisher is a passive state machine: callers pass the current
//! [`Instant`] into every operation and drive it with [`poll`]. The worker
//! feeds it from an injected [`Clock`], which keeps the timing behavior
//! testable against a virtual clock.
//!
//! [`poll`]: ThrottledPublisher::poll

use std::time::{Duration, Instant};

/// Source of the current instant, injectable for tests
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Trailing-edge publish throttle with request coalescing
///
/// Requests made while a publication is pending replace the pending payload;
/// the actual publication is deferred until the configured interval has
/// elapsed since the last one. The first request after an idle period longer
/// than the interval publishes at the next poll.
#[derive(Debug)]
pub struct ThrottledPublisher<T> {
    /// Minimum spacing between actual publications
    interval: Duration,
    /// Latest requested payload, not yet published
    pending: Option<T>,
    /// When the pending payload becomes publishable
    deadline: Option<Instant>,
    /// When the last actual publication happened
    last_published: Option<Instant>,
}

impl<T> ThrottledPublisher<T> {
    /// Create a publisher with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            deadline: None,
            last_published: None,
        }
    }

    /// Request a publication, coalescing with any pending request
    ///
    /// The first request ever defers by a full interval (trailing edge).
    /// Later requests defer to the point where the interval has elapsed
    /// since the last actual publication, which may already be in the past.
    pub fn request(&mut self, now: Instant, value: T) {
        self.pending = Some(value);
        if self.deadline.is_none() {
            let due = match self.last_published {
                Some(last) => now.max(last + self.interval),
                None => now + self.interval,
            };
            self.deadline = Some(due);
        }
    }

    /// Take the pending payload if its deadline has been reached
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(due) if now >= due => {
                self.deadline = None;
                self.last_published = Some(now);
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Take the pending payload immediately, disarming the deadline
    ///
    /// Used on disconnect so the final state is never lost to a pending
    /// throttle window.
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        self.deadline = None;
        if self.pending.is_some() {
            self.last_published = Some(now);
        }
        self.pending.take()
    }

    /// Drop the pending payload and disarm the deadline without publishing
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    /// The armed deadline, for event-loop timeout computation
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if a request is waiting to be published
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The configured minimum interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the minimum interval; affects future deadlines only
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_trailing_edge_coalescing() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));

        p.request(at(base, 0), "s0");
        p.request(at(base, 10), "s10");
        p.request(at(base, 50), "s50");

        // Nothing fires before the window elapses
        assert_eq!(p.poll(at(base, 100)), None);
        assert_eq!(p.poll(at(base, 249)), None);

        // The latest payload fires once the window elapses
        assert_eq!(p.poll(at(base, 250)), Some("s50"));
        assert_eq!(p.poll(at(base, 251)), None);

        // A request inside the next window defers to last publish + interval
        p.request(at(base, 260), "s260");
        assert_eq!(p.next_deadline(), Some(at(base, 500)));
        assert_eq!(p.poll(at(base, 499)), None);
        assert_eq!(p.poll(at(base, 500)), Some("s260"));
    }

    #[test]
    fn test_flush_publishes_pending_despite_window() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));

        p.request(at(base, 0), "s0");
        p.request(at(base, 50), "s50");
        assert_eq!(p.poll(at(base, 250)), Some("s50"));

        p.request(at(base, 260), "s260");

        // Disconnect at t=300 flushes the pending state immediately
        assert_eq!(p.flush(at(base, 300)), Some("s260"));
        assert_eq!(p.next_deadline(), None);
        assert_eq!(p.poll(at(base, 600)), None);
    }

    #[test]
    fn test_flush_with_nothing_pending() {
        let base = Instant::now();
        let mut p: ThrottledPublisher<&str> = ThrottledPublisher::new(Duration::from_millis(250));
        assert_eq!(p.flush(at(base, 10)), None);
    }

    #[test]
    fn test_cancel_suppresses_pending_publish() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));

        p.request(at(base, 0), "stale");
        p.cancel();

        assert!(!p.has_pending());
        assert_eq!(p.poll(at(base, 250)), None);
    }

    #[test]
    fn test_request_after_idle_gap_fires_at_next_poll() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));

        p.request(at(base, 0), "a");
        assert_eq!(p.poll(at(base, 250)), Some("a"));

        // The interval has long elapsed by t=1000, so no further deferral
        p.request(at(base, 1000), "b");
        assert_eq!(p.next_deadline(), Some(at(base, 1000)));
        assert_eq!(p.poll(at(base, 1000)), Some("b"));
    }

    #[test]
    fn test_late_poll_still_fires_once() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));

        p.request(at(base, 0), "a");

        // The poll arrives late; the publish happens then, not twice
        assert_eq!(p.poll(at(base, 400)), Some("a"));
        assert_eq!(p.poll(at(base, 401)), None);
    }

    #[test]
    fn test_set_interval_affects_future_deadlines() {
        let base = Instant::now();
        let mut p = ThrottledPublisher::new(Duration::from_millis(250));
        p.set_interval(Duration::from_millis(50));

        p.request(at(base, 0), "a");
        assert_eq!(p.next_deadline(), Some(at(base, 50)));
    }
}
