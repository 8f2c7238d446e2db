//! Rate limiting for repeatedly triggered work.
//!
//! Both utilities are driven by explicit timestamps instead of timers, so the caller
//! decides when to check them and tests can step time by hand.

use chrono::{DateTime, Duration, Utc};

/// Leading-edge rate limiter.
///
/// The first call fires immediately; calls within `window` of the last fired call are
/// dropped.
///
/// # Examples
///
/// ```
/// use digestboard::schedule::Throttle;
/// use chrono::{Duration, Utc};
///
/// let mut throttle = Throttle::new(Duration::milliseconds(100));
/// let t0 = Utc::now();
/// assert!(throttle.try_fire(t0));
/// assert!(!throttle.try_fire(t0 + Duration::milliseconds(50)));
/// assert!(throttle.try_fire(t0 + Duration::milliseconds(100)));
/// ```
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_fired_at: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired_at: None,
        }
    }

    /// Returns true if the call at `now` should run, recording it if so.
    pub fn try_fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_fired_at {
            Some(last) if now - last < self.window => false,
            _ => {
                self.last_fired_at = Some(now);
                true
            }
        }
    }
}

/// Trailing-edge debouncer.
///
/// Each call replaces the pending value and restarts the quiet window; the value is
/// released by [`Debounce::poll`] once `quiet` has passed without another call.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    quiet: Duration,
    pending: Option<(T, DateTime<Utc>)>,
}

impl<T> Debounce<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Records a call made at `now`, superseding any pending one.
    pub fn call(&mut self, value: T, now: DateTime<Utc>) {
        self.pending = Some((value, now + self.quiet));
    }

    /// Releases the pending value if its quiet window has passed by `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        let due = self.deadline()?;
        if now < due {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    /// When the pending value becomes due, if there is one
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
