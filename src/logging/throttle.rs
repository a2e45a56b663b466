//! Warning throttle for the replay loop.
//!
//! A bad feed can reject thousands of observations in a row. `RejectThrottle`
//! lets one warning through per interval and carries the count of the ones
//! held back, so the next admitted warning (or the end-of-stream summary)
//! reports them.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RejectThrottle {
    interval: Duration,
    last_admitted: Option<Instant>,
    held_back: u64,
    seen: u64,
}

impl RejectThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
            held_back: 0,
            seen: 0,
        }
    }

    /// Register one rejection.
    ///
    /// Returns `Some(n)` when a warning should be logged now, where `n` is the
    /// number of rejections held back since the previous warning. Returns
    /// `None` while inside the interval.
    pub fn admit(&mut self) -> Option<u64> {
        self.admit_at(Instant::now())
    }

    fn admit_at(&mut self, now: Instant) -> Option<u64> {
        self.seen += 1;
        match self.last_admitted {
            Some(last) if now.duration_since(last) < self.interval => {
                self.held_back += 1;
                None
            }
            _ => {
                self.last_admitted = Some(now);
                Some(std::mem::take(&mut self.held_back))
            }
        }
    }

    /// Rejections held back since the last admitted warning
    pub fn pending(&self) -> u64 {
        self.held_back
    }

    /// Every rejection registered, admitted or not
    pub fn seen(&self) -> u64 {
        self.seen
    }
}
