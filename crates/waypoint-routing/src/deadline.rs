//! # Deadlines
//!
//! Searches are synchronous loops. To make a timeout meaningful they poll a
//! [`Deadline`] every `check_interval` inner iterations. A search overruns
//! its budget by at most one interval of work.

use std::time::{Duration, Instant};

use crate::error::SearchError;

/// Inner iterations between two clock reads.
pub const DEFAULT_CHECK_INTERVAL: u32 = 1024;

/// A point in time after which a computation must stop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Self {
        Self {
            started: Instant::now(),
            expires_at: None,
        }
    }

    /// Expire `budget` from now.
    pub fn after(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            expires_at: started.checked_add(budget),
        }
    }

    /// [`Deadline::after`] for `Some`, [`Deadline::none`] otherwise.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map_or_else(Self::none, Self::after)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Time left, or `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// The total budget, or `None` for an unbounded deadline.
    pub fn budget(&self) -> Option<Duration> {
        self.expires_at.map(|at| at.duration_since(self.started))
    }

    /// The error reported when this deadline has passed.
    pub fn exceeded(&self) -> SearchError {
        let budget_ms = self
            .budget()
            .map_or(u64::MAX, |b| u64::try_from(b.as_millis()).unwrap_or(u64::MAX));
        SearchError::DeadlineExceeded { budget_ms }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-search execution bounds.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub deadline: Deadline,
    /// Inner iterations between deadline checks. Zero is treated as one.
    pub check_interval: u32,
}

impl SearchOptions {
    pub fn with_deadline(deadline: Deadline) -> Self {
        Self {
            deadline,
            ..Self::default()
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            deadline: Deadline::none(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// Countdown that reads the clock once per interval.
///
/// The first tick always reads the clock, so an already-expired deadline
/// stops the search before any work.
pub(crate) struct DeadlineCheck {
    deadline: Deadline,
    interval: u32,
    countdown: u32,
}

impl DeadlineCheck {
    pub(crate) fn new(options: &SearchOptions) -> Self {
        Self {
            deadline: options.deadline,
            interval: options.check_interval.max(1),
            countdown: 0,
        }
    }

    pub(crate) fn tick(&mut self) -> Result<(), SearchError> {
        if self.countdown == 0 {
            if self.deadline.is_expired() {
                return Err(self.deadline.exceeded());
            }
            self.countdown = self.interval;
        }
        self.countdown -= 1;
        Ok(())
    }
}
