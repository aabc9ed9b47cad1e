// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling period selection and timer deadline.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    /// Rest cadence; nothing is in transition.
    #[default]
    Normal,
    /// Fast cadence; at least one device is in transition.
    Fast,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Fast => f.write_str("fast"),
        }
    }
}

/// Owns the current period and the deadline of the next timer firing.
///
/// A period change re-arms the deadline one new period from the time of the
/// change. Setting the same period again leaves the deadline untouched.
#[derive(Debug, Clone)]
pub(crate) struct IntervalScheduler {
    normal: Duration,
    fast: Duration,
    period: Period,
    deadline: Instant,
}

impl IntervalScheduler {
    pub(crate) fn new(normal: Duration, fast: Duration, now: Instant) -> Self {
        Self {
            normal,
            fast,
            period: Period::Normal,
            deadline: now + normal,
        }
    }

    /// Switches period; returns `true` if it changed and the timer was re-armed.
    pub(crate) fn set_period(&mut self, period: Period, now: Instant) -> bool {
        if self.period == period {
            return false;
        }
        self.period = period;
        self.rearm(now);
        true
    }

    /// Schedules the next firing one period from `now`.
    pub(crate) fn rearm(&mut self, now: Instant) {
        self.deadline = now + self.duration();
    }

    /// Schedules the next firing `delay` from `now`.
    pub(crate) fn defer(&mut self, now: Instant, delay: Duration) {
        self.deadline = now + delay;
    }

    pub(crate) fn period(&self) -> Period {
        self.period
    }

    /// Length of the current period.
    pub(crate) fn duration(&self) -> Duration {
        match self.period {
            Period::Normal => self.normal,
            Period::Fast => self.fast,
        }
    }

    pub(crate) fn normal(&self) -> Duration {
        self.normal
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.deadline
    }
}
