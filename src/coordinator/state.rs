// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable polling state owned by the coordinator.

use std::time::Duration;

use tokio::time::Instant;

use crate::device::{Device, Serial};

use super::scheduler::{IntervalScheduler, Period};
use super::tracker::{IntendedValue, Observation, TransitionTracker};

/// A period switch, `(from, to)`.
pub(crate) type PeriodSwitch = Option<(Period, Period)>;

/// Transition set, scheduler and timestamps, kept consistent with each other.
///
/// Every method that touches the transition set re-derives the period, so
/// the set is non-empty exactly when the period is [`Period::Fast`].
#[derive(Debug)]
pub(crate) struct PollState {
    tracker: TransitionTracker,
    scheduler: IntervalScheduler,
    last_full_update: Option<Instant>,
    consecutive_failures: u32,
}

impl PollState {
    pub(crate) fn new(normal: Duration, fast: Duration, now: Instant) -> Self {
        Self {
            tracker: TransitionTracker::default(),
            scheduler: IntervalScheduler::new(normal, fast, now),
            last_full_update: None,
            consecutive_failures: 0,
        }
    }

    /// Marks a device; returns whether it was newly added and any period switch.
    pub(crate) fn mark(
        &mut self,
        serial: Serial,
        intended: Option<IntendedValue>,
        now: Instant,
    ) -> (bool, PeriodSwitch) {
        let added = self.tracker.mark(serial, intended);
        (added, self.sync_period(now))
    }

    /// Clears a device; returns whether it was tracked and any period switch.
    pub(crate) fn clear(&mut self, serial: &Serial, now: Instant) -> (bool, PeriodSwitch) {
        let removed = self.tracker.clear(serial);
        (removed, self.sync_period(now))
    }

    /// Runs completion detection for a refreshed device.
    pub(crate) fn observe(&mut self, device: &Device, now: Instant) -> (Observation, PeriodSwitch) {
        let observation = self.tracker.observe(device);
        (observation, self.sync_period(now))
    }

    fn sync_period(&mut self, now: Instant) -> PeriodSwitch {
        let from = self.scheduler.period();
        let to = if self.tracker.is_empty() {
            Period::Normal
        } else {
            Period::Fast
        };
        self.scheduler.set_period(to, now).then_some((from, to))
    }

    /// Returns `true` if the tick starting at `now` must refresh every device.
    pub(crate) fn needs_full_refresh(&self, now: Instant) -> bool {
        if self.scheduler.period() == Period::Normal {
            return true;
        }
        self.last_full_update
            .is_none_or(|last| now.saturating_duration_since(last) >= self.scheduler.normal())
    }

    pub(crate) fn record_full_update(&mut self, started: Instant) {
        self.last_full_update = Some(started);
    }

    pub(crate) fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    pub(crate) fn record_failure(&mut self) -> u32 {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_failures
    }

    /// Arms the timer for the next tick, backing off after failures.
    pub(crate) fn schedule_next(&mut self, now: Instant, backoff: &super::BackoffPolicy) {
        let delay = backoff.next_delay(self.consecutive_failures, self.scheduler.duration());
        self.scheduler.defer(now, delay);
    }

    pub(crate) fn rearm(&mut self, now: Instant) {
        self.scheduler.rearm(now);
    }

    pub(crate) fn is_tracked(&self, serial: &Serial) -> bool {
        self.tracker.contains(serial)
    }

    pub(crate) fn tracked(&self) -> Vec<Serial> {
        self.tracker.serials().cloned().collect()
    }

    pub(crate) fn intended(&self, serial: &Serial) -> Option<IntendedValue> {
        self.tracker.intended(serial).cloned()
    }

    pub(crate) fn transition_count(&self) -> usize {
        self.tracker.len()
    }

    pub(crate) fn period(&self) -> Period {
        self.scheduler.period()
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.scheduler.deadline()
    }

    pub(crate) fn last_full_update(&self) -> Option<Instant> {
        self.last_full_update
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}
