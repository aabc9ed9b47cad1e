// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator configuration.

use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for an [`UpdateCoordinator`](super::UpdateCoordinator).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use nomaiq_lib::coordinator::{BackoffPolicy, CoordinatorConfig};
///
/// let config = CoordinatorConfig::default()
///     .with_transition_interval(Duration::from_secs(1))
///     .with_backoff(BackoffPolicy::disabled());
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.normal_interval, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Polling period while nothing is in transition.
    pub normal_interval: Duration,
    /// Polling period while at least one device is in transition.
    pub transition_interval: Duration,
    /// Upper bound on the duration of a single tick.
    pub tick_timeout: Duration,
    /// Deferral applied after consecutive failed ticks.
    pub backoff: BackoffPolicy,
    /// Capacity of the event bus.
    pub event_capacity: usize,
}

impl CoordinatorConfig {
    /// Default normal polling period.
    pub const DEFAULT_NORMAL_INTERVAL: Duration = Duration::from_secs(30);
    /// Default transition polling period.
    pub const DEFAULT_TRANSITION_INTERVAL: Duration = Duration::from_secs(2);
    /// Default tick timeout.
    pub const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default event bus capacity.
    pub const DEFAULT_EVENT_CAPACITY: usize = 256;

    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the normal polling period.
    #[must_use]
    pub fn with_normal_interval(mut self, interval: Duration) -> Self {
        self.normal_interval = interval;
        self
    }

    /// Sets the transition polling period.
    #[must_use]
    pub fn with_transition_interval(mut self, interval: Duration) -> Self {
        self.transition_interval = interval;
        self
    }

    /// Sets the tick timeout.
    #[must_use]
    pub fn with_tick_timeout(mut self, timeout: Duration) -> Self {
        self.tick_timeout = timeout;
        self
    }

    /// Sets the backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if an interval or the timeout is zero,
    /// the transition interval is longer than the normal interval, or the
    /// event capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.normal_interval.is_zero() || self.transition_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "polling intervals must be greater than zero".to_string(),
            ));
        }
        if self.transition_interval > self.normal_interval {
            return Err(Error::InvalidConfig(format!(
                "transition interval {:?} is longer than normal interval {:?}",
                self.transition_interval, self.normal_interval
            )));
        }
        if self.tick_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "tick timeout must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            normal_interval: Self::DEFAULT_NORMAL_INTERVAL,
            transition_interval: Self::DEFAULT_TRANSITION_INTERVAL,
            tick_timeout: Self::DEFAULT_TICK_TIMEOUT,
            backoff: BackoffPolicy::default(),
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Bounded exponential backoff applied after failed ticks.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use nomaiq_lib::coordinator::BackoffPolicy;
///
/// let policy = BackoffPolicy::new()
///     .with_initial_delay(Duration::from_secs(1))
///     .with_max_delay(Duration::from_secs(10));
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
/// assert_eq!(policy.delay_for_attempt(8), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Whether failed ticks defer the next one.
    pub enabled: bool,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Upper bound on the delay.
    pub max_delay: Duration,
    /// Growth factor per additional failure.
    pub multiplier: f32,
}

impl BackoffPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that never defers; failed ticks retry on the
    /// regular schedule.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Calculates the delay for a given attempt, starting at 0.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let multiplier = self
            .multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        // Safe: initial_delay is seconds/minutes, far from f32 precision limits
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.initial_delay.as_millis() as f32 * multiplier;

        // Safe: saturating float-to-int cast, then capped by max_delay
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns how long to wait before the next tick after `failures`
    /// consecutive failed ticks, given the current polling period.
    #[must_use]
    pub fn next_delay(&self, failures: u32, period: Duration) -> Duration {
        if !self.enabled || failures == 0 {
            return period;
        }
        period.max(self.delay_for_attempt(failures - 1))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            multiplier: 2.0,
        }
    }
}
