// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The update coordinator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::device::{Device, Serial};
use crate::error::{AuthError, Error, Result, TransportError};
use crate::event::{CoordinatorEvent, EventBus};
use crate::source::{DeviceSource, Session};

use super::config::CoordinatorConfig;
use super::roster::{RefreshScope, Roster};
use super::scheduler::Period;
use super::state::{PeriodSwitch, PollState};
use super::tracker::{IntendedValue, Observation};

/// Step of the tick state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TickPhase {
    /// Between ticks.
    #[default]
    Idle,
    /// Checking and, if needed, refreshing the session.
    Authenticating,
    /// Fetching the device roster.
    FetchingRoster,
    /// Refreshing individual devices.
    Refreshing,
    /// Publishing the new roster.
    Publishing,
    /// The last tick failed. The next tick starts normally.
    Failed,
}

/// Completion record of the most recent tick.
#[derive(Debug, Clone, Default)]
struct TickRecord {
    finished: u64,
    failure: Option<Arc<Error>>,
}

struct Inner<S> {
    source: Arc<S>,
    config: CoordinatorConfig,
    state: Mutex<PollState>,
    phase: Mutex<TickPhase>,
    tick_lock: tokio::sync::Mutex<()>,
    ticks_started: AtomicU64,
    ticks: watch::Sender<TickRecord>,
    roster: watch::Sender<Arc<Roster>>,
    events: EventBus,
    refresh: Notify,
    rearm: Notify,
    out_of_band_pending: AtomicBool,
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Adaptive polling coordinator for one authenticated session.
///
/// Polls at the normal period while nothing is in transition and at the
/// fast period while at least one device is. Every tick either refreshes
/// every device (full) or only the devices in transition, runs completion
/// detection, and publishes a new [`Roster`]. A failed tick publishes
/// nothing; the last good roster stays visible and an
/// [`UpdateFailed`](CoordinatorEvent::UpdateFailed) event is emitted.
///
/// Cloning is cheap and yields a handle to the same coordinator.
///
/// # Examples
///
/// ```no_run
/// use nomaiq_lib::coordinator::{CoordinatorConfig, UpdateCoordinator};
/// use nomaiq_lib::source::{CloudClient, CloudConfig};
///
/// # async fn example() -> nomaiq_lib::Result<()> {
/// let client = CloudClient::new(CloudConfig::new("user", "pass", "id", "secret"))?;
/// client.sign_in().await?;
///
/// let coordinator = UpdateCoordinator::new(client, CoordinatorConfig::default())?;
/// coordinator.first_refresh().await?;
/// coordinator.start()?;
///
/// for device in coordinator.get_roster().devices() {
///     println!("{} ({})", device.name(), device.serial());
/// }
///
/// coordinator.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct UpdateCoordinator<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for UpdateCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for UpdateCoordinator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("UpdateCoordinator")
            .field("period", &state.period())
            .field("transitions", &state.transition_count())
            .field("phase", &*self.inner.phase.lock())
            .finish_non_exhaustive()
    }
}

impl<S> UpdateCoordinator<S>
where
    S: Session + DeviceSource + 'static,
{
    /// Creates a coordinator. Nothing is polled until [`first_refresh`],
    /// [`tick`] or [`start`] is called.
    ///
    /// [`first_refresh`]: Self::first_refresh
    /// [`tick`]: Self::tick
    /// [`start`]: Self::start
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration does not validate.
    pub fn new(source: S, config: CoordinatorConfig) -> Result<Self> {
        Self::from_shared(Arc::new(source), config)
    }

    /// Creates a coordinator around a source that is shared with other owners.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration does not validate.
    pub fn from_shared(source: Arc<S>, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;

        let state = PollState::new(
            config.normal_interval,
            config.transition_interval,
            Instant::now(),
        );
        let events = EventBus::new(config.event_capacity);

        Ok(Self {
            inner: Arc::new(Inner {
                source,
                state: Mutex::new(state),
                phase: Mutex::new(TickPhase::Idle),
                tick_lock: tokio::sync::Mutex::new(()),
                ticks_started: AtomicU64::new(0),
                ticks: watch::Sender::new(TickRecord::default()),
                roster: watch::Sender::new(Arc::new(Roster::empty())),
                events,
                refresh: Notify::new(),
                rearm: Notify::new(),
                out_of_band_pending: AtomicBool::new(false),
                cancel: Mutex::new(CancellationToken::new()),
                task: Mutex::new(None),
                config,
            }),
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Runs the mandatory first tick.
    ///
    /// Unlike timer-driven ticks, callers are expected to act on the error:
    /// a failure here means the session or the service is not usable yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::UpdateFailed` carrying the cause of the failed tick.
    pub async fn first_refresh(&self) -> Result<Arc<Roster>> {
        let roster = self.tick().await?;
        self.inner.state.lock().rearm(Instant::now());
        Ok(roster)
    }

    /// Starts the timer loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyRunning` if the loop is already running.
    pub fn start(&self) -> Result<()> {
        let mut task = self.inner.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(Error::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        *self.inner.cancel.lock() = cancel.clone();
        self.inner.state.lock().rearm(Instant::now());

        let this = self.clone();
        *task = Some(tokio::spawn(async move { this.run(cancel).await }));
        tracing::debug!("Coordinator started");
        Ok(())
    }

    /// Stops the timer loop and waits for it to exit. An in-flight tick is
    /// abandoned. Does nothing if the loop is not running.
    pub async fn stop(&self) {
        self.inner.cancel.lock().cancel();
        let handle = self.inner.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Coordinator loop ended abnormally");
            }
            tracing::debug!("Coordinator stopped");
        }
    }

    /// Returns `true` while the timer loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn run(self, cancel: CancellationToken) {
        loop {
            let deadline = self.inner.state.lock().deadline();

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.inner.refresh.notified() => {}
                () = self.inner.rearm.notified() => continue,
                () = tokio::time::sleep_until(deadline) => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = self.tick() => {}
            }

            self.inner
                .state
                .lock()
                .schedule_next(Instant::now(), &self.inner.config.backoff);
        }
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    /// Runs one tick now, waiting for any tick in flight to finish first.
    ///
    /// # Errors
    ///
    /// Returns `Error::UpdateFailed` carrying the cause if the tick failed.
    /// The previously published roster stays current in that case.
    pub async fn tick(&self) -> Result<Arc<Roster>> {
        let _guard = self.inner.tick_lock.lock().await;
        self.tick_locked().await
    }

    async fn tick_locked(&self) -> Result<Arc<Roster>> {
        self.inner.ticks_started.fetch_add(1, Ordering::SeqCst);
        let completion = TickCompletion {
            phase: &self.inner.phase,
            ticks: &self.inner.ticks,
            done: false,
        };

        let started = Instant::now();
        let timeout = self.inner.config.tick_timeout;
        let outcome = match tokio::time::timeout(timeout, self.run_tick(started)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportError::Timeout(
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            )
            .into()),
        };

        match outcome {
            Ok(roster) => {
                self.inner.state.lock().record_success();
                completion.finish(TickPhase::Idle, None);
                Ok(roster)
            }
            Err(e) => {
                let failures = self.inner.state.lock().record_failure();

                let cause = Arc::new(e);
                tracing::warn!(error = %cause, failures, "Update failed");
                self.inner.events.publish(CoordinatorEvent::UpdateFailed {
                    cause: Arc::clone(&cause),
                });
                completion.finish(TickPhase::Failed, Some(Arc::clone(&cause)));
                Err(Error::UpdateFailed(cause))
            }
        }
    }

    async fn run_tick(&self, started: Instant) -> Result<Arc<Roster>> {
        let source = &self.inner.source;

        self.set_phase(TickPhase::Authenticating);
        match source.check_auth() {
            Ok(()) => {}
            Err(Error::Auth(AuthError::Expiring)) => {
                tracing::debug!("Session expiring, refreshing");
                if let Err(e) = source.refresh_auth().await {
                    tracing::error!(error = %e, "Failed to refresh session");
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }

        self.set_phase(TickPhase::FetchingRoster);
        let mut devices = source.get_devices().await?;

        let previous = self.get_roster();
        let (full, tracked) = {
            let state = self.inner.state.lock();
            (state.needs_full_refresh(started), state.tracked())
        };
        let scope = if full {
            RefreshScope::Full
        } else {
            RefreshScope::TransitionOnly
        };
        tracing::debug!(
            ?scope,
            devices = devices.len(),
            tracked = tracked.len(),
            "Refreshing devices"
        );

        self.set_phase(TickPhase::Refreshing);
        let mut attempted = 0usize;
        let mut failed = Vec::new();
        let mut first_error = None;

        for device in &mut devices {
            if !full
                && !tracked.contains(device.serial())
                && carry_over(device, &previous)
            {
                continue;
            }

            attempted += 1;
            match source.refresh_device(device).await {
                Ok(()) => {
                    tracing::debug!(serial = %device.serial(), "Device refreshed");
                    self.observe(device);
                }
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    tracing::warn!(serial = %device.serial(), error = %e, "Device refresh failed");
                    failed.push(device.serial().clone());
                    carry_over(device, &previous);
                    first_error.get_or_insert(e);
                }
            }
        }

        if failed.len() == attempted
            && let Some(e) = first_error
        {
            return Err(e);
        }

        if full {
            self.inner.state.lock().record_full_update(started);
        }

        self.set_phase(TickPhase::Publishing);
        let roster = Arc::new(Roster::new(
            devices,
            scope,
            failed,
            previous.sequence() + 1,
        ));
        self.inner.roster.send_replace(Arc::clone(&roster));
        self.inner.events.publish(CoordinatorEvent::RosterPublished {
            roster: Arc::clone(&roster),
        });
        Ok(roster)
    }

    fn observe(&self, device: &Device) {
        let (observation, switch) = self.inner.state.lock().observe(device, Instant::now());
        let serial = device.serial();
        match observation {
            Observation::Completed => {
                tracing::debug!(%serial, "Transition completed");
                self.inner
                    .events
                    .publish(CoordinatorEvent::TransitionCompleted {
                        serial: serial.clone(),
                    });
            }
            Observation::Started => {
                tracing::debug!(%serial, "Device observed in motion");
                self.inner.events.publish(CoordinatorEvent::TransitionStarted {
                    serial: serial.clone(),
                });
            }
            Observation::Pending | Observation::Idle => {}
        }
        self.announce(switch);
    }

    fn announce(&self, switch: PeriodSwitch) {
        if let Some((from, to)) = switch {
            tracing::debug!(?from, ?to, "Polling period changed");
            self.inner
                .events
                .publish(CoordinatorEvent::PeriodChanged { from, to });
            self.inner.rearm.notify_one();
        }
    }

    fn set_phase(&self, phase: TickPhase) {
        *self.inner.phase.lock() = phase;
    }


    // ========================================================================
    // Refresh requests
    // ========================================================================

    /// Asks for a tick as soon as possible.
    ///
    /// With the timer loop running, the loop ticks immediately, or right
    /// after the tick in flight. Without it, a tick is spawned. Requests made
    /// before the requested tick begins are coalesced into it.
    pub fn request_refresh(&self) {
        if self.is_running() {
            self.inner.refresh.notify_one();
            return;
        }

        if self.inner.out_of_band_pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            let _guard = this.inner.tick_lock.lock().await;
            this.inner.out_of_band_pending.store(false, Ordering::SeqCst);
            let _ = this.tick_locked().await;
        });
    }

    /// Requests a refresh and waits for a tick that started after the request.
    ///
    /// # Errors
    ///
    /// Returns `Error::UpdateFailed` if that tick failed.
    pub async fn refresh_and_wait(&self) -> Result<Arc<Roster>> {
        let mut rx = self.inner.ticks.subscribe();
        let target = self.inner.ticks_started.load(Ordering::SeqCst) + 1;

        self.request_refresh();

        let record = rx
            .wait_for(|record| record.finished >= target)
            .await
            .map_err(|e| TransportError::ChannelClosed(e.to_string()))?
            .clone();

        match record.failure {
            Some(cause) => Err(Error::UpdateFailed(cause)),
            None => Ok(self.get_roster()),
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Marks a device as in transition, switching to the fast period.
    ///
    /// With an intended value the transition completes once a refresh
    /// confirms it; without one it completes on a terminal door status.
    pub fn mark_transition(&self, serial: &Serial, intended: Option<IntendedValue>) {
        let (added, switch) =
            self.inner
                .state
                .lock()
                .mark(serial.clone(), intended, Instant::now());
        if added {
            tracing::debug!(%serial, "Transition started");
            self.inner.events.publish(CoordinatorEvent::TransitionStarted {
                serial: serial.clone(),
            });
        }
        self.announce(switch);
    }

    /// Removes a device from the transition set.
    pub fn clear_transition(&self, serial: &Serial) {
        let (removed, switch) = self.inner.state.lock().clear(serial, Instant::now());
        if removed {
            tracing::debug!(%serial, "Transition cleared");
            self.inner
                .events
                .publish(CoordinatorEvent::TransitionCompleted {
                    serial: serial.clone(),
                });
        }
        self.announce(switch);
    }

    /// Returns `true` if the device is in the transition set.
    #[must_use]
    pub fn is_in_transition(&self, serial: &Serial) -> bool {
        self.inner.state.lock().is_tracked(serial)
    }

    /// Returns the intended value registered for a device, if any.
    #[must_use]
    pub fn intended_value(&self, serial: &Serial) -> Option<IntendedValue> {
        self.inner.state.lock().intended(serial)
    }

    /// Returns the serials currently in transition, in arbitrary order.
    #[must_use]
    pub fn transitions(&self) -> Vec<Serial> {
        self.inner.state.lock().tracked()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the last published roster.
    #[must_use]
    pub fn get_roster(&self) -> Arc<Roster> {
        Arc::clone(&*self.inner.roster.borrow())
    }

    /// Returns a receiver that sees every newly published roster.
    #[must_use]
    pub fn watch_roster(&self) -> watch::Receiver<Arc<Roster>> {
        self.inner.roster.subscribe()
    }

    /// Subscribes to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the current polling period.
    #[must_use]
    pub fn period(&self) -> Period {
        self.inner.state.lock().period()
    }

    /// Returns the step the tick state machine is in.
    #[must_use]
    pub fn phase(&self) -> TickPhase {
        *self.inner.phase.lock()
    }

    /// Returns the start time of the last full refresh.
    #[must_use]
    pub fn last_full_update(&self) -> Option<Instant> {
        self.inner.state.lock().last_full_update()
    }

    /// Returns the number of consecutive failed ticks.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state.lock().consecutive_failures()
    }

    /// Returns the deadline of the next timer-driven tick.
    #[must_use]
    pub fn next_tick_at(&self) -> Instant {
        self.inner.state.lock().deadline()
    }

    /// Returns the device source.
    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.inner.source
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }
}

/// Closes the books on one tick: sets the final phase and bumps the finished
/// count waiters key on. A tick dropped mid-way (the loop was stopped)
/// completes as cancelled.
struct TickCompletion<'a> {
    phase: &'a Mutex<TickPhase>,
    ticks: &'a watch::Sender<TickRecord>,
    done: bool,
}

impl TickCompletion<'_> {
    fn finish(mut self, phase: TickPhase, failure: Option<Arc<Error>>) {
        self.done = true;
        self.complete(phase, failure);
    }

    fn complete(&self, phase: TickPhase, failure: Option<Arc<Error>>) {
        *self.phase.lock() = phase;
        self.ticks.send_modify(|record| {
            record.finished += 1;
            record.failure = failure;
        });
    }
}

impl Drop for TickCompletion<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!("Tick cancelled");
            self.complete(TickPhase::Idle, Some(Arc::new(Error::Cancelled)));
        }
    }
}

/// Gives a device that was not refreshed its previous properties. Returns
/// `false` for a device the previous roster did not have.
fn carry_over(device: &mut Device, previous: &Roster) -> bool {
    match previous.get(device.serial().as_str()) {
        Some(prev) => {
            device.set_properties(prev.properties().clone());
            true
        }
        None => false,
    }
}
