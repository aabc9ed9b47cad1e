// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adaptive polling.
//!
//! The [`UpdateCoordinator`] polls a [`DeviceSource`](crate::source::DeviceSource)
//! on a repeating timer. Its cadence depends on the transition set:
//!
//! - **Normal** period (30 s by default) while no device is in transition
//! - **Fast** period (2 s by default) while at least one device is
//!
//! Devices enter the transition set when a command is issued
//! ([`UpdateCoordinator::mark_transition`]) or when a door is seen moving,
//! and leave it when a refresh confirms their intended value or a terminal
//! door status.
//!
//! While fast, ticks refresh only the devices in transition. Every device is
//! still refreshed at least once per normal period, however long a
//! transition lasts.
//!
//! # Tick lifecycle
//!
//! ```text
//! Idle -> Authenticating -> FetchingRoster -> Refreshing -> Publishing -> Idle
//!              \________________\_________________\
//!                                                  -> Failed
//! ```
//!
//! A failed tick keeps the last published [`Roster`] and emits one
//! [`UpdateFailed`](crate::event::CoordinatorEvent::UpdateFailed) event. The
//! timer keeps running; consecutive failures back off according to the
//! [`BackoffPolicy`].

mod config;
mod roster;
mod scheduler;
mod state;
mod tracker;
mod update;

pub use config::{BackoffPolicy, CoordinatorConfig};
pub use roster::{RefreshScope, Roster};
pub use scheduler::Period;
pub use tracker::IntendedValue;
pub use update::{TickPhase, UpdateCoordinator};
