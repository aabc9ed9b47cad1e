// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator notifications.
//!
//! The coordinator announces published rosters, failed ticks, period
//! switches and transition changes as [`CoordinatorEvent`]s. Subscribers
//! that only care about the latest data can use
//! [`UpdateCoordinator::watch_roster`](crate::coordinator::UpdateCoordinator::watch_roster)
//! instead.
//!
//! # Examples
//!
//! ```no_run
//! use nomaiq_lib::coordinator::UpdateCoordinator;
//! use nomaiq_lib::event::CoordinatorEvent;
//! use nomaiq_lib::source::{DeviceSource, Session};
//!
//! async fn log_failures<S>(coordinator: UpdateCoordinator<S>)
//! where
//!     S: Session + DeviceSource + 'static,
//! {
//!     let mut rx = coordinator.subscribe();
//!     while let Ok(event) = rx.recv().await {
//!         if let CoordinatorEvent::UpdateFailed { cause } = event {
//!             eprintln!("poll failed: {cause}");
//!         }
//!     }
//! }
//! ```

mod coordinator_event;
mod event_bus;

pub use coordinator_event::CoordinatorEvent;
pub(crate) use event_bus::EventBus;
