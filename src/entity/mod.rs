// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controllable entities built on the coordinator.
//!
//! - [`Light`] - on/off, brightness, color temperature and colour, with
//!   optimistic reads while commands are in flight
//! - [`GarageDoor`] - open, close and stop through a single trigger
//!
//! [`discover`] turns a roster into entities.

mod cover;
mod light;

pub use cover::GarageDoor;
pub use light::{Light, LightCommand, LightField, LightValue};

use crate::coordinator::{Roster, UpdateCoordinator};
use crate::device::DeviceKind;
use crate::source::{DeviceSource, Session};

/// Entities found in a roster.
#[derive(Debug)]
pub struct Entities<S> {
    /// Lights.
    pub lights: Vec<Light<S>>,
    /// Garage doors.
    pub garage_doors: Vec<GarageDoor<S>>,
}

impl<S> Default for Entities<S> {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            garage_doors: Vec::new(),
        }
    }
}

/// Creates an entity for every supported device in `roster`.
pub fn discover<S>(coordinator: &UpdateCoordinator<S>, roster: &Roster) -> Entities<S>
where
    S: Session + DeviceSource + 'static,
{
    let mut entities = Entities::default();
    for device in roster.devices() {
        match DeviceKind::detect(device) {
            DeviceKind::Light(_) => entities
                .lights
                .push(Light::new(coordinator.clone(), device)),
            DeviceKind::GarageDoor => entities
                .garage_doors
                .push(GarageDoor::new(coordinator.clone(), device)),
            DeviceKind::Unsupported => {
                tracing::debug!(serial = %device.serial(), model = device.model(), "Skipping unsupported device");
            }
        }
    }
    entities
}
