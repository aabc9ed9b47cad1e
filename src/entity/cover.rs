// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Garage door control surface.

use chrono::Utc;

use crate::coordinator::UpdateCoordinator;
use crate::device::{Device, PropertyName, PropertyValue, Serial};
use crate::error::{CommandError, Error};
use crate::source::{DeviceSource, Session};
use crate::types::DoorStatus;

/// A garage door opener backed by one device in the coordinator's roster.
///
/// The opener has a single trigger: open, close and stop all write a fresh
/// `door_toggle` value, and the door reacts according to its current motion.
///
/// A trigger is not followed by an immediate poll. The reported status stays
/// terminal until the motor starts, so the door is left to the next tick on
/// the fast period.
pub struct GarageDoor<S> {
    coordinator: UpdateCoordinator<S>,
    serial: Serial,
    name: String,
    unique_id: String,
}

impl<S> std::fmt::Debug for GarageDoor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarageDoor")
            .field("serial", &self.serial)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S> GarageDoor<S>
where
    S: Session + DeviceSource + 'static,
{
    /// Prefix of garage door unique ids.
    pub const UNIQUE_ID_PREFIX: &'static str = "nomaiq_cover_";

    /// Creates a garage door for `device`.
    #[must_use]
    pub fn new(coordinator: UpdateCoordinator<S>, device: &Device) -> Self {
        Self {
            coordinator,
            serial: device.serial().clone(),
            name: device.name().to_string(),
            unique_id: format!("{}{}", Self::UNIQUE_ID_PREFIX, device.serial()),
        }
    }

    /// Returns the device serial.
    #[must_use]
    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique id, `nomaiq_cover_<serial>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the confirmed door status.
    #[must_use]
    pub fn status(&self) -> Option<DoorStatus> {
        self.coordinator
            .get_roster()
            .get(self.serial.as_str())
            .and_then(Device::door_status)
    }

    /// Returns `true` if the door is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status() == Some(DoorStatus::Closed)
    }

    /// Returns `true` if the door is opening.
    #[must_use]
    pub fn is_opening(&self) -> bool {
        self.status() == Some(DoorStatus::Opening)
    }

    /// Returns `true` if the door is closing.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.status() == Some(DoorStatus::Closing)
    }

    /// Opens the door.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` if the trigger could not be written.
    pub async fn open(&self) -> Result<(), CommandError> {
        self.toggle("open").await
    }

    /// Closes the door.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` if the trigger could not be written.
    pub async fn close(&self) -> Result<(), CommandError> {
        self.toggle("close").await
    }

    /// Stops a moving door.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` if the trigger could not be written.
    pub async fn stop(&self) -> Result<(), CommandError> {
        self.toggle("stop").await
    }

    async fn toggle(&self, action: &'static str) -> Result<(), CommandError> {
        let value = PropertyValue::Str(Utc::now().timestamp().to_string());
        tracing::debug!(serial = %self.serial, action, %value, "Triggering garage door");

        let result = self
            .coordinator
            .source()
            .set_property(&self.serial, &PropertyName::DoorToggle, &value)
            .await
            .map_err(|e| CommandError::new(self.serial.as_str(), PropertyName::DoorToggle.as_str(), e));

        match &result {
            Ok(()) => self.coordinator.mark_transition(&self.serial, None),
            Err(e) => {
                tracing::error!(serial = %self.serial, action, error = %e, "Garage door command failed");
            }
        }
        result
    }

    /// Refreshes, then re-derives the transition state from the door status:
    /// a moving door is tracked, anything else is not.
    ///
    /// # Errors
    ///
    /// Returns `Error::UpdateFailed` if the refresh failed; the transition
    /// state is left unchanged in that case.
    pub async fn update(&self) -> Result<(), Error> {
        self.coordinator.refresh_and_wait().await?;

        if self.status().is_some_and(|s| s.is_moving()) {
            self.coordinator.mark_transition(&self.serial, None);
        } else {
            self.coordinator.clear_transition(&self.serial);
        }
        Ok(())
    }
}
