// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account-level setup and teardown.
//!
//! A [`Hub`] ties one authenticated session to one coordinator and the
//! entities discovered in its first roster.

use crate::coordinator::{CoordinatorConfig, UpdateCoordinator};
use crate::entity::{self, GarageDoor, Light};
use crate::error::Result;
use crate::source::{DeviceSource, Session};

#[cfg(feature = "cloud")]
use crate::source::{CloudClient, CloudConfig};

/// A running coordinator with its entities.
///
/// # Examples
///
/// ```no_run
/// use nomaiq_lib::Hub;
/// use nomaiq_lib::coordinator::CoordinatorConfig;
/// use nomaiq_lib::entity::LightCommand;
/// use nomaiq_lib::source::CloudConfig;
///
/// #[tokio::main]
/// async fn main() -> nomaiq_lib::Result<()> {
///     let cloud = CloudConfig::new("user@example.com", "secret", "app-id", "app-secret");
///     let hub = Hub::connect(cloud, CoordinatorConfig::default()).await?;
///
///     for light in hub.lights() {
///         println!("{}: {:?}", light.name(), light.is_on());
///     }
///     if let Some(light) = hub.lights().first() {
///         let _ = light.turn_on(LightCommand::new().with_brightness(200)).await;
///     }
///
///     hub.shutdown().await
/// }
/// ```
#[derive(Debug)]
pub struct Hub<S> {
    coordinator: UpdateCoordinator<S>,
    lights: Vec<Light<S>>,
    garage_doors: Vec<GarageDoor<S>>,
}

#[cfg(feature = "cloud")]
impl Hub<CloudClient> {
    /// Signs in to the cloud service and sets up a hub.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the credentials are rejected. Any other
    /// error means the service is not ready and setup may be retried.
    pub async fn connect(cloud: CloudConfig, config: CoordinatorConfig) -> Result<Self> {
        let client = CloudClient::new(cloud)?;

        if let Err(e) = client.sign_in().await {
            if e.is_auth() {
                tracing::error!(error = %e, "Authentication failed");
            } else {
                tracing::warn!(error = %e, "Cloud service not ready");
            }
            return Err(e);
        }

        Self::with_source(client, config).await
    }
}

impl<S> Hub<S>
where
    S: Session + DeviceSource + 'static,
{
    /// Sets up a hub around a source whose session is already established.
    ///
    /// Runs the first refresh, starts the timer loop and discovers entities.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for an unusable configuration, or
    /// `Error::UpdateFailed` if the first refresh fails. Nothing keeps
    /// running in either case.
    pub async fn with_source(source: S, config: CoordinatorConfig) -> Result<Self> {
        let coordinator = UpdateCoordinator::new(source, config)?;
        let roster = coordinator.first_refresh().await?;
        coordinator.start()?;

        let entities = entity::discover(&coordinator, &roster);
        tracing::debug!(
            devices = roster.len(),
            lights = entities.lights.len(),
            garage_doors = entities.garage_doors.len(),
            "Hub ready"
        );

        Ok(Self {
            coordinator,
            lights: entities.lights,
            garage_doors: entities.garage_doors,
        })
    }

    /// Returns the coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &UpdateCoordinator<S> {
        &self.coordinator
    }

    /// Returns the lights.
    #[must_use]
    pub fn lights(&self) -> &[Light<S>] {
        &self.lights
    }

    /// Returns the garage doors.
    #[must_use]
    pub fn garage_doors(&self) -> &[GarageDoor<S>] {
        &self.garage_doors
    }

    /// Finds a light by serial.
    #[must_use]
    pub fn light(&self, serial: &str) -> Option<&Light<S>> {
        self.lights.iter().find(|l| l.serial().as_str() == serial)
    }

    /// Finds a garage door by serial.
    #[must_use]
    pub fn garage_door(&self, serial: &str) -> Option<&GarageDoor<S>> {
        self.garage_doors
            .iter()
            .find(|d| d.serial().as_str() == serial)
    }

    /// Stops polling and signs out.
    ///
    /// # Errors
    ///
    /// Returns the error from signing out; polling is stopped regardless.
    pub async fn shutdown(self) -> Result<()> {
        self.coordinator.stop().await;
        self.coordinator.source().sign_out().await
    }
}
