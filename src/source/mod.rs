// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collaborators the coordinator polls.
//!
//! The coordinator only needs two narrow capabilities: an authenticated
//! [`Session`] it can check and refresh, and a [`DeviceSource`] that lists
//! devices, refreshes a single device and writes single properties.
//!
//! [`CloudClient`] implements both against the vendor cloud service (feature
//! `cloud`, enabled by default). Tests and alternative backends can provide
//! their own implementations.

#[cfg(feature = "cloud")]
mod cloud;

#[cfg(feature = "cloud")]
pub use cloud::{CloudClient, CloudConfig, CredentialCheck, validate_credentials};

use std::future::Future;

use crate::device::{Device, PropertyName, PropertyValue, Serial};
use crate::error::Result;

/// An authenticated session with the remote service.
pub trait Session: Send + Sync {
    /// Checks whether the session can be used.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Expiring` when the access token should be
    /// refreshed before use, and any other `AuthError` when the session is
    /// unusable.
    fn check_auth(&self) -> Result<()>;

    /// Obtains a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the service refuses the
    /// refresh, or a transport error.
    fn refresh_auth(&self) -> impl Future<Output = Result<()>> + Send;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the service could not be reached.
    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Source of device snapshots.
pub trait DeviceSource: Send + Sync {
    /// Returns the current roster. Devices may come back without properties.
    ///
    /// # Errors
    ///
    /// Returns an auth or transport error.
    fn get_devices(&self) -> impl Future<Output = Result<Vec<Device>>> + Send;

    /// Re-reads all properties of one device, replacing them in place.
    ///
    /// # Errors
    ///
    /// Returns an auth or transport error; the device is left untouched.
    fn refresh_device(&self, device: &mut Device) -> impl Future<Output = Result<()>> + Send;

    /// Writes one property.
    ///
    /// # Errors
    ///
    /// Returns an auth or transport error.
    fn set_property(
        &self,
        serial: &Serial,
        name: &PropertyName,
        value: &PropertyValue,
    ) -> impl Future<Output = Result<()>> + Send;
}
