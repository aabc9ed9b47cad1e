// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshots.
//!
//! A [`Device`] is a plain snapshot: identity plus the property mapping
//! captured by its last refresh. Snapshots are produced by a
//! [`DeviceSource`](crate::source::DeviceSource) and published by the
//! coordinator as part of a [`Roster`](crate::coordinator::Roster).
//!
//! # Examples
//!
//! ```
//! use nomaiq_lib::device::{Device, PropertyName, PropertyValue};
//! use nomaiq_lib::types::DoorStatus;
//!
//! let door = Device::new("GDO-1", "Garage")
//!     .with_oem_model("gdo")
//!     .with_property(PropertyName::DoorStatus, PropertyValue::from("opening"));
//!
//! assert_eq!(door.door_status(), Some(DoorStatus::Opening));
//! assert!(door.property(&PropertyName::Power).is_none());
//! ```

mod kind;
mod property;
mod serial;

pub use kind::{DeviceKind, GARAGE_DOOR_OEM_MODEL, LightCapabilities};
pub use property::{Properties, PropertyName, PropertyValue};
pub use serial::Serial;

use crate::types::DoorStatus;

/// Snapshot of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    serial: Serial,
    name: String,
    model: String,
    oem_model: String,
    properties: Properties,
}

impl Device {
    /// Creates a device with no properties.
    #[must_use]
    pub fn new(serial: impl Into<Serial>, name: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            name: name.into(),
            model: String::new(),
            oem_model: String::new(),
            properties: Properties::new(),
        }
    }

    /// Sets the product model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the OEM model.
    #[must_use]
    pub fn with_oem_model(mut self, oem_model: impl Into<String>) -> Self {
        self.oem_model = oem_model.into();
        self
    }

    /// Sets one property.
    #[must_use]
    pub fn with_property(mut self, name: PropertyName, value: PropertyValue) -> Self {
        self.properties.insert(name, value);
        self
    }

    /// Returns the serial.
    #[must_use]
    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    /// Returns the product name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the product model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the OEM model.
    #[must_use]
    pub fn oem_model(&self) -> &str {
        &self.oem_model
    }

    /// Returns all properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns a property value, or `None` if it is absent.
    #[must_use]
    pub fn property(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn has_property(&self, name: &PropertyName) -> bool {
        self.properties.contains(name)
    }

    /// Replaces the whole property mapping.
    pub fn set_properties(&mut self, properties: Properties) {
        self.properties = properties;
    }

    /// Sets one property in place.
    pub fn set_property(&mut self, name: PropertyName, value: PropertyValue) {
        self.properties.insert(name, value);
    }

    /// Returns the door status, if the device reports one as a string.
    #[must_use]
    pub fn door_status(&self) -> Option<DoorStatus> {
        self.property(&PropertyName::DoorStatus)
            .and_then(PropertyValue::as_str)
            .map(DoorStatus::from)
    }
}
