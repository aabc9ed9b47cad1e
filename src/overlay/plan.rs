// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered property writes.

use crate::device::{PropertyName, PropertyValue, Serial};
use crate::error::CommandError;
use crate::source::DeviceSource;

/// Property writes sent one at a time, in order.
///
/// Order matters: mode-dependent values such as colour only apply once the
/// mode has been written.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::device::{PropertyName, PropertyValue};
/// use nomaiq_lib::overlay::WritePlan;
///
/// let plan = WritePlan::new()
///     .then(PropertyName::Power, PropertyValue::Int(1))
///     .then(PropertyName::Mode, PropertyValue::from("white"));
///
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan.iter().next().map(|(name, _)| name), Some(&PropertyName::Power));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    writes: Vec<(PropertyName, PropertyValue)>,
}

impl WritePlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write.
    #[must_use]
    pub fn then(mut self, name: PropertyName, value: impl Into<PropertyValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a write in place.
    pub fn push(&mut self, name: PropertyName, value: impl Into<PropertyValue>) {
        self.writes.push((name, value.into()));
    }

    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns `true` if there is nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterates over the writes in order.
    pub fn iter(&self) -> impl Iterator<Item = &(PropertyName, PropertyValue)> {
        self.writes.iter()
    }

    /// Writes every property in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` naming the property that failed.
    pub async fn execute<S: DeviceSource>(
        &self,
        source: &S,
        serial: &Serial,
    ) -> Result<(), CommandError> {
        for (name, value) in &self.writes {
            source
                .set_property(serial, name, value)
                .await
                .map_err(|e| CommandError::new(serial.as_str(), name.as_str(), e))?;
        }
        Ok(())
    }
}
