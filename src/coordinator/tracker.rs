// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transition tracking and completion detection.
//!
//! Two kinds of transition are recognized. Devices with an intended value
//! complete when the confirmed property equals it. Devices without
//! one complete when they report a terminal door status (`opened` or
//! `closed`).

use std::collections::{HashMap, HashSet};

use crate::device::{Device, PropertyName, PropertyValue, Serial};

/// Target a tracked device is expected to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntendedValue {
    /// Property to compare.
    pub property: PropertyName,
    /// Value that confirms completion.
    pub value: PropertyValue,
}

impl IntendedValue {
    /// Creates an intended value.
    #[must_use]
    pub fn new(property: PropertyName, value: impl Into<PropertyValue>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }

    /// Intended `power` level.
    #[must_use]
    pub fn power(on: bool) -> Self {
        Self::new(PropertyName::Power, i64::from(on))
    }

    /// Booleans and integers compare as `false == 0` and `true == 1`, so a
    /// device reporting `power` as either form confirms.
    fn is_confirmed_by(&self, device: &Device) -> bool {
        match (device.property(&self.property), &self.value) {
            (None, _) => false,
            (Some(PropertyValue::Bool(b)), PropertyValue::Int(n))
            | (Some(PropertyValue::Int(n)), PropertyValue::Bool(b)) => i64::from(*b) == *n,
            (Some(reported), intended) => reported == intended,
        }
    }
}

/// Result of inspecting a freshly refreshed device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Observation {
    /// Device was tracked and has completed; it is no longer tracked.
    Completed,
    /// Device is tracked and has not completed yet.
    Pending,
    /// Device was untracked but reported motion; it is now tracked.
    Started,
    /// Device is not tracked and nothing changed.
    Idle,
}

/// Set of serials in transition, with optional intended values.
#[derive(Debug, Clone, Default)]
pub(crate) struct TransitionTracker {
    serials: HashSet<Serial>,
    intended: HashMap<Serial, IntendedValue>,
}

impl TransitionTracker {
    /// Adds a serial. An intended value replaces any previous one; `None`
    /// drops a previous one.
    pub(crate) fn mark(&mut self, serial: Serial, intended: Option<IntendedValue>) -> bool {
        match intended {
            Some(value) => {
                self.intended.insert(serial.clone(), value);
            }
            None => {
                self.intended.remove(&serial);
            }
        }
        self.serials.insert(serial)
    }

    /// Removes a serial and its intended value. Returns `true` if it was tracked.
    pub(crate) fn clear(&mut self, serial: &Serial) -> bool {
        self.intended.remove(serial);
        self.serials.remove(serial)
    }

    pub(crate) fn contains(&self, serial: &Serial) -> bool {
        self.serials.contains(serial)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.serials.len()
    }

    pub(crate) fn intended(&self, serial: &Serial) -> Option<&IntendedValue> {
        self.intended.get(serial)
    }

    pub(crate) fn serials(&self) -> impl Iterator<Item = &Serial> {
        self.serials.iter()
    }

    /// Runs completion detection on a refreshed device and updates the set.
    pub(crate) fn observe(&mut self, device: &Device) -> Observation {
        let serial = device.serial();

        if !self.contains(serial) {
            return match device.door_status() {
                Some(status) if status.is_moving() => {
                    self.mark(serial.clone(), None);
                    Observation::Started
                }
                _ => Observation::Idle,
            };
        }

        let completed = match self.intended.get(serial) {
            Some(intended) => intended.is_confirmed_by(device),
            None => device.door_status().is_some_and(|s| s.is_terminal()),
        };

        if completed {
            self.clear(serial);
            Observation::Completed
        } else {
            Observation::Pending
        }
    }
}
