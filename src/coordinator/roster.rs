// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Published device rosters.

use chrono::{DateTime, Utc};

use crate::device::{Device, Serial};

/// Which devices a tick refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshScope {
    /// Every device in the roster.
    Full,
    /// Only devices in transition; others kept their previous snapshot.
    TransitionOnly,
}

/// Immutable result of one successful tick.
///
/// Replaced wholesale on every tick; resolve devices by serial on each read
/// rather than holding on to a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    devices: Vec<Device>,
    scope: RefreshScope,
    failed: Vec<Serial>,
    sequence: u64,
    published_at: Option<DateTime<Utc>>,
}

impl Roster {
    /// The roster visible before the first successful tick.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            scope: RefreshScope::Full,
            failed: Vec::new(),
            sequence: 0,
            published_at: None,
        }
    }

    pub(crate) fn new(
        devices: Vec<Device>,
        scope: RefreshScope,
        failed: Vec<Serial>,
        sequence: u64,
    ) -> Self {
        Self {
            devices,
            scope,
            failed,
            sequence,
            published_at: Some(Utc::now()),
        }
    }

    /// Devices in the order the source returned them.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Looks up a device by serial.
    #[must_use]
    pub fn get(&self, serial: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.serial().as_str() == serial)
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if the roster holds no devices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Scope of the tick that produced this roster.
    #[must_use]
    pub fn scope(&self) -> RefreshScope {
        self.scope
    }

    /// Devices whose refresh failed; they carry their previous snapshot.
    #[must_use]
    pub fn failed(&self) -> &[Serial] {
        &self.failed
    }

    /// Number of successful ticks up to and including this one; 0 before
    /// the first.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock time of publication, `None` before the first tick.
    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roster() {
        let roster = Roster::empty();
        assert!(roster.is_empty());
        assert_eq!(roster.sequence(), 0);
        assert!(roster.published_at().is_none());
    }

    #[test]
    fn lookup_by_serial() {
        let roster = Roster::new(
            vec![Device::new("A", "a"), Device::new("B", "b")],
            RefreshScope::Full,
            vec![Serial::from("B")],
            1,
        );
        assert_eq!(roster.get("B").map(Device::name), Some("b"));
        assert!(roster.get("C").is_none());
        assert_eq!(roster.failed(), &[Serial::from("B")]);
        assert!(roster.published_at().is_some());
    }
}
