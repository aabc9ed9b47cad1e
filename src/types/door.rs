// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Garage door status reported by the `door_status` property.

use std::fmt;

/// Status of a garage door opener.
///
/// `Opened` and `Closed` are terminal: a door reporting either is at rest.
/// `Opening` and `Closing` mean the door is mid-motion.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::types::DoorStatus;
///
/// assert!(DoorStatus::from("opened").is_terminal());
/// assert!(DoorStatus::from("closing").is_moving());
/// assert_eq!(DoorStatus::from("jammed"), DoorStatus::Other("jammed".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DoorStatus {
    /// Door is fully open.
    Opened,
    /// Door is fully closed.
    Closed,
    /// Door is moving up.
    Opening,
    /// Door is moving down.
    Closing,
    /// Any status this library does not know about.
    Other(String),
}

impl DoorStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Other(s) => s,
        }
    }

    /// Returns `true` for `Opened` and `Closed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Opened | Self::Closed)
    }

    /// Returns `true` for `Opening` and `Closing`.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

impl From<&str> for DoorStatus {
    fn from(s: &str) -> Self {
        match s {
            "opened" => Self::Opened,
            "closed" => Self::Closed,
            "opening" => Self::Opening,
            "closing" => Self::Closing,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
