// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light mode types.
//!
//! [`LightMode`] is what the device stores in its `mode` property.
//! [`ColorMode`] is what a light exposes to consumers.

use std::fmt;

/// Value of a light's `mode` property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LightMode {
    /// Tunable white; `color_temp` applies.
    White,
    /// Color; `color_select` and `color_saturation` apply.
    Colour,
    /// Any mode this library does not know about.
    Other(String),
}

impl LightMode {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::White => "white",
            Self::Colour => "colour",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for LightMode {
    fn from(s: &str) -> Self {
        match s {
            "white" => Self::White,
            "colour" => Self::Colour,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color mode a light exposes to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorMode {
    /// On/off only.
    OnOff,
    /// Dimmable.
    Brightness,
    /// Tunable white, reported in mireds.
    ColorTemp,
    /// Hue and saturation.
    Hs,
}
