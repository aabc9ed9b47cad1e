// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for light control.
//!
//! Lights store brightness as a percentage (0-100) while consumers work on
//! the 0-255 level scale. This type holds the device value and performs the
//! rounding conversion in both directions.

use std::fmt;

use crate::error::ValueError;

/// Brightness as stored on the device (0-100).
///
/// # Examples
///
/// ```
/// use nomaiq_lib::types::Brightness;
///
/// let full = Brightness::from_level(255);
/// assert_eq!(full.value(), 100);
/// assert_eq!(full.to_level(), 255);
///
/// assert!(Brightness::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness (0%).
    pub const MIN: Self = Self(0);

    /// Maximum brightness (100%).
    pub const MAX: Self = Self(100);

    /// Creates a brightness from a device value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness from a raw property value, clamping to 0-100.
    #[must_use]
    pub fn from_device(raw: i64) -> Self {
        // Safe: clamped to 0..=100 first
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = raw.clamp(0, 100) as u8;
        Self(value)
    }

    /// Converts a consumer level (0-255) to the device scale.
    ///
    /// Uses `round(level * 100 / 255)`.
    #[must_use]
    pub fn from_level(level: u8) -> Self {
        // Safe: level <= 255, so the result is within 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = (f64::from(level) * 100.0 / 255.0).round() as u8;
        Self(value)
    }

    /// Converts the device value to the consumer level (0-255).
    ///
    /// Uses `round(value * 255 / 100)`.
    #[must_use]
    pub fn to_level(&self) -> u8 {
        // Safe: value <= 100, so the result is within 0..=255
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let level = (f64::from(self.0) * 255.0 / 100.0).round() as u8;
        level
    }

    /// Returns the device value (0-100).
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
