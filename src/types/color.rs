// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color types for light control.
//!
//! Tunable-white lights store color temperature as 0-100 where 100 is the
//! coolest setting; consumers use mireds (153-500). Color lights store hue
//! and saturation as integers; hue is normalized into `[0, 360)`.

use std::fmt;

/// Color temperature as stored on the device (0-100, 100 = coolest).
///
/// # Examples
///
/// ```
/// use nomaiq_lib::types::ColorTemp;
///
/// let coolest = ColorTemp::from_mireds(153);
/// assert_eq!(coolest.value(), 100);
/// assert_eq!(coolest.to_mireds(), 153);
///
/// let warmest = ColorTemp::from_mireds(500);
/// assert_eq!(warmest.value(), 0);
/// assert_eq!(warmest.to_mireds(), 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColorTemp(u8);

impl ColorTemp {
    /// Coolest color temperature in mireds (~6500K).
    pub const MIN_MIREDS: u16 = 153;

    /// Warmest color temperature in mireds (~2000K).
    pub const MAX_MIREDS: u16 = 500;

    const SPAN: f64 = (Self::MAX_MIREDS - Self::MIN_MIREDS) as f64;

    /// Creates a color temperature from a raw property value, clamping to 0-100.
    #[must_use]
    pub fn from_device(raw: i64) -> Self {
        // Safe: clamped to 0..=100 first
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = raw.clamp(0, 100) as u8;
        Self(value)
    }

    /// Converts mireds to the device scale.
    ///
    /// Uses `100 - (mired - 153) * 100 / (500 - 153)`, rounded and clamped
    /// to 0-100. Out of range mireds are clamped first.
    #[must_use]
    pub fn from_mireds(mireds: u16) -> Self {
        let mireds = mireds.clamp(Self::MIN_MIREDS, Self::MAX_MIREDS);
        let raw = 100.0 - f64::from(mireds - Self::MIN_MIREDS) * 100.0 / Self::SPAN;
        // Safe: clamped to 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = raw.round().clamp(0.0, 100.0) as u8;
        Self(value)
    }

    /// Converts the device value to mireds.
    ///
    /// Uses `153 + (100 - value) * (500 - 153) / 100`, rounded.
    #[must_use]
    pub fn to_mireds(&self) -> u16 {
        let raw = f64::from(Self::MIN_MIREDS) + f64::from(100 - self.0) * Self::SPAN / 100.0;
        // Safe: value <= 100 keeps the result within 153..=500
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mireds = raw.round() as u16;
        mireds
    }

    /// Returns the device value (0-100).
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ColorTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mireds", self.to_mireds())
    }
}

/// Hue and saturation of a color light.
///
/// Hue is kept in `[0, 360)`, saturation in `[0, 100]`.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::types::HsColor;
///
/// let color = HsColor::new(400.0, 80.0);
/// assert!((color.hue() - 40.0).abs() < f64::EPSILON);
/// assert_eq!(color.device_hue(), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsColor {
    hue: f64,
    saturation: f64,
}

impl HsColor {
    /// Creates a color, normalizing hue modulo 360 and clamping saturation.
    #[must_use]
    pub fn new(hue: f64, saturation: f64) -> Self {
        Self {
            hue: hue.rem_euclid(360.0),
            saturation: saturation.clamp(0.0, 100.0),
        }
    }

    /// Creates a color from raw `color_select` and `color_saturation` values.
    #[must_use]
    pub fn from_device(hue: i64, saturation: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let color = Self::new(hue.rem_euclid(360) as f64, saturation as f64);
        color
    }

    /// Returns the hue in degrees, `[0, 360)`.
    #[must_use]
    pub fn hue(&self) -> f64 {
        self.hue
    }

    /// Returns the saturation, `[0, 100]`.
    #[must_use]
    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Returns the hue as written to the device (truncated).
    #[must_use]
    pub fn device_hue(&self) -> i64 {
        // Safe: hue is within [0, 360)
        #[allow(clippy::cast_possible_truncation)]
        let hue = self.hue.trunc() as i64;
        hue
    }

    /// Returns the saturation as written to the device (truncated).
    #[must_use]
    pub fn device_saturation(&self) -> i64 {
        // Safe: saturation is within [0, 100]
        #[allow(clippy::cast_possible_truncation)]
        let saturation = self.saturation.trunc() as i64;
        saturation
    }
}

impl fmt::Display for HsColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hs({:.0}, {:.0}%)", self.hue, self.saturation)
    }
}
