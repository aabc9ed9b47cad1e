// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device classification.
//!
//! The service does not say what a device is, so the kind is inferred from
//! the OEM model and from which properties a refreshed snapshot carries.

use crate::types::ColorMode;

use super::{Device, PropertyName};

/// OEM model reported by garage door openers.
pub const GARAGE_DOOR_OEM_MODEL: &str = "gdo";

/// What a device is, as far as this library is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// A light with the given capabilities.
    Light(LightCapabilities),
    /// A garage door opener.
    GarageDoor,
    /// Anything else; polled but not controlled.
    Unsupported,
}

impl DeviceKind {
    /// Classifies a device from its latest snapshot.
    ///
    /// Garage doors are recognized by OEM model. Lights need both `power`
    /// and `voice_data` properties, so an unrefreshed device is never a light.
    ///
    /// # Examples
    ///
    /// ```
    /// use nomaiq_lib::device::{Device, DeviceKind, PropertyName, PropertyValue};
    ///
    /// let door = Device::new("GDO-1", "Garage").with_oem_model("gdo");
    /// assert_eq!(DeviceKind::detect(&door), DeviceKind::GarageDoor);
    ///
    /// let light = Device::new("L-1", "Porch")
    ///     .with_property(PropertyName::Power, PropertyValue::Int(0))
    ///     .with_property(PropertyName::VoiceData, PropertyValue::from("Porch light"));
    /// assert!(matches!(DeviceKind::detect(&light), DeviceKind::Light(_)));
    /// ```
    #[must_use]
    pub fn detect(device: &Device) -> Self {
        if device.oem_model() == GARAGE_DOOR_OEM_MODEL {
            return Self::GarageDoor;
        }
        if device.has_property(&PropertyName::Power) && device.has_property(&PropertyName::VoiceData)
        {
            return Self::Light(LightCapabilities::detect(device));
        }
        Self::Unsupported
    }
}

/// Optional features of a light.
///
/// Every light supports on/off and brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightCapabilities {
    /// Supports hue and saturation.
    pub color: bool,
    /// Supports tunable white.
    pub white: bool,
}

impl LightCapabilities {
    /// Brightness only.
    #[must_use]
    pub const fn dimmable() -> Self {
        Self {
            color: false,
            white: false,
        }
    }

    /// Color and tunable white.
    #[must_use]
    pub const fn full_color() -> Self {
        Self {
            color: true,
            white: true,
        }
    }

    /// Detects capabilities from the properties of a refreshed device.
    #[must_use]
    pub fn detect(device: &Device) -> Self {
        Self {
            color: device.has_property(&PropertyName::ColorSelect)
                && device.has_property(&PropertyName::ColorSaturation),
            white: device.has_property(&PropertyName::ColorTemp),
        }
    }

    /// Returns the color modes a light with these capabilities supports.
    #[must_use]
    pub fn supported_color_modes(&self) -> Vec<ColorMode> {
        let mut modes = vec![ColorMode::OnOff, ColorMode::Brightness];
        if self.white {
            modes.push(ColorMode::ColorTemp);
        }
        if self.color {
            modes.push(ColorMode::Hs);
        }
        modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PropertyValue;

    fn light() -> Device {
        Device::new("L-1", "Light")
            .with_property(PropertyName::Power, PropertyValue::Int(1))
            .with_property(PropertyName::VoiceData, PropertyValue::from("Porch"))
    }

    #[test]
    fn garage_door_by_oem_model() {
        let door = Device::new("GDO-1", "Garage").with_oem_model("gdo");
        assert_eq!(DeviceKind::detect(&door), DeviceKind::GarageDoor);
    }

    #[test]
    fn light_needs_power_and_voice_data() {
        let only_power =
            Device::new("L-2", "Plug").with_property(PropertyName::Power, PropertyValue::Int(1));
        assert_eq!(DeviceKind::detect(&only_power), DeviceKind::Unsupported);

        assert_eq!(
            DeviceKind::detect(&light()),
            DeviceKind::Light(LightCapabilities::dimmable())
        );
    }

    #[test]
    fn color_needs_hue_and_saturation() {
        let hue_only = light().with_property(PropertyName::ColorSelect, PropertyValue::Int(0));
        assert!(!LightCapabilities::detect(&hue_only).color);

        let color = hue_only.with_property(PropertyName::ColorSaturation, PropertyValue::Int(0));
        assert!(LightCapabilities::detect(&color).color);
    }

    #[test]
    fn supported_modes() {
        assert_eq!(
            LightCapabilities::dimmable().supported_color_modes(),
            vec![ColorMode::OnOff, ColorMode::Brightness]
        );
        assert_eq!(
            LightCapabilities::full_color().supported_color_modes(),
            vec![
                ColorMode::OnOff,
                ColorMode::Brightness,
                ColorMode::ColorTemp,
                ColorMode::Hs
            ]
        );
    }
}
