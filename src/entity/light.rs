// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light control surface.

use crate::coordinator::{IntendedValue, UpdateCoordinator};
use crate::device::{Device, LightCapabilities, PropertyName, PropertyValue, Serial};
use crate::error::CommandError;
use crate::overlay::{OptimisticOverlay, WritePlan};
use crate::source::{DeviceSource, Session};
use crate::types::{Brightness, ColorMode, ColorTemp, HsColor, LightMode};

/// Observable light fields that can be asserted optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightField {
    /// On/off state.
    IsOn,
    /// Brightness level (0-255).
    Brightness,
    /// Color temperature in mireds.
    ColorTemp,
    /// Hue and saturation.
    HsColor,
}

/// Asserted value of a [`LightField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightValue {
    /// On/off state.
    On(bool),
    /// Brightness level (0-255).
    Level(u8),
    /// Color temperature in mireds.
    Mireds(u16),
    /// Hue and saturation.
    Hs(HsColor),
}

/// Parameters for [`Light::turn_on`]. Unset fields are left unchanged.
///
/// Colour takes precedence over color temperature when both are set.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::entity::LightCommand;
/// use nomaiq_lib::types::HsColor;
///
/// let command = LightCommand::new()
///     .with_brightness(128)
///     .with_hs_color(HsColor::new(120.0, 80.0));
/// assert_eq!(command.brightness, Some(128));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightCommand {
    /// Brightness level (0-255).
    pub brightness: Option<u8>,
    /// Color temperature in mireds.
    pub color_temp: Option<u16>,
    /// Hue and saturation.
    pub hs_color: Option<HsColor>,
}

impl LightCommand {
    /// Creates a command that only turns the light on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the brightness level (0-255).
    #[must_use]
    pub fn with_brightness(mut self, level: u8) -> Self {
        self.brightness = Some(level);
        self
    }

    /// Sets the color temperature in mireds.
    #[must_use]
    pub fn with_color_temp(mut self, mireds: u16) -> Self {
        self.color_temp = Some(mireds);
        self
    }

    /// Sets hue and saturation.
    #[must_use]
    pub fn with_hs_color(mut self, color: HsColor) -> Self {
        self.hs_color = Some(color);
        self
    }

    fn assertions(&self) -> Vec<(LightField, LightValue)> {
        let mut values = vec![(LightField::IsOn, LightValue::On(true))];
        if let Some(level) = self.brightness {
            values.push((LightField::Brightness, LightValue::Level(level)));
        }
        if let Some(mireds) = self.color_temp {
            values.push((LightField::ColorTemp, LightValue::Mireds(mireds)));
        }
        if let Some(color) = self.hs_color {
            values.push((LightField::HsColor, LightValue::Hs(color)));
        }
        values
    }

    /// Builds the device writes: power, brightness, then mode followed by
    /// the values that depend on it.
    fn plan(&self) -> WritePlan {
        let mut plan = WritePlan::new().then(PropertyName::Power, 1_i64);

        if let Some(level) = self.brightness {
            plan.push(
                PropertyName::Brightness,
                i64::from(Brightness::from_level(level).value()),
            );
        }

        if let Some(color) = self.hs_color {
            plan.push(PropertyName::Mode, LightMode::Colour.as_str());
            plan.push(PropertyName::ColorSelect, color.device_hue());
            plan.push(PropertyName::ColorSaturation, color.device_saturation());
        } else if let Some(mireds) = self.color_temp {
            plan.push(PropertyName::Mode, LightMode::White.as_str());
            plan.push(
                PropertyName::ColorTemp,
                i64::from(ColorTemp::from_mireds(mireds).value()),
            );
        }

        plan
    }
}

/// A light backed by one device in the coordinator's roster.
///
/// Reads resolve the device by serial from the latest roster each time, with
/// optimistic values from pending commands taking precedence.
pub struct Light<S> {
    coordinator: UpdateCoordinator<S>,
    serial: Serial,
    name: String,
    unique_id: String,
    capabilities: LightCapabilities,
    overlay: OptimisticOverlay<LightField, LightValue>,
}

impl<S> std::fmt::Debug for Light<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Light")
            .field("serial", &self.serial)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<S> Light<S>
where
    S: Session + DeviceSource + 'static,
{
    /// Prefix of light unique ids.
    pub const UNIQUE_ID_PREFIX: &'static str = "nomaiq_light_";

    /// Creates a light for `device`, detecting its capabilities.
    ///
    /// The display name is the `voice_data` property, falling back to the
    /// device name.
    #[must_use]
    pub fn new(coordinator: UpdateCoordinator<S>, device: &Device) -> Self {
        let name = device
            .property(&PropertyName::VoiceData)
            .and_then(PropertyValue::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| device.name())
            .to_string();

        Self {
            coordinator,
            serial: device.serial().clone(),
            unique_id: format!("{}{}", Self::UNIQUE_ID_PREFIX, device.serial()),
            name,
            capabilities: LightCapabilities::detect(device),
            overlay: OptimisticOverlay::new(),
        }
    }

    /// Returns the device serial.
    #[must_use]
    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique id, `nomaiq_light_<serial>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the detected capabilities.
    #[must_use]
    pub fn capabilities(&self) -> LightCapabilities {
        self.capabilities
    }

    /// Returns the color modes this light supports.
    #[must_use]
    pub fn supported_color_modes(&self) -> Vec<ColorMode> {
        self.capabilities.supported_color_modes()
    }

    /// Returns `true` if the device is in the latest roster.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.coordinator.get_roster().get(self.serial.as_str()).is_some()
    }

    fn confirmed<T>(&self, read: impl FnOnce(&Device) -> Option<T>) -> Option<T> {
        let roster = self.coordinator.get_roster();
        roster.get(self.serial.as_str()).and_then(read)
    }

    fn int(device: &Device, name: &PropertyName) -> Option<i64> {
        device.property(name).and_then(PropertyValue::as_int)
    }

    fn mode(device: &Device) -> Option<LightMode> {
        device
            .property(&PropertyName::Mode)
            .and_then(PropertyValue::as_str)
            .map(LightMode::from)
    }

    /// Returns whether the light is on.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        match self.overlay.get(&LightField::IsOn) {
            Some(LightValue::On(on)) => Some(on),
            _ => self.confirmed(|d| d.property(&PropertyName::Power)?.as_bool()),
        }
    }

    /// Returns the brightness level (0-255).
    #[must_use]
    pub fn brightness(&self) -> Option<u8> {
        match self.overlay.get(&LightField::Brightness) {
            Some(LightValue::Level(level)) => Some(level),
            _ => self.confirmed(|d| {
                Self::int(d, &PropertyName::Brightness)
                    .map(|raw| Brightness::from_device(raw).to_level())
            }),
        }
    }

    /// Returns the color temperature in mireds. Only reported in white mode.
    #[must_use]
    pub fn color_temp(&self) -> Option<u16> {
        match self.overlay.get(&LightField::ColorTemp) {
            Some(LightValue::Mireds(mireds)) => Some(mireds),
            _ => self.confirmed(|d| {
                if Self::mode(d)? != LightMode::White {
                    return None;
                }
                Self::int(d, &PropertyName::ColorTemp)
                    .map(|raw| ColorTemp::from_device(raw).to_mireds())
            }),
        }
    }

    /// Returns hue and saturation. Only reported in colour mode.
    #[must_use]
    pub fn hs_color(&self) -> Option<HsColor> {
        match self.overlay.get(&LightField::HsColor) {
            Some(LightValue::Hs(color)) => Some(color),
            _ => self.confirmed(|d| {
                if Self::mode(d)? != LightMode::Colour {
                    return None;
                }
                let hue = Self::int(d, &PropertyName::ColorSelect)?;
                let saturation = Self::int(d, &PropertyName::ColorSaturation)?;
                Some(HsColor::from_device(hue, saturation))
            }),
        }
    }

    /// Returns the active color mode from confirmed state.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        let caps = self.capabilities;
        self.confirmed(|d| {
            if !d.property(&PropertyName::Power)?.as_bool()? {
                return None;
            }
            let mode = Self::mode(d).unwrap_or(LightMode::White);
            match mode {
                LightMode::Colour if caps.color => Some(ColorMode::Hs),
                LightMode::White if caps.white || caps.color => Some(ColorMode::ColorTemp),
                _ => None,
            }
        })
        .unwrap_or(ColorMode::OnOff)
    }

    /// Turns the light on, applying any values in `command`.
    ///
    /// The new values are visible at once. On a failed write the optimistic
    /// on state is dropped, the transition is cleared and the error is
    /// logged; a refresh is requested either way.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` of the first failed write.
    pub async fn turn_on(&self, command: LightCommand) -> Result<(), CommandError> {
        tracing::debug!(serial = %self.serial, ?command, "Turning light on");

        self.overlay.assert(command.assertions());
        self.send(&command.plan(), true).await
    }

    /// Turns the light off.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` if the write failed.
    pub async fn turn_off(&self) -> Result<(), CommandError> {
        tracing::debug!(serial = %self.serial, "Turning light off");

        self.overlay
            .assert([(LightField::IsOn, LightValue::On(false))]);
        let plan = WritePlan::new().then(PropertyName::Power, 0_i64);
        self.send(&plan, false).await
    }

    async fn send(&self, plan: &WritePlan, on: bool) -> Result<(), CommandError> {
        self.coordinator
            .mark_transition(&self.serial, Some(IntendedValue::power(on)));

        let result = self
            .overlay
            .commit(
                self.coordinator.source().as_ref(),
                &self.serial,
                plan,
                &[LightField::IsOn],
            )
            .await;

        if let Err(e) = &result {
            tracing::error!(serial = %self.serial, error = %e, "Light command failed");
            self.coordinator.clear_transition(&self.serial);
        }
        self.coordinator.request_refresh();
        result
    }

    /// Drops all optimistic values once the pending command is confirmed.
    ///
    /// Returns `true` if the overlay was cleared.
    pub fn reconcile(&self) -> bool {
        if self.overlay.is_empty() || self.coordinator.is_in_transition(&self.serial) {
            return false;
        }
        self.overlay.invalidate();
        true
    }

    /// Drops all optimistic values and requests a refresh.
    pub fn update(&self) {
        self.overlay.invalidate();
        self.coordinator.request_refresh();
    }
}
