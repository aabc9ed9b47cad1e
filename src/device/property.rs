// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed device properties.
//!
//! Devices expose a flat mapping from property name to value. Names the
//! library acts on have their own [`PropertyName`] variant; anything else is
//! kept verbatim in [`PropertyName::Other`]. Values are one of boolean,
//! integer or string.

use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

/// Name of a device property.
///
/// Conversions from strings always produce the named variant for known
/// names, so `PropertyName::from("power") == PropertyName::Power`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyName {
    /// Light on/off (`1`/`0`).
    Power,
    /// Light brightness (0-100).
    Brightness,
    /// Light color temperature (0-100, 100 = coolest).
    ColorTemp,
    /// Light hue.
    ColorSelect,
    /// Light saturation.
    ColorSaturation,
    /// Light mode (`white` or `colour`).
    Mode,
    /// Name given to the light in the vendor app.
    VoiceData,
    /// Garage door status (`opened`, `closed`, `opening`, `closing`).
    DoorStatus,
    /// Garage door trigger; any new value toggles the door.
    DoorToggle,
    /// Any other property.
    Other(String),
}

impl PropertyName {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Power => "power",
            Self::Brightness => "brightness",
            Self::ColorTemp => "color_temp",
            Self::ColorSelect => "color_select",
            Self::ColorSaturation => "color_saturation",
            Self::Mode => "mode",
            Self::VoiceData => "voice_data",
            Self::DoorStatus => "door_status",
            Self::DoorToggle => "door_toggle",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        match s {
            "power" => Self::Power,
            "brightness" => Self::Brightness,
            "color_temp" => Self::ColorTemp,
            "color_select" => Self::ColorSelect,
            "color_saturation" => Self::ColorSaturation,
            "mode" => Self::Mode,
            "voice_data" => Self::VoiceData,
            "door_status" => Self::DoorStatus,
            "door_toggle" => Self::DoorToggle,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a device property.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::device::PropertyValue;
///
/// assert_eq!(PropertyValue::Int(1).as_bool(), Some(true));
/// assert_eq!(PropertyValue::from("white").as_str(), Some("white"));
/// assert_eq!(PropertyValue::Bool(true), PropertyValue::from(true));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A string value.
    Str(String),
}

impl PropertyValue {
    /// Converts a JSON value as delivered by the service.
    ///
    /// Returns `None` for `null`, arrays and objects. Fractional numbers are
    /// kept in their textual form.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => Some(
                n.as_i64()
                    .map_or_else(|| Self::Str(n.to_string()), Self::Int),
            ),
            serde_json::Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    /// Converts to a JSON value for writing.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Str(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Interprets the value as a boolean.
    ///
    /// Integers are truthy when non-zero. Strings are not interpreted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Str(_) => None,
        }
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// The property mapping of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(HashMap<PropertyName, PropertyValue>);

impl Properties {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a property, or `None` if it is absent.
    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Returns `true` if the property is present.
    #[must_use]
    pub fn contains(&self, name: &PropertyName) -> bool {
        self.0.contains_key(name)
    }

    /// Sets a property, returning the previous value.
    pub fn insert(&mut self, name: PropertyName, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(name, value)
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, name: &PropertyName) -> Option<PropertyValue> {
        self.0.remove(name)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all properties in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, PropertyName, PropertyValue> {
        self.0.iter()
    }
}

impl FromIterator<(PropertyName, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (PropertyName, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a PropertyName, &'a PropertyValue);
    type IntoIter = hash_map::Iter<'a, PropertyName, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_names_are_canonical() {
        assert_eq!(PropertyName::from("power"), PropertyName::Power);
        assert_eq!(PropertyName::from("door_status"), PropertyName::DoorStatus);
        assert_eq!(
            PropertyName::from("firmware"),
            PropertyName::Other("firmware".to_string())
        );
        assert_eq!(PropertyName::ColorSaturation.as_str(), "color_saturation");
    }

    #[test]
    fn json_conversion() {
        assert_eq!(PropertyValue::from_json(&json!(1)), Some(PropertyValue::Int(1)));
        assert_eq!(
            PropertyValue::from_json(&json!(true)),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(
            PropertyValue::from_json(&json!("opened")),
            Some(PropertyValue::Str("opened".to_string()))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(2.5)),
            Some(PropertyValue::Str("2.5".to_string()))
        );
        assert_eq!(PropertyValue::from_json(&json!(null)), None);
    }

    #[test]
    fn writes_keep_the_variant() {
        assert_eq!(PropertyValue::Int(0).to_json(), json!(0));
        assert_eq!(PropertyValue::from("colour").to_json(), json!("colour"));
    }

    #[test]
    fn truthiness() {
        assert_eq!(PropertyValue::Int(0).as_bool(), Some(false));
        assert_eq!(PropertyValue::Int(1).as_bool(), Some(true));
        assert_eq!(PropertyValue::from("1").as_bool(), None);
    }

    #[test]
    fn absent_properties() {
        let mut props = Properties::new();
        assert!(props.get(&PropertyName::Power).is_none());

        props.insert(PropertyName::Power, PropertyValue::Int(1));
        assert!(props.contains(&PropertyName::Power));
        assert_eq!(props.len(), 1);

        assert_eq!(props.remove(&PropertyName::Power), Some(PropertyValue::Int(1)));
        assert!(props.is_empty());
    }
}
