// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device serial type.

use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a device (the cloud service's DSN).
///
/// Entities keep only the serial and resolve the device from the latest
/// roster on every read.
///
/// # Examples
///
/// ```
/// use nomaiq_lib::device::Serial;
///
/// let serial = Serial::from("AC000W012345678");
/// assert_eq!(serial.as_str(), "AC000W012345678");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Serial(String);

impl Serial {
    /// Creates a serial from any string.
    #[must_use]
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    /// Returns the serial as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Serial {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Serial {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Serial {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Serial {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn lookup_by_str() {
        let mut set = HashSet::new();
        set.insert(Serial::from("GDO-1"));
        assert!(set.contains("GDO-1"));
        assert!(!set.contains("GDO-2"));
    }

    #[test]
    fn display_is_raw() {
        assert_eq!(Serial::new("abc").to_string(), "abc");
    }
}
