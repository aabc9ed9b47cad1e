// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory device source shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use nomaiq_lib::device::{Device, Properties, PropertyName, PropertyValue, Serial};
use nomaiq_lib::error::{AuthError, Error, Result, TransportError};
use nomaiq_lib::source::{DeviceSource, Session};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Valid,
    Expiring,
    Invalid,
}

#[derive(Debug, Default)]
struct Script {
    devices: Vec<Device>,
    properties: HashMap<Serial, Properties>,
    auth: AuthMode,
    refresh_auth_calls: u32,
    roster_fails: bool,
    roster_hangs: bool,
    roster_fetches: u32,
    failing_refreshes: HashSet<Serial>,
    failing_writes: HashSet<PropertyName>,
    refreshed: Vec<Serial>,
    writes: Vec<(Serial, PropertyName, PropertyValue)>,
    signed_out: bool,
}

/// Device source whose responses are set by the test.
///
/// Writes are applied to the scripted properties only when `apply_writes`
/// is on, so tests can choose whether a command "takes".
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
    apply_writes: bool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applying_writes() -> Self {
        Self {
            apply_writes: true,
            ..Self::default()
        }
    }

    /// Adds a device with its identity and initial properties.
    pub fn with_device(self, device: Device) -> Self {
        self.add_device(device);
        self
    }

    /// Adds a device to the roster returned from now on.
    pub fn add_device(&self, device: Device) {
        let mut script = self.script.lock();
        script
            .properties
            .insert(device.serial().clone(), device.properties().clone());
        let mut bare = device;
        bare.set_properties(Properties::new());
        script.devices.push(bare);
    }

    pub fn set_property(&self, serial: &str, name: PropertyName, value: impl Into<PropertyValue>) {
        self.script
            .lock()
            .properties
            .entry(Serial::from(serial))
            .or_default()
            .insert(name, value.into());
    }

    pub fn set_auth(&self, mode: AuthMode) {
        self.script.lock().auth = mode;
    }

    pub fn fail_roster(&self, fail: bool) {
        self.script.lock().roster_fails = fail;
    }

    /// Holds roster fetches, including ones already waiting, until released.
    pub fn hang_roster(&self, hang: bool) {
        self.script.lock().roster_hangs = hang;
    }

    pub fn fail_refresh(&self, serial: &str, fail: bool) {
        let mut script = self.script.lock();
        if fail {
            script.failing_refreshes.insert(Serial::from(serial));
        } else {
            script.failing_refreshes.remove(&Serial::from(serial));
        }
    }

    pub fn fail_writes_to(&self, name: PropertyName) {
        self.script.lock().failing_writes.insert(name);
    }

    /// Serials refreshed since the last call, in order.
    pub fn take_refreshed(&self) -> Vec<String> {
        std::mem::take(&mut self.script.lock().refreshed)
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect()
    }

    /// Writes sent so far, as `(serial, property, value)`.
    pub fn writes(&self) -> Vec<(String, String, PropertyValue)> {
        self.script
            .lock()
            .writes
            .iter()
            .map(|(s, n, v)| (s.as_str().to_string(), n.as_str().to_string(), v.clone()))
            .collect()
    }

    /// Number of roster fetches started so far.
    pub fn roster_fetches(&self) -> u32 {
        self.script.lock().roster_fetches
    }

    pub fn refresh_auth_calls(&self) -> u32 {
        self.script.lock().refresh_auth_calls
    }

    pub fn signed_out(&self) -> bool {
        self.script.lock().signed_out
    }
}

impl Session for ScriptedSource {
    fn check_auth(&self) -> Result<()> {
        match self.script.lock().auth {
            AuthMode::Valid => Ok(()),
            AuthMode::Expiring => Err(AuthError::Expiring.into()),
            AuthMode::Invalid => Err(AuthError::InvalidCredentials("revoked".to_string()).into()),
        }
    }

    async fn refresh_auth(&self) -> Result<()> {
        let mut script = self.script.lock();
        script.refresh_auth_calls += 1;
        script.auth = AuthMode::Valid;
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.script.lock().signed_out = true;
        Ok(())
    }
}

impl DeviceSource for ScriptedSource {
    async fn get_devices(&self) -> Result<Vec<Device>> {
        self.script.lock().roster_fetches += 1;
        loop {
            let hangs = self.script.lock().roster_hangs;
            if !hangs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let (fails, devices) = {
            let script = self.script.lock();
            (script.roster_fails, script.devices.clone())
        };
        if fails {
            return Err(TransportError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }
            .into());
        }
        Ok(devices)
    }

    async fn refresh_device(&self, device: &mut Device) -> Result<()> {
        let mut script = self.script.lock();
        script.refreshed.push(device.serial().clone());
        if script.failing_refreshes.contains(device.serial()) {
            return Err(Error::Transport(TransportError::Timeout(1000)));
        }
        let properties = script
            .properties
            .get(device.serial())
            .cloned()
            .unwrap_or_default();
        device.set_properties(properties);
        Ok(())
    }

    async fn set_property(
        &self,
        serial: &Serial,
        name: &PropertyName,
        value: &PropertyValue,
    ) -> Result<()> {
        let mut script = self.script.lock();
        if script.failing_writes.contains(name) {
            return Err(TransportError::Status {
                status: 500,
                body: "write rejected".to_string(),
            }
            .into());
        }
        script
            .writes
            .push((serial.clone(), name.clone(), value.clone()));
        if self.apply_writes {
            script
                .properties
                .entry(serial.clone())
                .or_default()
                .insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

pub fn door(serial: &str, status: &str) -> Device {
    Device::new(serial, "Garage")
        .with_oem_model("gdo")
        .with_property(PropertyName::DoorStatus, PropertyValue::from(status))
}

pub fn light(serial: &str, power: i64) -> Device {
    Device::new(serial, "Lamp")
        .with_oem_model("light")
        .with_property(PropertyName::Power, PropertyValue::Int(power))
        .with_property(PropertyName::VoiceData, PropertyValue::from(""))
}
