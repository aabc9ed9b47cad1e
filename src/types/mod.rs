// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for light and garage door control.
//!
//! Each type converts between the scale a device stores and the scale
//! consumers work with.
//!
//! # Types
//!
//! - [`Brightness`] - Device 0-100, consumer 0-255
//! - [`ColorTemp`] - Device 0-100 (100 = coolest), consumer mireds 153-500
//! - [`HsColor`] - Hue normalized into `[0, 360)`, saturation 0-100
//! - [`DoorStatus`] - Garage door status with terminal/moving classification
//! - [`LightMode`] / [`ColorMode`] - Device mode and exposed color mode

mod brightness;
mod color;
mod door;
mod mode;

pub use brightness::Brightness;
pub use color::{ColorTemp, HsColor};
pub use door::DoorStatus;
pub use mode::{ColorMode, LightMode};
