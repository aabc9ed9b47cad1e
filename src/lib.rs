// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `NomaIQ` Lib - A Rust library to poll and control `NomaIQ` smart home
//! devices through their cloud service.
//!
//! Devices are polled by an adaptive coordinator: slowly while nothing
//! happens, quickly while a door is moving or a light is converging on a
//! commanded state.
//!
//! # Supported Devices
//!
//! - **Lights**: on/off, brightness, tunable white, colour
//! - **Garage door openers**: open, close, stop, motion status
//!
//! # Quick Start
//!
//! ```no_run
//! use nomaiq_lib::Hub;
//! use nomaiq_lib::coordinator::CoordinatorConfig;
//! use nomaiq_lib::source::CloudConfig;
//!
//! #[tokio::main]
//! async fn main() -> nomaiq_lib::Result<()> {
//!     let cloud = CloudConfig::new("user@example.com", "secret", "app-id", "app-secret");
//!     let hub = Hub::connect(cloud, CoordinatorConfig::default()).await?;
//!
//!     for door in hub.garage_doors() {
//!         if door.is_closed() {
//!             door.open().await?;
//!         }
//!     }
//!
//!     hub.shutdown().await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`source`] - The cloud collaborator behind the [`source::Session`] and
//!   [`source::DeviceSource`] traits
//! - [`coordinator`] - Tick loop, period selection and transition tracking
//! - [`overlay`] - Optimistic values for in-flight commands
//! - [`entity`] - Lights and garage doors
//! - [`event`] - Coordinator notifications
//!
//! Any type implementing both collaborator traits can drive the
//! coordinator; [`Hub::with_source`] accepts one directly.
//!
//! # Features
//!
//! - `cloud` (default): the HTTP client for the cloud service

pub mod coordinator;
pub mod device;
pub mod entity;
pub mod error;
pub mod event;
mod hub;
pub mod overlay;
pub mod source;
pub mod types;

pub use coordinator::{CoordinatorConfig, UpdateCoordinator};
pub use device::{Device, PropertyName, PropertyValue, Serial};
pub use error::{Error, Result};
pub use hub::Hub;
