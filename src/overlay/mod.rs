// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optimistic state for in-flight commands.
//!
//! A controller that issues a command first [asserts](OptimisticOverlay::assert)
//! the values it expects, so readers see them at once. It then
//! [commits](OptimisticOverlay::commit) an ordered [`WritePlan`] to the
//! device. If a write fails, the keys named for failure are discarded so
//! reads fall through to confirmed state. An explicit refresh
//! [invalidates](OptimisticOverlay::invalidate) everything.
//!
//! # Examples
//!
//! ```
//! use nomaiq_lib::overlay::OptimisticOverlay;
//!
//! let overlay: OptimisticOverlay<&str, bool> = OptimisticOverlay::new();
//! let confirmed = Some(false);
//!
//! overlay.assert([("is_on", true)]);
//! assert_eq!(overlay.read(&"is_on", || confirmed), Some(true));
//!
//! overlay.invalidate();
//! assert_eq!(overlay.read(&"is_on", || confirmed), Some(false));
//! ```

mod plan;

pub use plan::WritePlan;

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::device::Serial;
use crate::error::CommandError;
use crate::source::DeviceSource;

/// Locally asserted values, read in preference to confirmed state.
#[derive(Debug)]
pub struct OptimisticOverlay<K, V> {
    values: RwLock<HashMap<K, V>>,
}

impl<K, V> OptimisticOverlay<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Sets intended values, replacing earlier assertions for the same keys.
    pub fn assert(&self, values: impl IntoIterator<Item = (K, V)>) {
        self.values.write().extend(values);
    }

    /// Returns the asserted value for a key.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.values.read().get(key).cloned()
    }

    /// Returns the asserted value, or the confirmed value from `confirmed`.
    pub fn read(&self, key: &K, confirmed: impl FnOnce() -> Option<V>) -> Option<V> {
        self.get(key).or_else(confirmed)
    }

    /// Discards one asserted value.
    pub fn discard(&self, key: &K) {
        self.values.write().remove(key);
    }

    /// Discards every asserted value.
    pub fn invalidate(&self) {
        self.values.write().clear();
    }

    /// Returns `true` if nothing is asserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Sends `plan` to the device. On failure, discards the values for
    /// `discard_on_failure`; other assertions remain until invalidated.
    ///
    /// # Errors
    ///
    /// Returns the `CommandError` of the first failed write. Later writes
    /// are not attempted.
    pub async fn commit<S: DeviceSource>(
        &self,
        source: &S,
        serial: &Serial,
        plan: &WritePlan,
        discard_on_failure: &[K],
    ) -> Result<(), CommandError> {
        let result = plan.execute(source, serial).await;
        if result.is_err() {
            let mut values = self.values.write();
            for key in discard_on_failure {
                values.remove(key);
            }
        }
        result
    }
}

impl<K, V> Default for OptimisticOverlay<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
