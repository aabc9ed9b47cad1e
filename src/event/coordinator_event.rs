// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator event types.

use std::sync::Arc;

use crate::coordinator::{Period, Roster};
use crate::device::Serial;
use crate::error::Error;

/// Events emitted by the update coordinator.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A tick succeeded and its roster is now current.
    RosterPublished {
        /// The published roster.
        roster: Arc<Roster>,
    },

    /// A tick failed. The previous roster stays current.
    ///
    /// Emitted exactly once per failed tick.
    UpdateFailed {
        /// What made the tick fail.
        cause: Arc<Error>,
    },

    /// The polling period switched.
    PeriodChanged {
        /// Period before the switch.
        from: Period,
        /// Period after the switch.
        to: Period,
    },

    /// A device entered the transition set.
    TransitionStarted {
        /// The device.
        serial: Serial,
    },

    /// A device left the transition set.
    TransitionCompleted {
        /// The device.
        serial: Serial,
    },
}

impl CoordinatorEvent {
    /// Returns the serial for transition events.
    #[must_use]
    pub fn serial(&self) -> Option<&Serial> {
        match self {
            Self::TransitionStarted { serial } | Self::TransitionCompleted { serial } => {
                Some(serial)
            }
            _ => None,
        }
    }

    /// Returns `true` for [`UpdateFailed`](Self::UpdateFailed).
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::UpdateFailed { .. })
    }

    /// Returns `true` for [`RosterPublished`](Self::RosterPublished).
    #[must_use]
    pub fn is_publish(&self) -> bool {
        matches!(self, Self::RosterPublished { .. })
    }
}
