// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel behind [`UpdateCoordinator::subscribe`].
//!
//! [`UpdateCoordinator::subscribe`]: crate::coordinator::UpdateCoordinator::subscribe

use tokio::sync::broadcast;

use super::CoordinatorEvent;

/// Fan-out of coordinator events.
///
/// The capacity comes from `CoordinatorConfig::event_capacity`, which is
/// validated to be non-zero. A subscriber that falls further behind than
/// that loses the oldest events and receives `RecvError::Lagged`.
#[derive(Debug)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.sender.subscribe()
    }

    /// Sends an event to current subscribers. Dropped if there are none.
    pub(crate) fn publish(&self, event: CoordinatorEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::trace!(?event, "No event subscribers");
        }
    }
}
