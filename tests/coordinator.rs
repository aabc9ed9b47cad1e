// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the update coordinator on a paused clock.

mod common;

use std::time::Duration;

use common::{AuthMode, ScriptedSource, door, light};
use nomaiq_lib::coordinator::{
    BackoffPolicy, CoordinatorConfig, IntendedValue, Period, RefreshScope, TickPhase,
    UpdateCoordinator,
};
use nomaiq_lib::device::{PropertyName, Serial};
use nomaiq_lib::error::{Error, TransportError};
use nomaiq_lib::event::CoordinatorEvent;
use tokio::sync::broadcast;
use tokio::time::Instant;

const NORMAL: Duration = Duration::from_secs(30);
const FAST: Duration = Duration::from_secs(2);

fn fleet() -> ScriptedSource {
    ScriptedSource::new()
        .with_device(door("GDO-1", "closed"))
        .with_device(light("L-1", 0))
        .with_device(light("L-2", 1))
}

fn coordinator(source: &ScriptedSource) -> UpdateCoordinator<ScriptedSource> {
    UpdateCoordinator::new(source.clone(), CoordinatorConfig::default()).unwrap()
}

fn drain(rx: &mut broadcast::Receiver<CoordinatorEvent>) -> Vec<CoordinatorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn assert_period_matches_transitions(coordinator: &UpdateCoordinator<ScriptedSource>) {
    let expected = if coordinator.transitions().is_empty() {
        Period::Normal
    } else {
        Period::Fast
    };
    assert_eq!(coordinator.period(), expected);
}

// ============================================================================
// Transitions
// ============================================================================

mod transitions {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn door_opening_then_opened() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        source.take_refreshed();

        let gdo = Serial::from("GDO-1");
        coordinator.mark_transition(&gdo, None);
        assert_eq!(coordinator.period(), Period::Fast);

        source.set_property("GDO-1", PropertyName::DoorStatus, "opening");
        tokio::time::advance(FAST).await;
        let roster = coordinator.tick().await.unwrap();

        assert_eq!(roster.scope(), RefreshScope::TransitionOnly);
        assert_eq!(source.take_refreshed(), ["GDO-1"]);
        assert!(coordinator.is_in_transition(&gdo));
        assert_eq!(coordinator.period(), Period::Fast);

        source.set_property("GDO-1", PropertyName::DoorStatus, "opened");
        tokio::time::advance(FAST).await;
        coordinator.tick().await.unwrap();

        assert!(!coordinator.is_in_transition(&gdo));
        assert_eq!(coordinator.period(), Period::Normal);
        assert_eq!(
            coordinator.get_roster().get("GDO-1").and_then(|d| d.door_status()),
            Some(nomaiq_lib::types::DoorStatus::Opened)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closed_status_also_completes() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        let gdo = Serial::from("GDO-1");
        coordinator.mark_transition(&gdo, None);
        source.set_property("GDO-1", PropertyName::DoorStatus, "closing");
        coordinator.tick().await.unwrap();
        assert!(coordinator.is_in_transition(&gdo));

        source.set_property("GDO-1", PropertyName::DoorStatus, "closed");
        coordinator.tick().await.unwrap();
        assert!(!coordinator.is_in_transition(&gdo));
    }

    #[tokio::test(start_paused = true)]
    async fn intended_power_must_match_exactly() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        let lamp = Serial::from("L-1");
        coordinator.mark_transition(&lamp, Some(IntendedValue::power(true)));

        // Confirmed power is still 0.
        coordinator.tick().await.unwrap();
        assert!(coordinator.is_in_transition(&lamp));
        assert_eq!(coordinator.period(), Period::Fast);

        source.set_property("L-1", PropertyName::Power, 1_i64);
        coordinator.tick().await.unwrap();
        assert!(!coordinator.is_in_transition(&lamp));
        assert!(coordinator.intended_value(&lamp).is_none());
        assert_eq!(coordinator.period(), Period::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn period_follows_transition_set() {
        let source = fleet();
        let coordinator = coordinator(&source);
        let mut rx = coordinator.subscribe();

        let a = Serial::from("L-1");
        let b = Serial::from("L-2");

        coordinator.mark_transition(&a, None);
        assert_period_matches_transitions(&coordinator);
        coordinator.mark_transition(&b, None);
        assert_period_matches_transitions(&coordinator);
        coordinator.clear_transition(&a);
        assert_period_matches_transitions(&coordinator);
        coordinator.clear_transition(&b);
        assert_period_matches_transitions(&coordinator);
        coordinator.clear_transition(&b);
        assert_period_matches_transitions(&coordinator);

        let switches: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                CoordinatorEvent::PeriodChanged { from, to } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            switches,
            [(Period::Normal, Period::Fast), (Period::Fast, Period::Normal)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn moving_door_is_tracked_automatically() {
        let source = fleet();
        source.set_property("GDO-1", PropertyName::DoorStatus, "opening");
        let coordinator = coordinator(&source);
        let mut rx = coordinator.subscribe();

        coordinator.first_refresh().await.unwrap();

        assert!(coordinator.is_in_transition(&Serial::from("GDO-1")));
        assert_eq!(coordinator.period(), Period::Fast);
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            CoordinatorEvent::TransitionStarted { serial } if serial.as_str() == "GDO-1"
        )));
    }
}

// ============================================================================
// Refresh scope
// ============================================================================

mod scope {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn normal_period_refreshes_everything() {
        let source = fleet();
        let coordinator = coordinator(&source);

        let started = Instant::now();
        let roster = coordinator.first_refresh().await.unwrap();

        assert_eq!(roster.scope(), RefreshScope::Full);
        assert_eq!(source.take_refreshed(), ["GDO-1", "L-1", "L-2"]);
        assert_eq!(coordinator.last_full_update(), Some(started));
    }

    #[tokio::test(start_paused = true)]
    async fn transition_only_keeps_other_snapshots() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        let full_at = coordinator.last_full_update();

        coordinator.mark_transition(&Serial::from("GDO-1"), None);
        source.set_property("L-2", PropertyName::Power, 0_i64);
        source.take_refreshed();

        tokio::time::advance(FAST).await;
        let roster = coordinator.tick().await.unwrap();

        assert_eq!(roster.scope(), RefreshScope::TransitionOnly);
        assert_eq!(source.take_refreshed(), ["GDO-1"]);
        assert_eq!(coordinator.last_full_update(), full_at);
        // L-2 was not refreshed, so it keeps its previous snapshot.
        assert_eq!(
            roster
                .get("L-2")
                .and_then(|d| d.property(&PropertyName::Power))
                .and_then(|v| v.as_int()),
            Some(1)
        );
        assert_eq!(roster.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn new_device_is_refreshed_on_transition_only_tick() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        coordinator.mark_transition(&Serial::from("GDO-1"), None);
        source.set_property("GDO-1", PropertyName::DoorStatus, "opening");
        source.add_device(light("L-3", 1));
        source.take_refreshed();

        tokio::time::advance(FAST).await;
        let roster = coordinator.tick().await.unwrap();

        assert_eq!(roster.scope(), RefreshScope::TransitionOnly);
        assert_eq!(source.take_refreshed(), ["GDO-1", "L-3"]);
        assert_eq!(
            roster
                .get("L-3")
                .and_then(|d| d.property(&PropertyName::Power))
                .and_then(|v| v.as_int()),
            Some(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn latched_fast_period_still_refreshes_everything() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        // A transition that never completes.
        coordinator.mark_transition(&Serial::from("L-1"), Some(IntendedValue::power(true)));

        for _ in 0..14 {
            tokio::time::advance(FAST).await;
            let roster = coordinator.tick().await.unwrap();
            assert_eq!(roster.scope(), RefreshScope::TransitionOnly);
        }
        assert_eq!(coordinator.period(), Period::Fast);

        tokio::time::advance(FAST).await;
        let started = Instant::now();
        source.take_refreshed();
        let roster = coordinator.tick().await.unwrap();

        assert_eq!(roster.scope(), RefreshScope::Full);
        assert_eq!(source.take_refreshed().len(), 3);
        assert_eq!(coordinator.last_full_update(), Some(started));
        assert_eq!(coordinator.period(), Period::Fast);
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failures {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn roster_failure_keeps_last_roster() {
        let source = fleet();
        let coordinator = coordinator(&source);
        let published = coordinator.first_refresh().await.unwrap();
        assert_eq!(published.len(), 3);

        let mut rx = coordinator.subscribe();
        source.fail_roster(true);

        let err = coordinator.tick().await.unwrap_err();
        let Error::UpdateFailed(cause) = &err else {
            panic!("expected UpdateFailed, got {err:?}");
        };
        assert!(matches!(**cause, Error::Transport(_)));

        let roster = coordinator.get_roster();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.sequence(), published.sequence());
        assert_eq!(coordinator.phase(), TickPhase::Failed);

        let failures = drain(&mut rx).iter().filter(|e| e.is_failure()).count();
        assert_eq!(failures, 1);

        source.fail_roster(false);
        coordinator.tick().await.unwrap();
        assert_eq!(coordinator.phase(), TickPhase::Idle);
        assert_eq!(coordinator.consecutive_failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn device_failures_are_isolated() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        source.fail_refresh("L-2", true);
        source.set_property("L-1", PropertyName::Power, 1_i64);
        let roster = coordinator.tick().await.unwrap();

        assert_eq!(roster.failed(), &[Serial::from("L-2")]);
        let power = |serial: &str| {
            roster
                .get(serial)
                .and_then(|d| d.property(&PropertyName::Power))
                .and_then(|v| v.as_int())
        };
        assert_eq!(power("L-1"), Some(1));
        assert_eq!(power("L-2"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn all_devices_failing_fails_the_tick() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        for serial in ["GDO-1", "L-1", "L-2"] {
            source.fail_refresh(serial, true);
        }

        assert!(coordinator.tick().await.is_err());
        assert_eq!(coordinator.get_roster().sequence(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiring_session_is_refreshed() {
        let source = fleet();
        let coordinator = coordinator(&source);
        source.set_auth(AuthMode::Expiring);

        coordinator.first_refresh().await.unwrap();
        assert_eq!(source.refresh_auth_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_session_fails_the_tick() {
        let source = fleet();
        let coordinator = coordinator(&source);
        source.set_auth(AuthMode::Invalid);

        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(err.is_auth());
        assert!(coordinator.get_roster().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_tick_times_out() {
        let source = fleet();
        let config = CoordinatorConfig::default().with_tick_timeout(Duration::from_secs(5));
        let coordinator = UpdateCoordinator::new(source.clone(), config).unwrap();
        source.hang_roster(true);

        let started = Instant::now();
        let err = coordinator.tick().await.unwrap_err();

        let Error::UpdateFailed(cause) = err else {
            panic!("expected UpdateFailed");
        };
        assert!(matches!(
            *cause,
            Error::Transport(TransportError::Timeout(5000))
        ));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_mid_tick_leaves_waiters_working() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        source.hang_roster(true);
        coordinator.start().unwrap();

        tokio::time::sleep(NORMAL + Duration::from_secs(1)).await;
        assert_eq!(coordinator.phase(), TickPhase::FetchingRoster);

        coordinator.stop().await;
        assert_eq!(coordinator.phase(), TickPhase::Idle);
        assert_eq!(coordinator.consecutive_failures(), 0);

        source.hang_roster(false);
        let roster = tokio::time::timeout(Duration::from_secs(60), coordinator.refresh_and_wait())
            .await
            .expect("refresh_and_wait should return after the loop is stopped")
            .unwrap();
        assert_eq!(roster.sequence(), 2);
        assert_eq!(coordinator.phase(), TickPhase::Idle);
    }
}

// ============================================================================
// Timer loop
// ============================================================================

mod timer {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_the_normal_period() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        coordinator.start().unwrap();

        tokio::time::sleep(NORMAL + Duration::from_millis(500)).await;
        assert_eq!(coordinator.get_roster().sequence(), 2);

        coordinator.stop().await;
        assert!(!coordinator.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_fast_while_in_transition() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        coordinator.start().unwrap();

        coordinator.mark_transition(&Serial::from("GDO-1"), None);
        source.set_property("GDO-1", PropertyName::DoorStatus, "opening");

        tokio::time::sleep(FAST * 3 + Duration::from_millis(500)).await;
        assert_eq!(coordinator.get_roster().sequence(), 4);

        source.set_property("GDO-1", PropertyName::DoorStatus, "opened");
        tokio::time::sleep(FAST).await;
        assert_eq!(coordinator.period(), Period::Normal);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_rejected() {
        let source = fleet();
        let coordinator = coordinator(&source);

        coordinator.start().unwrap();
        assert!(matches!(coordinator.start(), Err(Error::AlreadyRunning)));

        coordinator.stop().await;
        coordinator.start().unwrap();
        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn one_tick_in_flight_and_requests_coalesce() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        source.take_refreshed();

        source.hang_roster(true);
        let hung = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.tick().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.roster_fetches(), 2);

        for _ in 0..3 {
            coordinator.request_refresh();
        }
        let queued = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.tick().await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.roster_fetches(), 2, "a second tick started");
        assert!(source.take_refreshed().is_empty());

        source.hang_roster(false);
        hung.await.unwrap().unwrap();
        queued.await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // The hung tick, one out-of-band tick for three requests, the queued tick.
        assert_eq!(source.roster_fetches(), 4);
        assert_eq!(coordinator.get_roster().sequence(), 4);
        let full = ["GDO-1", "L-1", "L-2"];
        assert_eq!(source.take_refreshed(), full.repeat(3));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_request_runs_out_of_band() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();

        let roster = coordinator.refresh_and_wait().await.unwrap();
        assert_eq!(roster.sequence(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_request_wakes_the_loop() {
        let source = fleet();
        let coordinator = coordinator(&source);
        coordinator.first_refresh().await.unwrap();
        coordinator.start().unwrap();

        let started = Instant::now();
        let roster = coordinator.refresh_and_wait().await.unwrap();

        assert_eq!(roster.sequence(), 2);
        assert!(started.elapsed() < FAST);

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_ticks_back_off() {
        let source = fleet();
        let config = CoordinatorConfig::default().with_backoff(
            BackoffPolicy::new()
                .with_initial_delay(Duration::from_secs(60))
                .with_max_delay(Duration::from_secs(600)),
        );
        let coordinator = UpdateCoordinator::new(source.clone(), config).unwrap();
        coordinator.first_refresh().await.unwrap();
        coordinator.start().unwrap();

        source.fail_roster(true);
        tokio::time::sleep(NORMAL + Duration::from_millis(500)).await;

        assert_eq!(coordinator.consecutive_failures(), 1);
        let wait = coordinator.next_tick_at() - Instant::now();
        assert!(wait > NORMAL, "next tick in {wait:?}");

        coordinator.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn roster_watch_sees_publications() {
        let source = fleet();
        let coordinator = coordinator(&source);
        let mut watch = coordinator.watch_roster();
        assert!(watch.borrow_and_update().is_empty());

        coordinator.first_refresh().await.unwrap();

        assert!(watch.has_changed().unwrap());
        assert_eq!(watch.borrow_and_update().len(), 3);
    }
}
