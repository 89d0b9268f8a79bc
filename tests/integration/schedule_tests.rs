//! Integration tests for the trigger → window start → monitor pipeline.

use chrono::TimeDelta;

use iopool_filtration::app::commands::AppCommand;
use iopool_filtration::app::events::FiltrationEvent;
use iopool_filtration::app::ports::RelayState;
use iopool_filtration::app::service::{AppService, TriggerOutcome};
use iopool_filtration::engine::{ActiveWindow, MonitorOutcome, WindowKind};
use iopool_filtration::scheduler::{PoolMode, Trigger};

use crate::mock_hw::{MockHost, RelayCall, at, run_until, standard_config, started, tod};

fn window_ended(host: &MockHost) -> Vec<(WindowKind, i64)> {
    host.events
        .iter()
        .filter_map(|e| match e {
            FiltrationEvent::WindowEnded { kind, report } => {
                Some((*kind, report.span.duration_minutes))
            }
            _ => None,
        })
        .collect()
}

// ── Summer day ────────────────────────────────────────────────

#[test]
fn slot1_runs_180_minutes_end_to_end() {
    let mut cfg = standard_config();
    cfg.winter.enabled = false;
    let (mut app, mut host) = started(cfg, at(0, 0));

    run_until(&mut app, &mut host, at(8, 0));
    assert!(host.pump_on(), "slot #1 starts the pump at 08:00");
    assert_eq!(host.calls, [RelayCall::On]);
    assert_eq!(host.event_types(), ["SLOT1_START"]);
    assert_eq!(app.run_state().next_stop_time(), Some(at(11, 0)));
    assert_eq!(host.stored("filtration", "active_slot").as_deref(), Some("1"));
    assert_eq!(
        host.stored("filtration", "slot1_end_time").as_deref(),
        Some("2025-07-14T11:00:00")
    );
    if let Some(FiltrationEvent::WindowStarted { span, .. }) = host.last_event() {
        assert_eq!(span.duration_minutes, 180);
        assert_eq!(span.end, at(11, 0));
    } else {
        panic!("expected SLOT1_START");
    }

    run_until(&mut app, &mut host, at(10, 59));
    assert!(host.pump_on(), "still inside the window");

    host.elapsed_hours = Some(3.0);
    run_until(&mut app, &mut host, at(11, 0));
    assert!(!host.pump_on());
    assert_eq!(host.calls, [RelayCall::On, RelayCall::Off]);
    assert_eq!(window_ended(&host), [(WindowKind::Slot1, 180)]);
    assert_eq!(app.run_state().active, ActiveWindow::None);
    assert_eq!(host.stored("filtration", "active_slot"), None);
    assert_eq!(host.stored("filtration", "next_stop_time"), None);
    assert_eq!(app.run_state().slot1_end_time, Some(at(11, 0)));

    let FiltrationEvent::WindowEnded { report, .. } = host.last_event().unwrap() else {
        panic!("expected SLOT1_END");
    };
    assert_eq!(report.day_objective_minutes, Some(300));
    assert_eq!(report.day_elapsed_minutes, 180.0);
    assert_eq!(report.day_elapsed_percent, Some(60));
    assert_eq!(report.boost_in_progress, None);
}

#[test]
fn full_day_runs_both_slots() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));
    host.elapsed_hours = None;

    run_until(&mut app, &mut host, at(23, 59));
    assert_eq!(
        host.event_types(),
        ["SLOT1_START", "SLOT1_END", "SLOT2_START", "SLOT2_END"]
    );
    assert_eq!(
        window_ended(&host),
        [(WindowKind::Slot1, 180), (WindowKind::Slot2, 120)]
    );
    assert!(!host.pump_on());
    assert_eq!(app.run_state().slot2_end_time, Some(at(22, 0)));
}

#[test]
fn duration_is_replanned_at_fire_time() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));
    host.recommendation = Some(100.0);
    run_until(&mut app, &mut host, at(8, 0));
    assert_eq!(app.run_state().next_stop_time(), Some(at(9, 0)));
}

#[test]
fn clamp_bounds_apply_to_slots() {
    let mut cfg = standard_config();
    cfg.summer.min_duration_minutes = Some(600);
    let (mut app, mut host) = started(cfg, at(0, 0));
    run_until(&mut app, &mut host, at(8, 0));
    // 60% of 600
    assert_eq!(app.run_state().next_stop_time(), Some(at(14, 0)));
}

#[test]
fn missing_recommendation_skips_window() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));
    host.recommendation = None;

    let outcomes = run_until(&mut app, &mut host, at(8, 0));
    assert!(outcomes.contains(&(
        Trigger::Slot1Start,
        TriggerOutcome::WindowSkipped(WindowKind::Slot1)
    )));
    assert!(host.calls.is_empty(), "no actuator action");
    assert!(host.events.is_empty());
    assert_eq!(app.run_state().active, ActiveWindow::None);
    assert_eq!(host.stored("filtration", "active_slot"), None);
}

#[test]
fn pump_already_on_is_not_recommanded() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));
    host.relay = Some(RelayState::On);
    run_until(&mut app, &mut host, at(8, 0));
    assert!(host.calls.is_empty());
    assert_eq!(host.event_types(), ["SLOT1_START"]);
    assert_eq!(app.pump_commands(), 0);
}

// ── Drift correction ──────────────────────────────────────────

#[test]
fn slot2_extends_when_elapsed_feed_is_short() {
    let mut cfg = standard_config();
    cfg.summer.slot1.duration_percent = 0;
    cfg.summer.slot2.duration_percent = 100;
    let (mut app, mut host) = started(cfg, at(19, 0));
    host.recommendation = Some(120.0);

    run_until(&mut app, &mut host, at(20, 0));
    assert_eq!(app.run_state().next_stop_time(), Some(at(22, 0)));

    host.elapsed_hours = Some(1.5);
    let outcomes = run_until(&mut app, &mut host, at(22, 0));
    assert_eq!(
        outcomes.last(),
        Some(&(
            Trigger::Heartbeat,
            TriggerOutcome::Monitor(MonitorOutcome::Extended {
                stop: at(22, 30),
                remaining_minutes: 30,
            })
        ))
    );
    assert!(host.pump_on(), "extension instead of stop");
    assert_eq!(app.run_state().next_stop_time(), Some(at(22, 30)));
    assert_eq!(app.run_state().slot2_end_time, Some(at(22, 30)));
    assert_eq!(
        host.stored("filtration", "next_stop_time").as_deref(),
        Some("2025-07-14T22:30:00")
    );

    host.elapsed_hours = Some(2.0);
    run_until(&mut app, &mut host, at(22, 30));
    assert!(!host.pump_on());
    assert_eq!(window_ended(&host), [(WindowKind::Slot2, 150)]);
}

#[test]
fn slot2_measures_against_day_objective() {
    // 300 min day: slot 1 ran short, slot 2 makes it up.
    let (mut app, mut host) = started(standard_config(), at(19, 0));
    run_until(&mut app, &mut host, at(20, 0));
    host.elapsed_hours = Some(4.0);
    run_until(&mut app, &mut host, at(22, 0));
    assert_eq!(app.run_state().next_stop_time(), Some(at(23, 0)));
}

#[test]
fn slot1_is_never_extended() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    host.elapsed_hours = Some(0.5);
    run_until(&mut app, &mut host, at(11, 0));
    assert!(!host.pump_on());
    assert_eq!(host.event_types(), ["SLOT1_START", "SLOT1_END"]);
}

#[test]
fn missing_elapsed_feed_stops_on_time() {
    let (mut app, mut host) = started(standard_config(), at(19, 0));
    host.elapsed_hours = None;
    run_until(&mut app, &mut host, at(22, 0));
    assert!(!host.pump_on());
    assert_eq!(window_ended(&host), [(WindowKind::Slot2, 120)]);
}

// ── Monitor edge cases ────────────────────────────────────────

#[test]
fn pump_switched_off_externally_leaves_state() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    run_until(&mut app, &mut host, at(8, 0));
    host.relay = Some(RelayState::Off);
    let outcomes = run_until(&mut app, &mut host, at(11, 5));
    assert!(
        outcomes
            .iter()
            .all(|(_, o)| *o == TriggerOutcome::Monitor(MonitorOutcome::NotRunning))
    );
    assert!(app.run_state().scheduled().is_some());
}

#[test]
fn failed_stop_is_retried_next_tick() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    run_until(&mut app, &mut host, at(10, 59));
    host.fail_commands = 1;

    let outcomes = run_until(&mut app, &mut host, at(11, 0));
    assert_eq!(
        outcomes.last(),
        Some(&(Trigger::Heartbeat, TriggerOutcome::Monitor(MonitorOutcome::Failed)))
    );
    assert!(host.pump_on());
    assert!(app.run_state().scheduled().is_some(), "state kept for retry");

    run_until(&mut app, &mut host, at(11, 1));
    assert!(!host.pump_on());
    assert_eq!(window_ended(&host), [(WindowKind::Slot1, 181)]);
}

#[test]
fn failed_start_leaves_run_state_untouched() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    host.fail_commands = 1;
    let outcomes = run_until(&mut app, &mut host, at(8, 0));
    assert!(outcomes.contains(&(
        Trigger::Slot1Start,
        TriggerOutcome::WindowSkipped(WindowKind::Slot1)
    )));
    assert!(host.events.is_empty());
    assert_eq!(app.run_state().active, ActiveWindow::None);
}

// ── Modes and re-arming ───────────────────────────────────────

#[test]
fn active_winter_runs_fixed_window() {
    let mut host = MockHost::new(at(0, 0));
    host.mode = Some(PoolMode::ActiveWinter);
    host.recommendation = None;
    let mut app = AppService::new(standard_config());
    app.start(at(0, 0), &mut host).unwrap();

    assert!(host.timers.is_armed(Trigger::WinterStart));
    assert!(!host.timers.is_armed(Trigger::Slot1Start));

    run_until(&mut app, &mut host, at(23, 0));
    assert_eq!(host.event_types(), ["WINTER_START", "WINTER_END"]);
    assert_eq!(window_ended(&host), [(WindowKind::Winter, 90)]);
    assert!(!host.pump_on());
}

#[test]
fn passive_winter_arms_nothing() {
    let mut host = MockHost::new(at(0, 0));
    host.mode = Some(PoolMode::PassiveWinter);
    let mut app = AppService::new(standard_config());
    app.start(at(0, 0), &mut host).unwrap();
    assert_eq!(host.timers.armed(), 0);
    run_until(&mut app, &mut host, at(23, 0));
    assert!(host.calls.is_empty());
}

#[test]
fn mode_change_replaces_every_trigger() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));
    assert_eq!(host.timers.armed(), 3);

    app.handle_command(AppCommand::ModeChanged(PoolMode::ActiveWinter), at(0, 0), &mut host)
        .unwrap();
    assert_eq!(host.timers.armed(), 2);
    assert!(host.timers.is_armed(Trigger::WinterStart));
    assert!(!host.timers.is_armed(Trigger::Slot1Start));
    assert!(!host.timers.is_armed(Trigger::Slot2Start));
    assert_eq!(app.mode(), Some(PoolMode::ActiveWinter));

    run_until(&mut app, &mut host, at(12, 0));
    assert_eq!(host.event_types(), ["WINTER_START", "WINTER_END"]);
}

#[test]
fn reconfiguration_rearms_and_invalid_config_is_rejected() {
    let (mut app, mut host) = started(standard_config(), at(0, 0));

    let mut bad = standard_config();
    bad.summer.slot2.duration_percent = 70;
    assert!(app.handle_command(AppCommand::UpdateConfig(bad), at(0, 0), &mut host).is_err());
    assert_eq!(app.config().summer.slot2.duration_percent, 40);

    let mut cfg = standard_config();
    cfg.summer.slot1.start_time = tod(9, 0);
    app.handle_command(AppCommand::UpdateConfig(cfg), at(0, 0), &mut host)
        .unwrap();
    assert_eq!(host.timers.deadline(Trigger::Slot1Start), Some(at(9, 0)));
    assert_eq!(host.timers.armed(), 3);
}

#[test]
fn next_daily_run_is_tomorrow_once_passed() {
    let (_app, host) = started(standard_config(), at(8, 30));
    assert_eq!(
        host.timers.deadline(Trigger::Slot1Start),
        Some(at(8, 0) + TimeDelta::days(1))
    );
    assert_eq!(host.timers.deadline(Trigger::Slot2Start), Some(at(20, 0)));
}

// ── Restart ───────────────────────────────────────────────────

#[test]
fn restart_mid_window_resumes_monitoring() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    run_until(&mut app, &mut host, at(9, 0));
    app.shutdown(&mut host);
    assert_eq!(host.timers.armed(), 0);

    // Mode flips to passive on the way back: the running window still ends.
    host.mode = Some(PoolMode::PassiveWinter);
    let mut app = AppService::new(standard_config());
    app.start(at(9, 0), &mut host).unwrap();
    assert!(host.timers.is_armed(Trigger::Heartbeat));
    assert_eq!(app.run_state().next_stop_time(), Some(at(11, 0)));

    run_until(&mut app, &mut host, at(11, 0));
    assert!(!host.pump_on());
    assert_eq!(window_ended(&host), [(WindowKind::Slot1, 180)]);
}
