//! Integration tests for the boost override and its interplay with
//! scheduled windows.

use iopool_filtration::app::commands::AppCommand;
use iopool_filtration::app::events::FiltrationEvent;
use iopool_filtration::app::ports::{RelayState, StoragePort};
use iopool_filtration::app::service::{AppService, TriggerOutcome};
use iopool_filtration::engine::{ActiveWindow, BoostOption, WindowKind};
use iopool_filtration::scheduler::{PoolMode, Trigger};

use crate::mock_hw::{MockHost, RelayCall, at, run_until, standard_config, started};

fn select(app: &mut AppService, host: &mut MockHost, option: BoostOption, h: u32, m: u32) {
    host.timers.set_clock(at(h, m));
    app.handle_command(AppCommand::SelectBoost(option), at(h, m), host)
        .unwrap();
}

/// `"TYPE minutes"` for every boost event.
fn boost_spans(host: &MockHost) -> Vec<String> {
    host.events
        .iter()
        .filter_map(|e| match e {
            FiltrationEvent::BoostStarted(s)
            | FiltrationEvent::BoostEnded(s)
            | FiltrationEvent::BoostCanceled(s) => {
                Some(format!("{} {}", e.event_type(), s.duration_minutes))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn idle_boost_runs_and_stops_pump() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::OneHour, 12, 0);

    assert!(host.pump_on());
    assert_eq!(host.calls, [RelayCall::On]);
    assert_eq!(app.run_state().active, ActiveWindow::Boost);
    assert_eq!(host.stored("filtration", "active_slot").as_deref(), Some("boost"));
    assert_eq!(host.stored("boost", "option").as_deref(), Some("1H"));
    assert_eq!(
        host.stored("boost", "boost_end_time").as_deref(),
        Some("2025-07-14T13:00:00")
    );
    assert_eq!(host.timers.deadline(Trigger::BoostExpiry), Some(at(13, 0)));

    let outcomes = run_until(&mut app, &mut host, at(13, 0));
    assert!(
        outcomes
            .iter()
            .any(|(t, o)| *t == Trigger::BoostExpiry
                && matches!(o, TriggerOutcome::BoostExpired(Some(b)) if b.option == BoostOption::OneHour))
    );
    assert!(!host.pump_on());
    assert_eq!(host.calls, [RelayCall::On, RelayCall::Off]);
    assert_eq!(boost_spans(&host), ["BOOST_START 60", "BOOST_END 60"]);
    assert_eq!(app.boost(), None);
    assert_eq!(app.run_state().active, ActiveWindow::None);
    assert_eq!(host.stored("filtration", "active_slot"), None);
    assert_eq!(host.stored("boost", "option").as_deref(), Some("None"));
    assert_eq!(host.stored("boost", "boost_end_time"), None);
    assert!(!host.timers.is_armed(Trigger::BoostExpiry));
}

#[test]
fn boost_keeps_pump_on_past_slot_end() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    host.elapsed_hours = None;
    run_until(&mut app, &mut host, at(9, 0));
    select(&mut app, &mut host, BoostOption::FourHours, 9, 0);

    // Pump already on: no second command.
    assert_eq!(host.calls, [RelayCall::On]);
    assert_eq!(
        app.run_state().scheduled().map(|w| w.kind),
        Some(WindowKind::Slot1),
        "slot state untouched by the boost"
    );

    run_until(&mut app, &mut host, at(11, 0));
    assert_eq!(host.event_types(), ["SLOT1_START", "BOOST_START", "SLOT1_END"]);
    assert!(host.pump_on(), "boost holds the pump");
    assert_eq!(host.calls, [RelayCall::On]);
    assert_eq!(app.run_state().active, ActiveWindow::None);

    let Some(FiltrationEvent::WindowEnded { report, .. }) = host.last_event() else {
        panic!("expected SLOT1_END");
    };
    assert_eq!(report.boost_in_progress, Some(BoostOption::FourHours));
    assert_eq!(report.remaining_boost_minutes, 120);
    assert_eq!(report.span.duration_minutes, 180);
    assert_eq!(
        host.last_event().unwrap().payload()["boost_in_progress"],
        "4H"
    );

    run_until(&mut app, &mut host, at(13, 0));
    assert!(!host.pump_on());
    assert_eq!(host.calls, [RelayCall::On, RelayCall::Off]);
    assert_eq!(host.event_types().last().map(String::as_str), Some("BOOST_END"));
}

#[test]
fn cancel_during_slot_leaves_pump_on() {
    let (mut app, mut host) = started(standard_config(), at(7, 0));
    run_until(&mut app, &mut host, at(9, 0));
    select(&mut app, &mut host, BoostOption::TwoHours, 9, 0);
    run_until(&mut app, &mut host, at(9, 30));
    select(&mut app, &mut host, BoostOption::None, 9, 30);

    assert_eq!(boost_spans(&host), ["BOOST_START 120", "BOOST_CANCELED 30"]);
    assert!(host.pump_on(), "slot #1 still owns the pump");
    assert_eq!(host.calls, [RelayCall::On]);
    assert!(!host.timers.is_armed(Trigger::BoostExpiry));
    assert_eq!(host.stored("boost", "option").as_deref(), Some("None"));

    run_until(&mut app, &mut host, at(11, 0));
    assert!(!host.pump_on());
    assert_eq!(host.calls, [RelayCall::On, RelayCall::Off]);
}

#[test]
fn cancel_while_idle_stops_pump() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::EightHours, 12, 0);
    select(&mut app, &mut host, BoostOption::None, 12, 45);
    assert!(!host.pump_on());
    assert_eq!(boost_spans(&host), ["BOOST_START 480", "BOOST_CANCELED 45"]);
    assert_eq!(app.run_state().active, ActiveWindow::None);
}

#[test]
fn cancel_without_boost_is_noop() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::None, 12, 0);
    assert!(host.events.is_empty());
    assert!(host.calls.is_empty());
}

#[test]
fn new_boost_replaces_running_one() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::OneHour, 12, 0);
    select(&mut app, &mut host, BoostOption::FourHours, 12, 20);

    assert_eq!(
        boost_spans(&host),
        ["BOOST_START 60", "BOOST_CANCELED 20", "BOOST_START 240"]
    );
    assert_eq!(host.timers.deadline(Trigger::BoostExpiry), Some(at(16, 20)));
    assert_eq!(app.boost().map(|b| b.option), Some(BoostOption::FourHours));
    assert_eq!(host.calls, [RelayCall::On]);

    run_until(&mut app, &mut host, at(13, 0));
    assert!(host.pump_on(), "old expiry was cancelled");

    run_until(&mut app, &mut host, at(16, 20));
    assert!(!host.pump_on());
    assert_eq!(host.event_types().last().map(String::as_str), Some("BOOST_END"));
}

#[test]
fn boost_start_failure_leaves_nothing_behind() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    host.fail_commands = 1;
    let result =
        app.handle_command(AppCommand::SelectBoost(BoostOption::OneHour), at(12, 0), &mut host);
    assert!(result.is_err());
    assert_eq!(app.boost(), None);
    assert!(host.events.is_empty());
    assert!(!host.timers.is_armed(Trigger::BoostExpiry));
}

#[test]
fn failed_replacement_keeps_running_boost() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::OneHour, 12, 0);
    // Pump dropped out behind our back; the new start has to command it.
    host.relay = Some(RelayState::Off);
    host.fail_commands = 1;

    let result =
        app.handle_command(AppCommand::SelectBoost(BoostOption::FourHours), at(12, 20), &mut host);
    assert!(result.is_err());
    assert_eq!(app.boost().map(|b| b.option), Some(BoostOption::OneHour));
    assert_eq!(boost_spans(&host), ["BOOST_START 60"]);
    assert_eq!(host.stored("boost", "option").as_deref(), Some("1H"));
    assert_eq!(host.timers.deadline(Trigger::BoostExpiry), Some(at(13, 0)));
}

#[test]
fn mode_change_keeps_boost_expiry() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::TwoHours, 12, 0);
    app.handle_command(AppCommand::ModeChanged(PoolMode::PassiveWinter), at(12, 5), &mut host)
        .unwrap();
    assert_eq!(host.timers.armed(), 1);
    assert_eq!(host.timers.deadline(Trigger::BoostExpiry), Some(at(14, 0)));

    run_until(&mut app, &mut host, at(14, 0));
    assert!(!host.pump_on());
}

// ── Restart ───────────────────────────────────────────────────

#[test]
fn live_boost_survives_restart() {
    let (mut app, mut host) = started(standard_config(), at(11, 10));
    select(&mut app, &mut host, BoostOption::OneHour, 11, 10);
    run_until(&mut app, &mut host, at(12, 0));
    app.shutdown(&mut host);

    let mut app = AppService::new(standard_config());
    app.start(at(12, 0), &mut host).unwrap();
    assert_eq!(app.boost().map(|b| b.end), Some(at(12, 10)));
    assert_eq!(host.timers.deadline(Trigger::BoostExpiry), Some(at(12, 10)));
    assert!(host.pump_on());

    run_until(&mut app, &mut host, at(12, 10));
    assert!(!host.pump_on());
    assert_eq!(host.event_types(), ["BOOST_START", "BOOST_END"]);
}

#[test]
fn expired_boost_is_discarded_on_restart() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::OneHour, 12, 0);
    run_until(&mut app, &mut host, at(12, 30));
    app.shutdown(&mut host);

    host.timers.set_clock(at(14, 0));
    let mut app = AppService::new(standard_config());
    app.start(at(14, 0), &mut host).unwrap();

    assert_eq!(app.boost(), None);
    assert!(!host.pump_on());
    assert_eq!(host.event_types(), ["BOOST_START"], "no event for a stale boost");
    assert_eq!(host.stored("boost", "option").as_deref(), Some("None"));
    assert_eq!(app.run_state().active, ActiveWindow::None);
    assert!(!host.timers.is_armed(Trigger::BoostExpiry));
}

#[test]
fn unreadable_boost_record_releases_pump_on_restart() {
    let (mut app, mut host) = started(standard_config(), at(12, 0));
    select(&mut app, &mut host, BoostOption::OneHour, 12, 0);
    app.shutdown(&mut host);
    host.write("boost", "boost_end_time", "garbage").unwrap();

    host.timers.set_clock(at(14, 0));
    let mut app = AppService::new(standard_config());
    app.start(at(14, 0), &mut host).unwrap();

    assert_eq!(app.boost(), None);
    assert!(!host.pump_on());
    assert_eq!(host.calls, [RelayCall::On, RelayCall::Off]);
    assert_eq!(app.run_state().active, ActiveWindow::None);
    assert_eq!(host.stored("filtration", "active_slot"), None);
    assert_eq!(host.stored("boost", "option").as_deref(), Some("None"));

    run_until(&mut app, &mut host, at(19, 0));
    assert!(!host.pump_on());
}
