//! Filtration engine — host simulation.
//!
//! Runs the engine against the in-memory adapters on a virtual clock and
//! simulates one summer day, a boost, and a restart.  Log level comes from
//! `RUST_LOG` (default `info`).
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioRelay<SimPin>  LogEventSink  MemoryStore  TimerQueue      │
//! │  (RelayPort)        (EventSink)   (Config+KV)  (TimerPort)     │
//! │  OnTimeTracker (elapsed feed)                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Planner · Scheduler · Monitor · Boost                 │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::info;
use tracing_subscriber::EnvFilter;

use iopool_filtration::adapters::sim::SimHost;
use iopool_filtration::app::commands::AppCommand;
use iopool_filtration::app::ports::ConfigPort;
use iopool_filtration::app::service::AppService;
use iopool_filtration::config::{FiltrationConfig, Slot, SummerConfig, WinterConfig};
use iopool_filtration::diagnostics::Diagnostics;
use iopool_filtration::engine::BoostOption;

const RELAY: &str = "switch.pool_pump";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let day = NaiveDate::from_ymd_opt(2025, 7, 14).context("invalid simulation date")?;
    let midnight = day.and_time(NaiveTime::MIN);

    let mut host = SimHost::new(RELAY, midnight);
    host.recommendation = Some(300.0);
    host.store
        .save(&demo_config()?)
        .context("demo configuration rejected")?;

    let mut app = AppService::from_store(&host.store)?;
    app.start(midnight, &mut host)?;
    info!("── simulating {} ──", day);

    run_until(&mut app, &mut host, at(day, 16, 0)?);

    // Two-hour boost in the afternoon gap between slots.
    let now = host.now();
    app.handle_command(AppCommand::SelectBoost(BoostOption::TwoHours), now, &mut host)?;
    run_until(&mut app, &mut host, at(day, 17, 0)?);

    // Restart mid-boost: a fresh service restores the boost from the store.
    app.shutdown(&mut host);
    let mut app = AppService::from_store(&host.store)?;
    let now = host.now();
    app.start(now, &mut host)?;

    run_until(&mut app, &mut host, day.and_time(NaiveTime::MIN) + TimeDelta::days(1));

    let now = host.now();
    info!("── end of day ──");
    info!("events: {}", host.events.len());
    info!(
        "diagnostics: {}",
        Diagnostics::collect(&app, now, &host).to_json()
    );
    app.shutdown(&mut host);
    Ok(())
}

/// Fire every due timer up to `until`, then park the clock there.
fn run_until(app: &mut AppService, host: &mut SimHost, until: NaiveDateTime) {
    while let Some(fired) = host.timers.pop_due(until) {
        app.on_trigger(fired.trigger, fired.at, host);
    }
    host.timers.set_clock(until);
}

fn at(day: NaiveDate, h: u32, m: u32) -> Result<NaiveDateTime> {
    day.and_hms_opt(h, m, 0).context("invalid simulation time")
}

fn demo_config() -> Result<FiltrationConfig> {
    let time = |h| NaiveTime::from_hms_opt(h, 0, 0).context("invalid slot time");
    Ok(FiltrationConfig {
        switch_reference: Some(RELAY.into()),
        summer: SummerConfig {
            enabled: true,
            min_duration_minutes: Some(120),
            max_duration_minutes: Some(720),
            slot1: Slot::new(Some(time(8)?), 60),
            slot2: Slot::new(Some(time(20)?), 40),
        },
        winter: WinterConfig {
            enabled: false,
            start_time: None,
            duration_minutes: None,
        },
    })
}
