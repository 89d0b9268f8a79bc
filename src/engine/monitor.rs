//! Monitor loop — the per-minute heartbeat.
//!
//! ```text
//!  pump off? ─────────────────────────────────▶ NotRunning
//!  no scheduled window? ──────────────────────▶ NoScheduledWindow
//!  now < stop? ───────────────────────────────▶ Running
//!  slot 2, elapsed feed short of objective? ──▶ Extended (stop moved)
//!  otherwise ─┬─ boost running ──▶ keep pump on ─┐
//!             └─ no boost ───────▶ pump off ─────┴─▶ clear RunState, *_END
//! ```
//!
//! [`check`] never fails: any error is logged and the next tick runs as
//! usual.

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, error, info};

use crate::app::events::{FiltrationEvent, Span, WindowEndReport};
use crate::app::ports::FiltrationHost;
use crate::error::Result;
use crate::planner;

use super::{EngineContext, ScheduledWindow, WindowKind};

/// What one heartbeat decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Relay is not on; nothing to monitor.
    NotRunning,
    /// Pump is on but no scheduled window owns it.
    NoScheduledWindow,
    /// Still inside the planned window.
    Running { stop: NaiveDateTime },
    /// Slot 2 extended to make up the day's shortfall.
    Extended { stop: NaiveDateTime, remaining_minutes: i64 },
    /// Window over; `pump_stopped` is false when a boost kept it running.
    Ended { kind: WindowKind, pump_stopped: bool },
    /// The tick hit an error and changed nothing further.
    Failed,
}

/// Run one heartbeat.  Errors are logged, never returned.
pub fn check(
    ctx: &mut EngineContext,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> MonitorOutcome {
    match try_check(ctx, now, host) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Monitor: periodic check failed: {}", e);
            MonitorOutcome::Failed
        }
    }
}

fn try_check(
    ctx: &mut EngineContext,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<MonitorOutcome> {
    if !ctx.pump.is_on(&*host) {
        return Ok(MonitorOutcome::NotRunning);
    }
    let Some(window) = ctx.run_state.scheduled().copied() else {
        debug!("Monitor: pump on without a scheduled window");
        return Ok(MonitorOutcome::NoScheduledWindow);
    };
    if now < window.stop {
        return Ok(MonitorOutcome::Running { stop: window.stop });
    }

    let elapsed_hours = host.elapsed_hours_today();

    if window.kind == WindowKind::Slot2 {
        if let Some(remaining) = shortfall_minutes(&window, elapsed_hours) {
            info!("Monitor: slot #2 is {} min short of the day's objective", remaining);
            if remaining > 0 {
                let stop = planner::truncate_to_minute(now + TimeDelta::minutes(remaining));
                info!("Monitor: extending slot #2 to {} (was {})", stop, window.stop);
                ctx.run_state.extend(stop);
                ctx.run_state.save(host)?;
                return Ok(MonitorOutcome::Extended {
                    stop,
                    remaining_minutes: remaining,
                });
            }
        }
    }

    let report = end_report(&*ctx, &window, elapsed_hours, now, &*host);

    let pump_stopped = if ctx.boost_active() {
        info!("Monitor: boost active, leaving pump on past {} end", window.kind);
        false
    } else {
        info!("Monitor: stopping pump, {} reached {}", window.kind, window.stop);
        ctx.pump.stop(host)?;
        true
    };

    ctx.run_state.clear();
    ctx.run_state.save(host)?;
    host.emit(&FiltrationEvent::WindowEnded {
        kind: window.kind,
        report,
    });

    Ok(MonitorOutcome::Ended {
        kind: window.kind,
        pump_stopped,
    })
}

/// Minutes still owed today, measured against the elapsed feed.  `None`
/// without a feed reading.
fn shortfall_minutes(window: &ScheduledWindow, elapsed_hours: Option<f64>) -> Option<i64> {
    let hours = elapsed_hours.filter(|h| h.is_finite())?;
    let objective = window.day_objective_minutes.unwrap_or(window.planned_minutes);
    Some((f64::from(objective) - hours * 60.0).round_ties_even() as i64)
}

fn end_report(
    ctx: &EngineContext,
    window: &ScheduledWindow,
    elapsed_hours: Option<f64>,
    now: NaiveDateTime,
    host: &impl FiltrationHost,
) -> WindowEndReport {
    let day_objective_minutes = match window.kind {
        WindowKind::Winter => window.day_objective_minutes,
        WindowKind::Slot1 | WindowKind::Slot2 => {
            planner::summer_total_minutes(&ctx.config, host.recommended_minutes())
                .ok()
                .or(window.day_objective_minutes)
        }
    };
    let day_elapsed_minutes = elapsed_hours.filter(|h| h.is_finite()).unwrap_or(0.0) * 60.0;
    let day_elapsed_percent = day_objective_minutes
        .filter(|m| *m > 0)
        .map(|m| (day_elapsed_minutes / f64::from(m) * 100.0).round_ties_even() as u32);

    WindowEndReport {
        span: Span::between(window.start, now),
        boost_in_progress: ctx.boost.map(|b| b.option),
        remaining_boost_minutes: ctx.boost.map_or(0, |b| b.remaining_minutes(now)),
        day_objective_minutes,
        day_elapsed_minutes,
        day_elapsed_percent,
    }
}
