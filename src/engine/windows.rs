//! Window-start handlers (slot 1, slot 2, winter).
//!
//! The duration is re-planned at fire time so it reflects the latest
//! recommendation, not the one seen when the trigger was armed.

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::app::events::{FiltrationEvent, Span};
use crate::app::ports::FiltrationHost;
use crate::error::Result;
use crate::planner;

use super::{EngineContext, ScheduledWindow, WindowKind};

/// Start `kind` at `now`.
///
/// A planning failure returns before the pump or the run state is touched.
pub fn start_window(
    ctx: &mut EngineContext,
    kind: WindowKind,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<ScheduledWindow> {
    let planned = planner::plan_window(&ctx.config, kind, host.recommended_minutes(), now)?;
    let day_objective_minutes = Some(planned.objective_minutes);
    debug!(
        "Window: {} planned for {} min (objective {:?}), stop {}",
        kind, planned.duration_minutes, day_objective_minutes, planned.stop
    );

    ctx.pump.start(host)?;

    if let Some(prev) = ctx.run_state.scheduled() {
        info!("Window: {} takes over from {} (was due {})", kind, prev.kind, prev.stop);
    }
    let window = ScheduledWindow {
        kind,
        start: now,
        stop: planned.stop,
        planned_minutes: planned.duration_minutes,
        day_objective_minutes,
    };
    ctx.run_state.begin(window);
    ctx.run_state.save(host)?;

    info!(
        "Window: {} started at {}, stop at {} ({} min)",
        kind, now, window.stop, window.planned_minutes
    );
    host.emit(&FiltrationEvent::WindowStarted {
        kind,
        span: Span {
            start: now,
            end: window.stop,
            duration_minutes: i64::from(window.planned_minutes),
        },
    });
    Ok(window)
}
