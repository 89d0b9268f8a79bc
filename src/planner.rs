//! Slot planner.
//!
//! Pure functions from (configuration, recommendation, clock) to today's
//! windows.  Nothing here touches a port, so every rule is unit-testable
//! with literal timestamps.
//!
//! ```text
//!  recommendation ──▶ clamp(min, max) ──▶ total
//!                                          │
//!             slot1 % ──▶ round(total·%/100) ──▶ Slot1 window
//!             slot2 % ──▶ round(total·%/100) ──▶ Slot2 window
//!  winter.duration_minutes ───────────────────▶ Winter window
//! ```

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::{debug, warn};

use crate::config::{FiltrationConfig, Slot};
use crate::engine::WindowKind;

/// Why a window could not be planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// The recommendation signal is absent or not a usable number.
    RecommendationUnavailable,
    /// The slot's percent is 0.
    SlotAbsent(WindowKind),
    /// The slot has a nonzero percent but no start time.
    StartTimeMissing(WindowKind),
    /// Winter start time or duration is not configured.
    WinterIncomplete,
}

impl core::fmt::Display for PlanError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RecommendationUnavailable => write!(f, "filtration recommendation unavailable"),
            Self::SlotAbsent(kind) => write!(f, "{kind} has a 0% share"),
            Self::StartTimeMissing(kind) => write!(f, "{kind} has no start time"),
            Self::WinterIncomplete => write!(f, "winter start time or duration missing"),
        }
    }
}

/// A concrete, dated run window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWindow {
    pub kind: WindowKind,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub duration_minutes: u32,
    /// The day total this window was sized from: the clamped summer total
    /// for a slot, the window itself for winter.
    pub objective_minutes: u32,
}

impl PlannedWindow {
    fn new(
        kind: WindowKind,
        start: NaiveDateTime,
        duration_minutes: u32,
        objective_minutes: u32,
    ) -> Self {
        let stop = truncate_to_minute(start + TimeDelta::minutes(i64::from(duration_minutes)));
        Self {
            kind,
            start,
            stop,
            duration_minutes,
            objective_minutes,
        }
    }
}

/// Today's plan.  `None` means the window is not planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayPlan {
    /// Clamped summer total, if the recommendation was usable.
    pub summer_total_minutes: Option<u32>,
    pub slot1: Option<PlannedWindow>,
    pub slot2: Option<PlannedWindow>,
    pub winter: Option<PlannedWindow>,
}

/// Apply the optional min/max bounds to a recommended duration.
pub fn clamp_duration(recommended: u32, min: Option<u32>, max: Option<u32>) -> u32 {
    let mut duration = recommended;
    if let Some(min) = min {
        duration = duration.max(min);
    }
    if let Some(max) = max {
        duration = duration.min(max);
    }
    duration
}

/// A slot's share of `total`, rounded half-to-even.
pub fn slot_minutes(total: u32, percent: u8) -> u32 {
    (f64::from(total) * f64::from(percent) / 100.0).round_ties_even() as u32
}

/// The day's summer total: recommendation truncated to whole minutes, then
/// clamped.
pub fn summer_total_minutes(
    config: &FiltrationConfig,
    recommended: Option<f64>,
) -> Result<u32, PlanError> {
    let raw = recommended
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or(PlanError::RecommendationUnavailable)?;
    let recommended = raw.trunc() as u32;
    let total = clamp_duration(
        recommended,
        config.summer.min_duration_minutes,
        config.summer.max_duration_minutes,
    );
    if total != recommended {
        debug!(
            "Planner: adjusted summer duration {} -> {} min (min={:?}, max={:?})",
            recommended, total, config.summer.min_duration_minutes, config.summer.max_duration_minutes
        );
    }
    Ok(total)
}

/// Plan a single window starting at `start`.
///
/// Window-start handlers call this with `start = now` so the duration always
/// reflects the latest recommendation.
pub fn plan_window(
    config: &FiltrationConfig,
    kind: WindowKind,
    recommended: Option<f64>,
    start: NaiveDateTime,
) -> Result<PlannedWindow, PlanError> {
    match kind {
        WindowKind::Slot1 | WindowKind::Slot2 => {
            let slot = slot_of(config, kind);
            check_slot(kind, slot)?;
            let total = summer_total_minutes(config, recommended)?;
            Ok(PlannedWindow::new(kind, start, slot_minutes(total, slot.duration_percent), total))
        }
        WindowKind::Winter => {
            let minutes = winter_minutes(config)?;
            Ok(PlannedWindow::new(kind, start, minutes, minutes))
        }
    }
}

/// Plan every window for the calendar day of `now`, at their configured
/// start times.
pub fn plan(config: &FiltrationConfig, recommended: Option<f64>, now: NaiveDateTime) -> DayPlan {
    let today = now.date();
    let total = summer_total_minutes(config, recommended).ok();

    let summer_slot = |kind: WindowKind| -> Option<PlannedWindow> {
        let slot = slot_of(config, kind);
        if let Err(e) = check_slot(kind, slot) {
            if matches!(e, PlanError::StartTimeMissing(_)) {
                warn!("Planner: {}", e);
            }
            return None;
        }
        let start = today.and_time(slot.start_time?);
        let total = total?;
        Some(PlannedWindow::new(kind, start, slot_minutes(total, slot.duration_percent), total))
    };

    let winter = match (config.winter.start_time, winter_minutes(config)) {
        (Some(start), Ok(minutes)) => {
            Some(PlannedWindow::new(WindowKind::Winter, today.and_time(start), minutes, minutes))
        }
        _ => None,
    };

    DayPlan {
        summer_total_minutes: total,
        slot1: summer_slot(WindowKind::Slot1),
        slot2: summer_slot(WindowKind::Slot2),
        winter,
    }
}

/// Next occurrence of `target` strictly after `now`: today if it is still
/// ahead, otherwise tomorrow.
pub fn next_run(now: NaiveDateTime, target: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(target);
    if today <= now {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// Time of day at which a window starting at `start` ends (wraps past
/// midnight).
pub fn end_time_of_day(start: NaiveTime, duration_minutes: u32) -> NaiveTime {
    start + TimeDelta::minutes(i64::from(duration_minutes))
}

/// Drop seconds and sub-seconds.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

fn slot_of(config: &FiltrationConfig, kind: WindowKind) -> Slot {
    match kind {
        WindowKind::Slot2 => config.summer.slot2,
        _ => config.summer.slot1,
    }
}

fn check_slot(kind: WindowKind, slot: Slot) -> Result<(), PlanError> {
    if slot.is_absent() {
        return Err(PlanError::SlotAbsent(kind));
    }
    if slot.start_time.is_none() {
        return Err(PlanError::StartTimeMissing(kind));
    }
    Ok(())
}

fn winter_minutes(config: &FiltrationConfig) -> Result<u32, PlanError> {
    match (config.winter.start_time, config.winter.duration_minutes) {
        (Some(_), Some(minutes)) if minutes > 0 => Ok(minutes),
        _ => Err(PlanError::WinterIncomplete),
    }
}
