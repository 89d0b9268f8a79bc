//! Boost override.
//!
//! A user-selected, fixed-duration run that takes the pump away from the
//! scheduled windows.  The scheduled window's run state is left alone while
//! a boost runs; only the pump stop is suppressed.

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info, warn};

use crate::app::events::{FiltrationEvent, Span};
use crate::app::ports::{FiltrationHost, StoragePort};
use crate::error::{Error, Result};
use crate::scheduler::Trigger;

use super::{ActiveWindow, EngineContext};
use super::run_state::{format_timestamp, parse_timestamp, read_parsed};

pub const NAMESPACE: &str = "boost";

const KEY_OPTION: &str = "option";
const KEY_START: &str = "boost_start_time";
const KEY_END: &str = "boost_end_time";

/// The boost selector's options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoostOption {
    #[default]
    None,
    OneHour,
    TwoHours,
    FourHours,
    EightHours,
    OneDay,
}

impl BoostOption {
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::OneHour,
        Self::TwoHours,
        Self::FourHours,
        Self::EightHours,
        Self::OneDay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::OneHour => "1H",
            Self::TwoHours => "2H",
            Self::FourHours => "4H",
            Self::EightHours => "8H",
            Self::OneDay => "24H",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("none") {
            return Some(Self::None);
        }
        Self::ALL.into_iter().find(|o| o.label() == raw)
    }

    pub fn hours(self) -> u32 {
        match self {
            Self::None => 0,
            Self::OneHour => 1,
            Self::TwoHours => 2,
            Self::FourHours => 4,
            Self::EightHours => 8,
            Self::OneDay => 24,
        }
    }

    pub fn duration(self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.hours()))
    }
}

impl core::fmt::Display for BoostOption {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A running boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostState {
    pub option: BoostOption,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BoostState {
    pub fn new(option: BoostOption, start: NaiveDateTime) -> Self {
        Self {
            option,
            start,
            end: start + option.duration(),
        }
    }

    /// Whole minutes left at `now`, 0 once expired.
    pub fn remaining_minutes(&self, now: NaiveDateTime) -> i64 {
        if self.end > now {
            (self.end - now).num_minutes()
        } else {
            0
        }
    }

    pub fn load(store: &impl StoragePort) -> Result<Option<Self>> {
        let option = read_parsed(store, NAMESPACE, KEY_OPTION, |key, raw| {
            BoostOption::parse(raw).ok_or_else(|| Error::Corrupt {
                key,
                value: raw.to_owned(),
            })
        })?;
        let start = read_parsed(store, NAMESPACE, KEY_START, parse_timestamp)?;
        let end = read_parsed(store, NAMESPACE, KEY_END, parse_timestamp)?;

        match (option, end) {
            (Some(option), Some(end)) if option != BoostOption::None => {
                let Some(start) = start.or_else(|| end.checked_sub_signed(option.duration()))
                else {
                    warn!("Boost: {} end time {} out of range, ignoring", option, end);
                    return Ok(None);
                };
                Ok(Some(Self { option, start, end }))
            }
            _ => Ok(None),
        }
    }

    pub fn save(&self, store: &mut impl StoragePort) -> Result<()> {
        store.write(NAMESPACE, KEY_OPTION, self.option.label())?;
        store.write(NAMESPACE, KEY_START, &format_timestamp(self.start))?;
        store.write(NAMESPACE, KEY_END, &format_timestamp(self.end))?;
        Ok(())
    }

    pub fn erase(store: &mut impl StoragePort) -> Result<()> {
        store.write(NAMESPACE, KEY_OPTION, BoostOption::None.label())?;
        store.delete(NAMESPACE, KEY_START)?;
        store.delete(NAMESPACE, KEY_END)?;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Handlers
// ───────────────────────────────────────────────────────────────

/// Apply a boost selector change.  `None` cancels.
pub fn select(
    ctx: &mut EngineContext,
    option: BoostOption,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<()> {
    match option {
        BoostOption::None => cancel_boost(ctx, now, host).map(|_| ()),
        option => start_boost(ctx, option, now, host).map(|_| ()),
    }
}

/// Start a boost, replacing any running one.  A relay failure leaves the
/// running boost in place.
pub fn start_boost(
    ctx: &mut EngineContext,
    option: BoostOption,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<BoostState> {
    ctx.pump.start(host)?;

    if let Some(old) = ctx.boost.take() {
        ctx.triggers.cancel(Trigger::BoostExpiry, host);
        info!("Boost: {} replaced by {}", old.option, option);
        host.emit(&FiltrationEvent::BoostCanceled(Span::between(old.start, now)));
        BoostState::erase(host)?;
    }
    if ctx.run_state.clear_boost_marker() {
        debug!("Boost: cleared stale boost marker");
    }

    let state = BoostState::new(option, now);
    state.save(host)?;
    let handle = host.schedule_at(state.end, Trigger::BoostExpiry);
    ctx.triggers.insert(Trigger::BoostExpiry, handle, host);
    ctx.boost = Some(state);

    ctx.run_state.mark_boost();
    ctx.run_state.save(host)?;

    info!("Boost: {} started, ends {}", option, state.end);
    host.emit(&FiltrationEvent::BoostStarted(Span::between(state.start, state.end)));
    Ok(state)
}

/// User selected "None".  Returns the cancelled boost, if one was running.
pub fn cancel_boost(
    ctx: &mut EngineContext,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<Option<BoostState>> {
    let Some(state) = ctx.boost.take() else {
        debug!("Boost: nothing to cancel");
        return Ok(None);
    };
    ctx.triggers.cancel(Trigger::BoostExpiry, host);
    BoostState::erase(host)?;

    info!("Boost: {} cancelled after {} min", state.option, (now - state.start).num_minutes());
    host.emit(&FiltrationEvent::BoostCanceled(Span::between(state.start, now)));

    release_pump(ctx, host)?;
    Ok(Some(state))
}

/// The expiry timer fired.
pub fn on_boost_expired(
    ctx: &mut EngineContext,
    host: &mut impl FiltrationHost,
) -> Result<Option<BoostState>> {
    // One-shot: the handle is spent.
    ctx.triggers.take(Trigger::BoostExpiry);
    let Some(state) = ctx.boost.take() else {
        debug!("Boost: expiry fired with no boost running");
        return Ok(None);
    };

    info!("Boost: {} finished", state.option);
    host.emit(&FiltrationEvent::BoostEnded(Span::between(state.start, state.end)));
    BoostState::erase(host)?;

    release_pump(ctx, host)?;
    Ok(Some(state))
}

/// Restart recovery.  A live boost is kept (its timer is armed by the next
/// re-arm); an expired one is discarded and releases the pump.
pub fn restore_boost(
    ctx: &mut EngineContext,
    now: NaiveDateTime,
    host: &mut impl FiltrationHost,
) -> Result<Option<BoostState>> {
    let Some(state) = BoostState::load(host)? else {
        if ctx.run_state.active == ActiveWindow::Boost {
            warn!("Boost: marker set but no readable boost record, releasing");
            BoostState::erase(host)?;
            release_pump(ctx, host)?;
        }
        return Ok(None);
    };
    if state.end > now {
        info!(
            "Boost: restoring {} with {} min left",
            state.option,
            state.remaining_minutes(now)
        );
        ctx.boost = Some(state);
        return Ok(Some(state));
    }

    info!("Boost: {} expired during restart, discarding", state.option);
    ctx.boost = None;
    BoostState::erase(host)?;
    release_pump(ctx, host)?;
    Ok(None)
}

/// Stop the pump unless a scheduled window owns it, and drop the marker.
fn release_pump(ctx: &mut EngineContext, host: &mut impl FiltrationHost) -> Result<()> {
    if ctx.run_state.scheduled().is_none() {
        ctx.pump.stop(host)?;
    } else {
        debug!("Boost: scheduled window still active, pump stays on");
    }
    if ctx.run_state.clear_boost_marker() {
        ctx.run_state.save(host)?;
    }
    Ok(())
}
