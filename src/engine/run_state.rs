//! Persisted run state.
//!
//! Written as plain string scalars under the `filtration` namespace so a
//! restart mid-window picks up where it left off.  Unparseable values are
//! logged and treated as absent.

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};

use crate::app::ports::StoragePort;
use crate::error::{Error, Result};

use super::{ActiveWindow, ScheduledWindow, WindowKind};

pub const NAMESPACE: &str = "filtration";

const KEY_ACTIVE_SLOT: &str = "active_slot";
const KEY_NEXT_STOP: &str = "next_stop_time";
const KEY_WINDOW_START: &str = "window_start_time";
const KEY_PLANNED: &str = "planned_duration_minutes";
const KEY_OBJECTIVE: &str = "filtration_duration_minutes";
const KEY_SLOT1_END: &str = "slot1_end_time";
const KEY_SLOT2_END: &str = "slot2_end_time";

/// Wire format of every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunState {
    pub active: ActiveWindow,
    /// Kept after the slot ends, for display.
    pub slot1_end_time: Option<NaiveDateTime>,
    pub slot2_end_time: Option<NaiveDateTime>,
}

impl RunState {
    pub fn scheduled(&self) -> Option<&ScheduledWindow> {
        self.active.scheduled()
    }

    pub fn next_stop_time(&self) -> Option<NaiveDateTime> {
        self.scheduled().map(|w| w.stop)
    }

    /// Record a freshly started window.
    pub fn begin(&mut self, window: ScheduledWindow) {
        self.active = ActiveWindow::Scheduled(window);
        self.record_end(window.kind, window.stop);
    }

    /// Move the running window's stop time.  No-op without one.
    pub fn extend(&mut self, stop: NaiveDateTime) {
        if let ActiveWindow::Scheduled(w) = &mut self.active {
            w.stop = stop;
            let kind = w.kind;
            self.record_end(kind, stop);
        }
    }

    /// Forget the active window.  Slot end times stay.
    pub fn clear(&mut self) {
        self.active = ActiveWindow::None;
    }

    /// Set the boost marker if nothing is scheduled.  Returns whether it was
    /// set.
    pub fn mark_boost(&mut self) -> bool {
        if self.active == ActiveWindow::None {
            self.active = ActiveWindow::Boost;
            true
        } else {
            false
        }
    }

    /// Drop a boost marker.  Returns whether one was present.
    pub fn clear_boost_marker(&mut self) -> bool {
        if self.active == ActiveWindow::Boost {
            self.active = ActiveWindow::None;
            true
        } else {
            false
        }
    }

    fn record_end(&mut self, kind: WindowKind, stop: NaiveDateTime) {
        match kind {
            WindowKind::Slot1 => self.slot1_end_time = Some(stop),
            WindowKind::Slot2 => self.slot2_end_time = Some(stop),
            WindowKind::Winter => {}
        }
    }

    // ── Persistence ───────────────────────────────────────────

    pub fn load(store: &impl StoragePort) -> Result<Self> {
        let tag = store.read(NAMESPACE, KEY_ACTIVE_SLOT)?;
        let next_stop = read_timestamp(store, KEY_NEXT_STOP)?;
        let planned = read_minutes(store, KEY_PLANNED)?;

        let active = match tag.as_deref() {
            None | Some("") => ActiveWindow::None,
            Some("boost") => ActiveWindow::Boost,
            Some(raw) => match (WindowKind::from_tag(raw), next_stop) {
                (Some(kind), Some(stop)) => {
                    let planned_minutes = planned.unwrap_or(0);
                    let planned_span = TimeDelta::minutes(i64::from(planned_minutes));
                    let start = read_timestamp(store, KEY_WINDOW_START)?
                        .or_else(|| stop.checked_sub_signed(planned_span));
                    match start {
                        Some(start) => ActiveWindow::Scheduled(ScheduledWindow {
                            kind,
                            start,
                            stop,
                            planned_minutes,
                            day_objective_minutes: read_minutes(store, KEY_OBJECTIVE)?,
                        }),
                        None => {
                            warn!("RunState: {} stop time {} out of range, ignoring", kind, stop);
                            ActiveWindow::None
                        }
                    }
                }
                (Some(kind), None) => {
                    debug!("RunState: {} persisted without a stop time, ignoring", kind);
                    ActiveWindow::None
                }
                (None, _) => {
                    warn!("RunState: unknown active_slot {:?}, ignoring", raw);
                    ActiveWindow::None
                }
            },
        };

        Ok(Self {
            active,
            slot1_end_time: read_timestamp(store, KEY_SLOT1_END)?,
            slot2_end_time: read_timestamp(store, KEY_SLOT2_END)?,
        })
    }

    pub fn save(&self, store: &mut impl StoragePort) -> Result<()> {
        put(store, KEY_ACTIVE_SLOT, self.active.tag().map(str::to_owned))?;
        let w = self.scheduled();
        put(store, KEY_NEXT_STOP, w.map(|w| format_timestamp(w.stop)))?;
        put(store, KEY_WINDOW_START, w.map(|w| format_timestamp(w.start)))?;
        put(store, KEY_PLANNED, w.map(|w| w.planned_minutes.to_string()))?;
        put(
            store,
            KEY_OBJECTIVE,
            w.and_then(|w| w.day_objective_minutes).map(|m| m.to_string()),
        )?;
        put(store, KEY_SLOT1_END, self.slot1_end_time.map(format_timestamp))?;
        put(store, KEY_SLOT2_END, self.slot2_end_time.map(format_timestamp))?;
        Ok(())
    }
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a persisted timestamp.  Accepts fractional seconds.
pub fn parse_timestamp(key: &'static str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| Error::Corrupt {
            key,
            value: raw.to_owned(),
        })
}

pub(crate) fn read_timestamp(
    store: &impl StoragePort,
    key: &'static str,
) -> Result<Option<NaiveDateTime>> {
    read_parsed(store, NAMESPACE, key, parse_timestamp)
}

fn read_minutes(store: &impl StoragePort, key: &'static str) -> Result<Option<u32>> {
    read_parsed(store, NAMESPACE, key, |key, raw| {
        raw.trim().parse::<u32>().map_err(|_| Error::Corrupt {
            key,
            value: raw.to_owned(),
        })
    })
}

/// Read and parse one key; storage errors propagate, parse errors are
/// logged and read as absent.
pub(crate) fn read_parsed<T>(
    store: &impl StoragePort,
    namespace: &str,
    key: &'static str,
    parse: impl FnOnce(&'static str, &str) -> Result<T>,
) -> Result<Option<T>> {
    match store.read(namespace, key)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => match parse(key, &raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("{}: {}", namespace, e);
                Ok(None)
            }
        },
    }
}

fn put(store: &mut impl StoragePort, key: &str, value: Option<String>) -> Result<()> {
    match value {
        Some(v) => store.write(NAMESPACE, key, &v)?,
        None => store.delete(NAMESPACE, key)?,
    }
    Ok(())
}
