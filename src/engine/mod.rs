//! Filtration engine — window lifecycle, monitor loop and boost override.
//!
//! Every handler takes the [`EngineContext`] explicitly plus a host that
//! implements the port traits.  Nothing is looked up by name and nothing is
//! global.
//!
//! ```text
//!   Trigger ──▶ windows::start_window ──▶ pump on ──▶ RunState ──▶ *_START
//!
//!   Heartbeat ──▶ monitor::check ─┬─ still running       ──▶ (no-op)
//!                                 ├─ slot 2 short of goal ──▶ extend stop
//!                                 └─ window over          ──▶ pump off ──▶ *_END
//!                                    (pump stays on while a boost runs)
//! ```

pub mod boost;
pub mod context;
pub mod monitor;
pub mod run_state;
pub mod windows;

use chrono::NaiveDateTime;

use crate::scheduler::Trigger;

pub use boost::{BoostOption, BoostState};
pub use context::EngineContext;
pub use monitor::MonitorOutcome;
pub use run_state::RunState;

/// The three scheduled window kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Slot1,
    Slot2,
    Winter,
}

impl WindowKind {
    /// Value persisted as `active_slot`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Slot1 => "1",
            Self::Slot2 => "2",
            Self::Winter => "winter",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(Self::Slot1),
            "2" => Some(Self::Slot2),
            "winter" => Some(Self::Winter),
            _ => None,
        }
    }

    /// Prefix of the `<PREFIX>_START` / `<PREFIX>_END` event types.
    pub fn event_prefix(self) -> &'static str {
        match self {
            Self::Slot1 => "SLOT1",
            Self::Slot2 => "SLOT2",
            Self::Winter => "WINTER",
        }
    }

    pub fn from_trigger(trigger: Trigger) -> Option<Self> {
        match trigger {
            Trigger::Slot1Start => Some(Self::Slot1),
            Trigger::Slot2Start => Some(Self::Slot2),
            Trigger::WinterStart => Some(Self::Winter),
            Trigger::Heartbeat | Trigger::BoostExpiry => None,
        }
    }
}

impl core::fmt::Display for WindowKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Slot1 => "slot #1",
            Self::Slot2 => "slot #2",
            Self::Winter => "winter window",
        })
    }
}

/// A scheduled window that is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledWindow {
    pub kind: WindowKind,
    pub start: NaiveDateTime,
    /// Current stop time.  Moves forward on drift correction.
    pub stop: NaiveDateTime,
    pub planned_minutes: u32,
    /// The day's clamped summer total when the window started.  Drift
    /// correction measures the elapsed feed against this.
    pub day_objective_minutes: Option<u32>,
}

/// Who currently holds the pump.  At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveWindow {
    #[default]
    None,
    Scheduled(ScheduledWindow),
    /// A boost started with no scheduled window running.
    Boost,
}

impl ActiveWindow {
    pub fn scheduled(&self) -> Option<&ScheduledWindow> {
        match self {
            Self::Scheduled(w) => Some(w),
            _ => None,
        }
    }

    /// Persisted `active_slot` value.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Scheduled(w) => Some(w.kind.tag()),
            Self::Boost => Some("boost"),
        }
    }
}
