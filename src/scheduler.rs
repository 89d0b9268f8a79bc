//! Trigger scheduler.
//!
//! Decides which host timers must be armed for the current pool mode and
//! owns their cancellation handles.  This is the only place where the pool
//! mode matters; everything downstream works purely on the run state.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Slot 1    │  │ Slot 2    │  │ Winter    │  │ Boost    │   │
//! │  │ (daily)   │  │ (daily)   │  │ (daily)   │  │ (once)   │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │   ┌──────────┴──┐           │              │        │
//! │        │   │ Heartbeat   │           │              │        │
//! │        │   │ (xx:xx:00)  │           │              │        │
//! │        ▼   └──────┬──────┘           ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                TimerPort (host event loop)             │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                AppService.on_trigger()                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-arming always replaces the whole [`ActiveTriggerSet`]: every handle
//! is cancelled first, then the new set is armed.  A stale callback after a
//! reconfiguration is impossible by construction.

use chrono::{NaiveDateTime, NaiveTime};
use heapless::Vec;
use log::{debug, info};

use crate::app::ports::{TimerHandle, TimerPort};
use crate::config::FiltrationConfig;
use crate::planner;

// ═══════════════════════════════════════════════════════════════
//  Mode and trigger types
// ═══════════════════════════════════════════════════════════════

/// Seasonal mode selected by the operator or derived from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolMode {
    /// Summer: two percentage slots.
    Standard,
    /// Winter with a fixed daily window.
    ActiveWinter,
    /// Winter with no automation.
    PassiveWinter,
}

impl PoolMode {
    /// Parse either the operator label (`Active-Winter`) or the cloud API
    /// code (`ACTIVE_WINTER`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Standard" | "STANDARD" => Some(Self::Standard),
            "Active-Winter" | "ACTIVE_WINTER" => Some(Self::ActiveWinter),
            "Passive-Winter" | "WINTER" => Some(Self::PassiveWinter),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::ActiveWinter => "Active-Winter",
            Self::PassiveWinter => "Passive-Winter",
        }
    }
}

impl core::fmt::Display for PoolMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a timer was armed for.  Passed back on fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Slot1Start,
    Slot2Start,
    WinterStart,
    /// Per-minute monitor tick.
    Heartbeat,
    /// One-shot end of a boost.
    BoostExpiry,
}

/// A timer the scheduler wants armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmRequest {
    Daily { time: NaiveTime, trigger: Trigger },
    EveryMinute { trigger: Trigger },
    At { at: NaiveDateTime, trigger: Trigger },
}

impl ArmRequest {
    pub fn trigger(&self) -> Trigger {
        match *self {
            Self::Daily { trigger, .. } | Self::EveryMinute { trigger } | Self::At { trigger, .. } => {
                trigger
            }
        }
    }
}

/// Maximum number of simultaneously armed timers (one per [`Trigger`]).
pub const MAX_TRIGGERS: usize = 5;

/// Inputs the scheduler looks at when re-arming.
#[derive(Debug, Clone, Copy)]
pub struct ArmContext<'a> {
    pub config: &'a FiltrationConfig,
    pub mode: Option<PoolMode>,
    /// End of a live boost, if any.
    pub boost_end: Option<NaiveDateTime>,
    /// A scheduled window is in progress (e.g. restored after a restart).
    pub window_in_progress: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Active trigger set
// ═══════════════════════════════════════════════════════════════

/// Handles of every timer currently armed on the host.
#[derive(Debug, Default)]
pub struct ActiveTriggerSet {
    entries: Vec<(Trigger, TimerHandle), MAX_TRIGGERS>,
}

impl ActiveTriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm every request on `timer` and return the resulting set.
    pub fn arm(requests: &[ArmRequest], timer: &mut impl TimerPort) -> Self {
        let mut set = Self::new();
        for req in requests {
            let handle = match *req {
                ArmRequest::Daily { time, trigger } => timer.schedule_daily(time, trigger),
                ArmRequest::EveryMinute { trigger } => timer.schedule_every_minute(trigger),
                ArmRequest::At { at, trigger } => timer.schedule_at(at, trigger),
            };
            set.insert(req.trigger(), handle, timer);
        }
        set
    }

    /// Record a handle.  An existing handle for the same trigger is
    /// cancelled first.
    pub fn insert(&mut self, trigger: Trigger, handle: TimerHandle, timer: &mut impl TimerPort) {
        if let Some(old) = self.take(trigger) {
            timer.cancel(old);
        }
        // One slot per Trigger variant, so this cannot overflow.
        let _ = self.entries.push((trigger, handle));
    }

    /// Remove a trigger's handle without cancelling it (e.g. it just fired).
    pub fn take(&mut self, trigger: Trigger) -> Option<TimerHandle> {
        let idx = self.entries.iter().position(|(t, _)| *t == trigger)?;
        Some(self.entries.swap_remove(idx).1)
    }

    /// Cancel and forget one trigger.
    pub fn cancel(&mut self, trigger: Trigger, timer: &mut impl TimerPort) -> bool {
        match self.take(trigger) {
            Some(handle) => {
                timer.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Cancel every armed timer.
    pub fn cancel_all(&mut self, timer: &mut impl TimerPort) {
        for (trigger, handle) in self.entries.iter() {
            debug!("Scheduler: cancelling {:?} ({:?})", trigger, handle);
            timer.cancel(*handle);
        }
        self.entries.clear();
    }

    pub fn contains(&self, trigger: Trigger) -> bool {
        self.entries.iter().any(|(t, _)| *t == trigger)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn triggers(&self) -> impl Iterator<Item = Trigger> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Compute the timers to arm.  Pure; see [`rearm`] for the side effects.
pub fn arm_requests(ctx: ArmContext<'_>, now: NaiveDateTime) -> Vec<ArmRequest, MAX_TRIGGERS> {
    let mut out: Vec<ArmRequest, MAX_TRIGGERS> = Vec::new();
    let config = ctx.config;

    match ctx.mode {
        Some(PoolMode::Standard) if config.summer_active() => {
            if let Some(time) = config.summer.slot1.start_time {
                info!(
                    "Scheduler: slot #1 at {}, next run {}",
                    time,
                    planner::next_run(now, time)
                );
                let _ = out.push(ArmRequest::Daily {
                    time,
                    trigger: Trigger::Slot1Start,
                });
            }
            let slot2 = config.summer.slot2;
            match slot2.start_time {
                Some(time) if !slot2.is_absent() => {
                    info!(
                        "Scheduler: slot #2 at {}, next run {}",
                        time,
                        planner::next_run(now, time)
                    );
                    let _ = out.push(ArmRequest::Daily {
                        time,
                        trigger: Trigger::Slot2Start,
                    });
                }
                None if !slot2.is_absent() => {
                    log::warn!("Scheduler: slot #2 has a share but no start time, not armed");
                }
                _ => {}
            }
        }
        Some(PoolMode::ActiveWinter) if config.winter_active() => {
            match (config.winter.start_time, config.winter.duration_minutes) {
                (Some(time), Some(minutes)) if minutes > 0 => {
                    info!(
                        "Scheduler: winter window at {} for {} min, next run {}",
                        time,
                        minutes,
                        planner::next_run(now, time)
                    );
                    let _ = out.push(ArmRequest::Daily {
                        time,
                        trigger: Trigger::WinterStart,
                    });
                }
                _ => debug!("Scheduler: winter window incomplete, not armed"),
            }
        }
        mode => debug!("Scheduler: no window triggers for mode {:?}", mode),
    }

    if !out.is_empty() || ctx.window_in_progress {
        let _ = out.push(ArmRequest::EveryMinute {
            trigger: Trigger::Heartbeat,
        });
    }

    if let Some(at) = ctx.boost_end {
        if at > now {
            let _ = out.push(ArmRequest::At {
                at,
                trigger: Trigger::BoostExpiry,
            });
        }
    }

    out
}

/// Cancel everything in `set`, then arm the requests for `ctx`.
pub fn rearm(
    set: &mut ActiveTriggerSet,
    ctx: ArmContext<'_>,
    now: NaiveDateTime,
    timer: &mut impl TimerPort,
) {
    set.cancel_all(timer);
    let requests = arm_requests(ctx, now);
    *set = ActiveTriggerSet::arm(&requests, timer);
    info!(
        "Scheduler: armed {} trigger(s) for mode {:?}",
        set.len(),
        ctx.mode
    );
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
