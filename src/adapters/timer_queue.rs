//! Virtual-time timer queue.
//!
//! Implements [`TimerPort`] over a simulated clock.  The host loop pops due
//! timers in firing order and hands each trigger to the service, which may
//! cancel or arm timers in turn.
//!
//! Ties fire in arming order, so a window start armed before the heartbeat
//! runs first when both are due on the same minute.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use log::trace;

use crate::app::ports::{TimerHandle, TimerPort};
use crate::planner;
use crate::scheduler::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Daily,
    EveryMinute,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    handle: TimerHandle,
    trigger: Trigger,
    repeat: Repeat,
    next: NaiveDateTime,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: TimerHandle,
    pub trigger: Trigger,
    pub at: NaiveDateTime,
}

#[derive(Debug)]
pub struct TimerQueue {
    clock: NaiveDateTime,
    next_id: u32,
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new(clock: NaiveDateTime) -> Self {
        Self {
            clock,
            next_id: 1,
            timers: Vec::new(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock
    }

    /// Move the clock forward without firing anything.
    pub fn set_clock(&mut self, now: NaiveDateTime) {
        self.clock = self.clock.max(now);
    }

    pub fn armed(&self) -> usize {
        self.timers.len()
    }

    pub fn is_armed(&self, trigger: Trigger) -> bool {
        self.timers.iter().any(|t| t.trigger == trigger)
    }

    /// Next fire time of `trigger`, if armed.
    pub fn deadline(&self, trigger: Trigger) -> Option<NaiveDateTime> {
        self.timers
            .iter()
            .filter(|t| t.trigger == trigger)
            .map(|t| t.next)
            .min()
    }

    /// Pop the earliest timer due at or before `until` and advance the
    /// clock to it.  Repeating timers are re-queued.
    pub fn pop_due(&mut self, until: NaiveDateTime) -> Option<Fired> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next <= until)
            .min_by_key(|(_, t)| (t.next, t.handle.0))
            .map(|(i, _)| i)?;

        let timer = self.timers[idx];
        self.clock = self.clock.max(timer.next);
        match timer.repeat {
            Repeat::Once => {
                self.timers.remove(idx);
            }
            Repeat::Daily => self.timers[idx].next = timer.next + TimeDelta::days(1),
            Repeat::EveryMinute => self.timers[idx].next = timer.next + TimeDelta::minutes(1),
        }
        trace!("TimerQueue: {:?} fired at {}", timer.trigger, timer.next);
        Some(Fired {
            handle: timer.handle,
            trigger: timer.trigger,
            at: timer.next,
        })
    }

    fn push(&mut self, trigger: Trigger, repeat: Repeat, next: NaiveDateTime) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.timers.push(Timer {
            handle,
            trigger,
            repeat,
            next,
        });
        handle
    }
}

impl TimerPort for TimerQueue {
    fn schedule_at(&mut self, at: NaiveDateTime, trigger: Trigger) -> TimerHandle {
        self.push(trigger, Repeat::Once, at)
    }

    fn schedule_daily(&mut self, time: NaiveTime, trigger: Trigger) -> TimerHandle {
        let next = planner::next_run(self.clock, time);
        self.push(trigger, Repeat::Daily, next)
    }

    fn schedule_every_minute(&mut self, trigger: Trigger) -> TimerHandle {
        let next = planner::truncate_to_minute(self.clock) + TimeDelta::minutes(1);
        self.push(trigger, Repeat::EveryMinute, next)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.retain(|t| t.handle != handle);
    }
}
