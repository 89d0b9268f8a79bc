//! Relay on-time tracker — the elapsed-duration feed.
//!
//! Accumulates how long the relay has been on since local midnight, the
//! way a history-statistics sensor would.  Rolls over at midnight; a relay
//! that is on across midnight counts from 00:00 on the new day.

use chrono::{NaiveDateTime, TimeDelta};

#[derive(Debug, Clone)]
pub struct OnTimeTracker {
    day_start: NaiveDateTime,
    accumulated: TimeDelta,
    on_since: Option<NaiveDateTime>,
}

impl OnTimeTracker {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            day_start: midnight(now),
            accumulated: TimeDelta::zero(),
            on_since: None,
        }
    }

    /// Record the relay position at `now`.
    pub fn observe(&mut self, now: NaiveDateTime, on: bool) {
        self.roll(now);
        match (self.on_since, on) {
            (None, true) => self.on_since = Some(now),
            (Some(since), false) => {
                self.accumulated += now - since;
                self.on_since = None;
            }
            _ => {}
        }
    }

    /// Hours on since midnight of `now`'s day.
    pub fn elapsed_hours(&self, now: NaiveDateTime) -> f64 {
        let day = midnight(now);
        let (accumulated, on_since) = if day > self.day_start {
            (TimeDelta::zero(), self.on_since.map(|_| day))
        } else {
            (self.accumulated, self.on_since)
        };
        let running = on_since.map_or(TimeDelta::zero(), |since| now - since);
        (accumulated + running).num_seconds() as f64 / 3600.0
    }

    fn roll(&mut self, now: NaiveDateTime) {
        let day = midnight(now);
        if day > self.day_start {
            self.day_start = day;
            self.accumulated = TimeDelta::zero();
            if self.on_since.is_some() {
                self.on_since = Some(day);
            }
        }
    }
}

fn midnight(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_time(chrono::NaiveTime::MIN)
}
