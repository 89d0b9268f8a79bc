//! Simulation host.
//!
//! Bundles the in-memory adapters into one value that implements every
//! port, so the service can be driven on a virtual clock.  The relay is a
//! [`GpioRelay`] over a [`SimPin`]; the elapsed feed is an
//! [`OnTimeTracker`] fed from relay commands.

use core::convert::Infallible;

use chrono::NaiveDateTime;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::app::events::FiltrationEvent;
use crate::app::ports::{
    EventSink, RelayError, RelayPort, RelayState, SignalPort, StorageError, StoragePort,
    TimerHandle, TimerPort,
};
use crate::scheduler::{PoolMode, Trigger};

use super::gpio_relay::GpioRelay;
use super::log_sink::LogEventSink;
use super::memory_store::MemoryStore;
use super::on_time::OnTimeTracker;
use super::timer_queue::TimerQueue;

/// In-memory output pin.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimPin {
    high: bool,
}

impl SimPin {
    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

pub struct SimHost {
    pub relay: GpioRelay<SimPin>,
    pub store: MemoryStore,
    pub timers: TimerQueue,
    pub sink: LogEventSink,
    pub on_time: OnTimeTracker,
    pub recommendation: Option<f64>,
    pub mode: Option<PoolMode>,
    /// Every event, in emission order.
    pub events: Vec<FiltrationEvent>,
}

impl SimHost {
    pub fn new(relay: &str, now: NaiveDateTime) -> Self {
        Self {
            relay: GpioRelay::new(relay, SimPin::default()),
            store: MemoryStore::new(),
            timers: TimerQueue::new(now),
            sink: LogEventSink::new("sim-pool", "Simulated pool"),
            on_time: OnTimeTracker::new(now),
            recommendation: None,
            mode: Some(PoolMode::Standard),
            events: Vec::new(),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.timers.now()
    }

    pub fn pump_on(&self) -> bool {
        self.relay.pin().is_high()
    }
}

impl RelayPort for SimHost {
    fn relay_state(&self, relay: &str) -> Option<RelayState> {
        self.relay.relay_state(relay)
    }

    fn turn_on(&mut self, relay: &str) -> Result<(), RelayError> {
        self.relay.turn_on(relay)?;
        self.on_time.observe(self.timers.now(), true);
        Ok(())
    }

    fn turn_off(&mut self, relay: &str) -> Result<(), RelayError> {
        self.relay.turn_off(relay)?;
        self.on_time.observe(self.timers.now(), false);
        Ok(())
    }
}

impl SignalPort for SimHost {
    fn recommended_minutes(&self) -> Option<f64> {
        self.recommendation
    }

    fn elapsed_hours_today(&self) -> Option<f64> {
        Some(self.on_time.elapsed_hours(self.timers.now()))
    }

    fn pool_mode(&self) -> Option<PoolMode> {
        self.mode
    }
}

impl StoragePort for SimHost {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        self.store.read(namespace, key)
    }

    fn write(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.store.write(namespace, key, value)
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.delete(namespace, key)
    }
}

impl TimerPort for SimHost {
    fn schedule_at(&mut self, at: NaiveDateTime, trigger: Trigger) -> TimerHandle {
        self.timers.schedule_at(at, trigger)
    }

    fn schedule_daily(&mut self, time: chrono::NaiveTime, trigger: Trigger) -> TimerHandle {
        self.timers.schedule_daily(time, trigger)
    }

    fn schedule_every_minute(&mut self, trigger: Trigger) -> TimerHandle {
        self.timers.schedule_every_minute(trigger)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}

impl EventSink for SimHost {
    fn emit(&mut self, event: &FiltrationEvent) {
        self.sink.emit(event);
        self.events.push(event.clone());
    }
}
