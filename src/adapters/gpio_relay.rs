//! GPIO relay adapter.
//!
//! Implements [`RelayPort`] over any `embedded-hal` output pin.  The pin
//! level is cached after every command; until the first command the relay
//! state reads as unknown.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{RelayError, RelayPort, RelayState};

pub struct GpioRelay<P> {
    name: String,
    pin: P,
    active_low: bool,
    state: Option<RelayState>,
}

impl<P: OutputPin> GpioRelay<P> {
    /// `name` is the handle the configuration refers to the relay by.
    pub fn new(name: impl Into<String>, pin: P) -> Self {
        Self {
            name: name.into(),
            pin,
            active_low: false,
            state: None,
        }
    }

    /// Relay boards that energise the coil on a low level.
    pub fn active_low(mut self) -> Self {
        self.active_low = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    fn check(&self, relay: &str) -> Result<(), RelayError> {
        if relay == self.name {
            Ok(())
        } else {
            warn!("GpioRelay: unknown relay {:?} (have {:?})", relay, self.name);
            Err(RelayError::UnknownRelay)
        }
    }

    fn drive(&mut self, relay: &str, target: RelayState) -> Result<(), RelayError> {
        self.check(relay)?;
        let high = (target == RelayState::On) != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| RelayError::CommandFailed)?;
        self.state = Some(target);
        Ok(())
    }
}

impl<P: OutputPin> RelayPort for GpioRelay<P> {
    fn relay_state(&self, relay: &str) -> Option<RelayState> {
        if relay == self.name { self.state } else { None }
    }

    fn turn_on(&mut self, relay: &str) -> Result<(), RelayError> {
        self.drive(relay, RelayState::On)
    }

    fn turn_off(&mut self, relay: &str) -> Result<(), RelayError> {
        self.drive(relay, RelayState::Off)
    }
}
