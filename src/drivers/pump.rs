//! Filtration pump controller.
//!
//! Idempotent start/stop over a single on/off relay.  The relay state is
//! read before every command so the relay never receives a redundant one.
//!
//! ## Configuration-absent contract
//!
//! With filtration disabled in both seasons, or no relay configured, both
//! operations log a warning and return [`PumpOutcome::Skipped`].  This is an
//! expected state during setup, not an error.

use log::{debug, info, warn};

use crate::app::ports::{RelayError, RelayPort, RelayState};
use crate::config::FiltrationConfig;

/// What a start/stop request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// A command was sent to the relay.
    Commanded,
    /// The relay was already in the requested position.
    AlreadyInState,
    /// Automation is not configured.
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct PumpController {
    relay: Option<String>,
    enabled: bool,
    commands_sent: u32,
}

impl PumpController {
    pub fn new(config: &FiltrationConfig) -> Self {
        Self {
            relay: config.relay().map(str::to_owned),
            enabled: config.filtration_enabled(),
            commands_sent: 0,
        }
    }

    /// Pick up a new configuration.  The command counter survives.
    pub fn reconfigure(&mut self, config: &FiltrationConfig) {
        self.relay = config.relay().map(str::to_owned);
        self.enabled = config.filtration_enabled();
    }

    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    /// Relay commands issued since construction.
    pub fn commands_sent(&self) -> u32 {
        self.commands_sent
    }

    /// `true` only when the relay reports "on".
    pub fn is_on(&self, hw: &impl RelayPort) -> bool {
        self.relay
            .as_deref()
            .is_some_and(|relay| hw.relay_state(relay) == Some(RelayState::On))
    }

    pub fn start(&mut self, hw: &mut impl RelayPort) -> Result<PumpOutcome, RelayError> {
        self.drive(hw, RelayState::On)
    }

    pub fn stop(&mut self, hw: &mut impl RelayPort) -> Result<PumpOutcome, RelayError> {
        self.drive(hw, RelayState::Off)
    }

    fn drive(
        &mut self,
        hw: &mut impl RelayPort,
        target: RelayState,
    ) -> Result<PumpOutcome, RelayError> {
        let verb = match target {
            RelayState::On => "start",
            RelayState::Off => "stop",
        };
        if !self.enabled {
            warn!("Pump: filtration disabled in configuration, not attempting {}", verb);
            return Ok(PumpOutcome::Skipped);
        }
        let Some(relay) = self.relay.as_deref() else {
            warn!("Pump: no relay configured, cannot {} filtration", verb);
            return Ok(PumpOutcome::Skipped);
        };

        if hw.relay_state(relay) == Some(target) {
            debug!("Pump: {} already {:?}, nothing to do", relay, target);
            return Ok(PumpOutcome::AlreadyInState);
        }

        match target {
            RelayState::On => hw.turn_on(relay)?,
            RelayState::Off => hw.turn_off(relay)?,
        }
        self.commands_sent = self.commands_sent.saturating_add(1);
        info!("Pump: {} -> {:?}", relay, target);
        Ok(PumpOutcome::Commanded)
    }
}
