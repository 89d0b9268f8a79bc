//! Port traits — the hexagonal boundary between the scheduling engine and
//! the host integration.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! The host (a home-automation runtime, a simulation, a test) implements
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics at each call site, so the engine never looks anything
//! up by name.

use chrono::{NaiveDateTime, NaiveTime};

use crate::config::FiltrationConfig;
use crate::scheduler::{PoolMode, Trigger};

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → pump relay)
// ───────────────────────────────────────────────────────────────

/// Last known position of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    On,
    Off,
}

/// The single on/off relay driving the filtration pump.
///
/// Every call carries the configured handle so one adapter can serve
/// several relays.
pub trait RelayPort {
    /// Current relay position, or `None` if it is unknown/unavailable.
    fn relay_state(&self, relay: &str) -> Option<RelayState>;

    fn turn_on(&mut self, relay: &str) -> Result<(), RelayError>;

    fn turn_off(&mut self, relay: &str) -> Result<(), RelayError>;
}

// ───────────────────────────────────────────────────────────────
// Signal port (driven adapter: sensors/cloud → domain)
// ───────────────────────────────────────────────────────────────

/// Read-only signals owned by other parts of the integration.
pub trait SignalPort {
    /// Recommended total filtration minutes for today.
    fn recommended_minutes(&self) -> Option<f64>;

    /// Hours the relay has been on since local midnight.
    fn elapsed_hours_today(&self) -> Option<f64>;

    /// Operator-selected pool mode.
    fn pool_mode(&self) -> Option<PoolMode>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → event bus)
// ───────────────────────────────────────────────────────────────

/// Forwards every [`FiltrationEvent`](super::events::FiltrationEvent);
/// no filtering.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::FiltrationEvent);
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain ↔ host scheduler)
// ───────────────────────────────────────────────────────────────

/// Opaque cancellation handle returned by [`TimerPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u32);

/// Scheduling primitive offered by the host event loop.
///
/// When a timer fires, the host calls
/// [`AppService::on_trigger`](super::service::AppService::on_trigger) with
/// the trigger it was armed with.  Callbacks never overlap.
pub trait TimerPort {
    /// Fire once at `at`.
    fn schedule_at(&mut self, at: NaiveDateTime, trigger: Trigger) -> TimerHandle;

    /// Fire every day at `time`.
    fn schedule_daily(&mut self, time: NaiveTime, trigger: Trigger) -> TimerHandle;

    /// Fire every time seconds-of-minute crosses zero.
    fn schedule_every_minute(&mut self, trigger: Trigger) -> TimerHandle;

    /// Cancel a timer.  Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the filtration configuration.
///
/// Implementations MUST run
/// [`validate_config`](crate::config::validate_config) before persisting
/// and reject invalid values with [`ConfigError::ValidationFailed`] rather
/// than clamping them.
pub trait ConfigPort {
    fn load(&self) -> Result<FiltrationConfig, ConfigError>;

    fn save(&self, config: &FiltrationConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ attribute store)
// ───────────────────────────────────────────────────────────────

/// Persisted attribute store: plain string scalars, last write wins.
///
/// Keys are namespaced per subsystem (`filtration`, `boost`).
pub trait StoragePort {
    /// Read a value.  `Ok(None)` if the key is not set.
    fn read(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool {
        matches!(self.read(namespace, key), Ok(Some(_)))
    }
}

/// Everything the engine needs from its host, in one bound.
///
/// Passing a single `&mut impl FiltrationHost` avoids juggling several
/// mutable borrows at each call site.
pub trait FiltrationHost: RelayPort + SignalPort + StoragePort + TimerPort + EventSink {}

impl<T> FiltrationHost for T where T: RelayPort + SignalPort + StoragePort + TimerPort + EventSink {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first run).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed validation.  Carries the options-flow error key.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The store rejected the write.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`RelayPort`] commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// The handle does not name a known relay.
    UnknownRelay,
    /// The relay did not acknowledge the command.
    CommandFailed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for RelayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownRelay => write!(f, "unknown relay"),
            Self::CommandFailed => write!(f, "relay command failed"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
impl std::error::Error for RelayError {}
