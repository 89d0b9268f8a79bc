//! Unified error type for the filtration engine.
//!
//! Handlers never hand these to the host scheduler: window-start handlers
//! log and abort, and the monitor loop catches everything at its top level.
//! The type exists so the internal read-modify-write steps can use `?`.

use core::fmt;

use crate::app::ports::{ConfigError, RelayError, StorageError};
use crate::planner::PlanError;

/// Every fallible engine step funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A window could not be planned.
    Plan(PlanError),
    /// The relay rejected a command.
    Relay(RelayError),
    /// The attribute store rejected a read or write.
    Storage(StorageError),
    /// Configuration could not be loaded or was rejected.
    Config(ConfigError),
    /// A persisted value could not be parsed.
    Corrupt { key: &'static str, value: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan(e) => write!(f, "plan: {e}"),
            Self::Relay(e) => write!(f, "relay: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Corrupt { key, value } => write!(f, "corrupt persisted {key}: {value:?}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<PlanError> for Error {
    fn from(e: PlanError) -> Self {
        Self::Plan(e)
    }
}

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
