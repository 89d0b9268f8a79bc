//! iopool filtration engine.
//!
//! Schedules a pool's filtration pump from a seasonal configuration and
//! live signals: two percentage slots in summer, a fixed window in active
//! winter, and a user-triggered boost override.  The host integration
//! implements the port traits in [`app::ports`] and drives
//! [`app::service::AppService`] from its timers.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod planner;
pub mod scheduler;

pub use error::{Error, Result};
