//! Inbound commands to the application service.
//!
//! These represent operator actions (boost selector, mode selector, options
//! flow) that the [`AppService`](super::service::AppService) interprets and
//! acts upon.

use crate::config::FiltrationConfig;
use crate::engine::BoostOption;
use crate::scheduler::PoolMode;

/// Commands that the host integration can send into the engine.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Boost selector changed.  `BoostOption::None` cancels a running boost.
    SelectBoost(BoostOption),

    /// Operator or upstream pool changed the seasonal mode.  Re-arms every
    /// trigger.
    ModeChanged(PoolMode),

    /// Options flow saved a new configuration.  Validated, then re-arms
    /// every trigger.
    UpdateConfig(FiltrationConfig),
}
