//! Engine context — everything the handlers share, in one owned value.

use chrono::NaiveDateTime;

use crate::app::ports::{StoragePort, TimerPort};
use crate::config::FiltrationConfig;
use crate::drivers::pump::PumpController;
use crate::error::Result;
use crate::scheduler::{self, ActiveTriggerSet, ArmContext, PoolMode};

use super::{BoostState, RunState};

#[derive(Debug)]
pub struct EngineContext {
    pub config: FiltrationConfig,
    /// Mode the triggers were last armed for.
    pub mode: Option<PoolMode>,
    pub run_state: RunState,
    pub boost: Option<BoostState>,
    pub triggers: ActiveTriggerSet,
    pub pump: PumpController,
}

impl EngineContext {
    pub fn new(config: FiltrationConfig) -> Self {
        let pump = PumpController::new(&config);
        Self {
            config,
            mode: None,
            run_state: RunState::default(),
            boost: None,
            triggers: ActiveTriggerSet::new(),
            pump,
        }
    }

    pub fn boost_active(&self) -> bool {
        self.boost.is_some()
    }

    /// Replace the configuration.  Triggers are not touched; re-arm after.
    pub fn set_config(&mut self, config: FiltrationConfig) {
        self.pump.reconfigure(&config);
        self.config = config;
    }

    /// Reload run state from the store.
    pub fn load_run_state(&mut self, store: &impl StoragePort) -> Result<()> {
        self.run_state = RunState::load(store)?;
        Ok(())
    }

    /// Cancel every armed timer and arm the set for `mode`.
    pub fn rearm(&mut self, mode: Option<PoolMode>, now: NaiveDateTime, timer: &mut impl TimerPort) {
        self.mode = mode;
        let arm = ArmContext {
            config: &self.config,
            mode,
            boost_end: self.boost.map(|b| b.end),
            window_in_progress: self.run_state.scheduled().is_some(),
        };
        scheduler::rearm(&mut self.triggers, arm, now, timer);
    }

    /// Cancel every armed timer, boost expiry included.
    pub fn disarm(&mut self, timer: &mut impl TimerPort) {
        self.triggers.cancel_all(timer);
    }
}
