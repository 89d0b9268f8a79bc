//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the [`EngineContext`] and dispatches timer callbacks
//! and operator commands to the engine handlers.  All I/O flows through
//! port traits injected at call sites, making the entire service testable
//! with mock adapters.
//!
//! ```text
//!  SignalPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  TimerPort  ◀──▶│        AppService        │
//!  RelayPort  ◀── │ windows · monitor · boost│ ◀─▶ StoragePort
//!                 └──────────────────────────┘
//! ```

use chrono::{NaiveDateTime, NaiveTime};
use log::{error, info, warn};
use serde::Serialize;

use crate::config::{FiltrationConfig, validate_config};
use crate::engine::{
    self, BoostOption, BoostState, EngineContext, MonitorOutcome, RunState, ScheduledWindow,
    WindowKind,
};
use crate::error::{Error, Result};
use crate::planner;
use crate::scheduler::{PoolMode, Trigger};

use super::commands::AppCommand;
use super::ports::{ConfigPort, FiltrationHost};

// ───────────────────────────────────────────────────────────────
// Outcomes and status
// ───────────────────────────────────────────────────────────────

/// What a timer callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    WindowStarted(ScheduledWindow),
    /// Planning or the relay failed; nothing changed.
    WindowSkipped(WindowKind),
    Monitor(MonitorOutcome),
    BoostExpired(Option<BoostState>),
}

/// Point-in-time view of the schedule, for display and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiltrationStatus {
    pub mode: Option<String>,
    pub filtration_enabled: bool,
    pub summer_total_minutes: Option<u32>,
    pub slot1_start_time: Option<NaiveTime>,
    pub slot2_start_time: Option<NaiveTime>,
    pub winter_start_time: Option<NaiveTime>,
    pub winter_end_time: Option<NaiveTime>,
    pub active_slot: Option<&'static str>,
    pub next_stop_time: Option<NaiveDateTime>,
    pub slot1_end_time: Option<NaiveDateTime>,
    pub slot2_end_time: Option<NaiveDateTime>,
    pub boost: String,
    pub boost_end_time: Option<NaiveDateTime>,
    pub pump_on: bool,
    pub armed_triggers: usize,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    ctx: EngineContext,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Arms nothing — call [`start`](Self::start) next.
    pub fn new(config: FiltrationConfig) -> Self {
        Self {
            ctx: EngineContext::new(config.normalized()),
        }
    }

    /// Construct from the persisted configuration.  A missing config starts
    /// with automation disabled.
    pub fn from_store(store: &impl ConfigPort) -> Result<Self> {
        match store.load() {
            Ok(config) => Ok(Self::new(config)),
            Err(super::ports::ConfigError::NotFound) => {
                info!("AppService: no stored config, automation disabled");
                Ok(Self::new(FiltrationConfig::default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore persisted state and arm triggers for the current mode.
    pub fn start(&mut self, now: NaiveDateTime, host: &mut impl FiltrationHost) -> Result<()> {
        self.ctx.load_run_state(&*host)?;
        if let Some(w) = self.ctx.run_state.scheduled() {
            info!("AppService: resuming {} (stop at {})", w.kind, w.stop);
        }
        engine::boost::restore_boost(&mut self.ctx, now, host)?;
        let mode = host.pool_mode();
        self.ctx.rearm(mode, now, host);
        info!("AppService started (mode {:?})", mode);
        Ok(())
    }

    /// Cancel every armed timer.  Persisted state is kept for the next
    /// start.
    pub fn shutdown(&mut self, host: &mut impl FiltrationHost) {
        self.ctx.disarm(host);
        info!("AppService stopped");
    }

    // ── Timer dispatch ────────────────────────────────────────

    /// Handle a fired timer.  Never fails; errors are logged.
    pub fn on_trigger(
        &mut self,
        trigger: Trigger,
        now: NaiveDateTime,
        host: &mut impl FiltrationHost,
    ) -> TriggerOutcome {
        match (trigger, WindowKind::from_trigger(trigger)) {
            (_, Some(kind)) => match engine::windows::start_window(&mut self.ctx, kind, now, host) {
                Ok(window) => TriggerOutcome::WindowStarted(window),
                Err(Error::Plan(e)) => {
                    warn!("AppService: {} not started: {}", kind, e);
                    TriggerOutcome::WindowSkipped(kind)
                }
                Err(e) => {
                    error!("AppService: {} start failed: {}", kind, e);
                    TriggerOutcome::WindowSkipped(kind)
                }
            },
            (Trigger::BoostExpiry, None) => {
                match engine::boost::on_boost_expired(&mut self.ctx, host) {
                    Ok(state) => TriggerOutcome::BoostExpired(state),
                    Err(e) => {
                        error!("AppService: boost expiry failed: {}", e);
                        TriggerOutcome::BoostExpired(None)
                    }
                }
            }
            (_, None) => TriggerOutcome::Monitor(engine::monitor::check(&mut self.ctx, now, host)),
        }
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now: NaiveDateTime,
        host: &mut impl FiltrationHost,
    ) -> Result<()> {
        match cmd {
            AppCommand::SelectBoost(option) => {
                engine::boost::select(&mut self.ctx, option, now, host)?;
            }
            AppCommand::ModeChanged(mode) => {
                if self.ctx.mode != Some(mode) {
                    info!("AppService: mode {:?} -> {}", self.ctx.mode, mode);
                }
                self.ctx.rearm(Some(mode), now, host);
            }
            AppCommand::UpdateConfig(config) => {
                let config = config.normalized();
                validate_config(&config)?;
                self.ctx.set_config(config);
                let mode = self.ctx.mode;
                self.ctx.rearm(mode, now, host);
                info!("AppService: configuration updated");
            }
        }
        Ok(())
    }

    /// Persist the live configuration.
    pub fn save_config(&self, store: &impl ConfigPort) -> Result<()> {
        store.save(&self.ctx.config)?;
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, now: NaiveDateTime, host: &impl FiltrationHost) -> FiltrationStatus {
        let config = &self.ctx.config;
        let plan = planner::plan(config, host.recommended_minutes(), now);
        let winter_end_time = match (config.winter.start_time, config.winter.duration_minutes) {
            (Some(start), Some(minutes)) => Some(planner::end_time_of_day(start, minutes)),
            _ => None,
        };
        let rs = &self.ctx.run_state;
        FiltrationStatus {
            mode: self.ctx.mode.map(|m| m.label().to_owned()),
            filtration_enabled: config.filtration_enabled(),
            summer_total_minutes: plan.summer_total_minutes,
            slot1_start_time: config.summer.slot1.start_time,
            slot2_start_time: config.summer.slot2.start_time,
            winter_start_time: config.winter.start_time,
            winter_end_time,
            active_slot: rs.active.tag(),
            next_stop_time: rs.next_stop_time(),
            slot1_end_time: rs.slot1_end_time,
            slot2_end_time: rs.slot2_end_time,
            boost: self
                .ctx
                .boost
                .map_or(BoostOption::None, |b| b.option)
                .label()
                .to_owned(),
            boost_end_time: self.ctx.boost.map(|b| b.end),
            pump_on: self.ctx.pump.is_on(host),
            armed_triggers: self.ctx.triggers.len(),
        }
    }

    pub fn config(&self) -> &FiltrationConfig {
        &self.ctx.config
    }

    pub fn mode(&self) -> Option<PoolMode> {
        self.ctx.mode
    }

    pub fn run_state(&self) -> &RunState {
        &self.ctx.run_state
    }

    pub fn boost(&self) -> Option<&BoostState> {
        self.ctx.boost.as_ref()
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Relay commands issued since construction.
    pub fn pump_commands(&self) -> u32 {
        self.ctx.pump.commands_sent()
    }
}
