//! Diagnostics snapshot.
//!
//! A JSON dump of the live configuration, run state, boost and armed
//! trigger count, for support requests.  The relay handle is redacted.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::app::ports::FiltrationHost;
use crate::app::service::{AppService, FiltrationStatus};
use crate::config::FiltrationConfig;

pub const REDACTED: &str = "**REDACTED**";

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub config: FiltrationConfig,
    pub status: FiltrationStatus,
    pub pump_commands: u32,
}

impl Diagnostics {
    pub fn collect(app: &AppService, now: NaiveDateTime, host: &impl FiltrationHost) -> Self {
        let mut config = app.config().clone();
        if config.switch_reference.is_some() {
            config.switch_reference = Some(REDACTED.to_owned());
        }
        Self {
            config,
            status: app.status(now, host),
            pump_commands: app.pump_commands(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
