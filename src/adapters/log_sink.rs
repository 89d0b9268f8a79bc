//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every filtration event to the log as
//! its bus envelope.  A real integration would fire the same envelope on
//! the `IOPOOL_EVENT` bus.

use log::info;

use crate::app::events::{EVENT_BUS, FiltrationEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`FiltrationEvent`].
#[derive(Debug, Clone)]
pub struct LogEventSink {
    pool_id: String,
    pool_title: String,
    emitted: u32,
}

impl LogEventSink {
    pub fn new(pool_id: impl Into<String>, pool_title: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            pool_title: pool_title.into(),
            emitted: 0,
        }
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &FiltrationEvent) {
        self.emitted = self.emitted.saturating_add(1);
        let envelope = event.envelope(&self.pool_id, &self.pool_title);
        info!("{} | {} | {}", EVENT_BUS, event.event_type(), envelope["data"]);
    }
}
