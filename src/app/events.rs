//! Outbound filtration events.
//!
//! The engine emits these through the [`EventSink`](super::ports::EventSink)
//! port.  Every event has a wire type (`SLOT1_START`, `BOOST_END`, …) and a
//! JSON payload; [`FiltrationEvent::envelope`] wraps both for the
//! `IOPOOL_EVENT` bus.

use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::engine::run_state::format_timestamp;
use crate::engine::{BoostOption, WindowKind};

/// Name of the bus every envelope is published on.
pub const EVENT_BUS: &str = "IOPOOL_EVENT";

/// Start/end/duration triple shared by start and boost events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i64,
}

impl Span {
    /// Span between two instants; duration truncated to whole minutes.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Figures published when a scheduled window ends.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEndReport {
    pub span: Span,
    /// The boost running when the window ended, if any.
    pub boost_in_progress: Option<BoostOption>,
    pub remaining_boost_minutes: i64,
    pub day_objective_minutes: Option<u32>,
    pub day_elapsed_minutes: f64,
    pub day_elapsed_percent: Option<u32>,
}

/// Structured events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum FiltrationEvent {
    WindowStarted { kind: WindowKind, span: Span },
    WindowEnded { kind: WindowKind, report: WindowEndReport },
    BoostStarted(Span),
    BoostEnded(Span),
    /// Carries the actual elapsed run, not the planned one.
    BoostCanceled(Span),
}

impl FiltrationEvent {
    pub fn event_type(&self) -> String {
        match self {
            Self::WindowStarted { kind, .. } => format!("{}_START", kind.event_prefix()),
            Self::WindowEnded { kind, .. } => format!("{}_END", kind.event_prefix()),
            Self::BoostStarted(_) => "BOOST_START".into(),
            Self::BoostEnded(_) => "BOOST_END".into(),
            Self::BoostCanceled(_) => "BOOST_CANCELED".into(),
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::WindowStarted { span, .. }
            | Self::BoostStarted(span)
            | Self::BoostEnded(span)
            | Self::BoostCanceled(span) => span_json(span),
            Self::WindowEnded { report, .. } => {
                let mut data = span_json(&report.span);
                if let Value::Object(map) = &mut data {
                    map.insert(
                        "boost_in_progress".into(),
                        json!(report.boost_in_progress.unwrap_or(BoostOption::None).label()),
                    );
                    map.insert(
                        "remaining_boost_duration_minutes".into(),
                        json!(report.remaining_boost_minutes),
                    );
                    map.insert(
                        "day_filtration_objective_minutes".into(),
                        json!(report.day_objective_minutes),
                    );
                    map.insert(
                        "day_filtration_elapsed_minutes".into(),
                        json!(report.day_elapsed_minutes),
                    );
                    map.insert(
                        "day_filtration_elapsed_percent".into(),
                        json!(report.day_elapsed_percent),
                    );
                }
                data
            }
        }
    }

    /// `{type, pool_id, pool_title, data}` as published on [`EVENT_BUS`].
    pub fn envelope(&self, pool_id: &str, pool_title: &str) -> Value {
        json!({
            "type": self.event_type(),
            "pool_id": pool_id,
            "pool_title": pool_title,
            "data": self.payload(),
        })
    }
}

fn span_json(span: &Span) -> Value {
    json!({
        "start_time": format_timestamp(span.start),
        "end_time": format_timestamp(span.end),
        "duration_minutes": span.duration_minutes,
    })
}
