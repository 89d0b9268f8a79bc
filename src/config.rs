//! Filtration configuration.
//!
//! Immutable once loaded: a reconfiguration replaces the whole value and
//! re-arms every trigger.  Values come from the options flow of the host
//! integration and are persisted through a
//! [`ConfigPort`](crate::app::ports::ConfigPort).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// One summer slot: a start time and a share of the day's total duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default, with = "time_of_day")]
    pub start_time: Option<NaiveTime>,
    /// Share of the day's duration (0-100).  0 means the slot is absent.
    #[serde(default)]
    pub duration_percent: u8,
}

impl Slot {
    pub fn new(start_time: Option<NaiveTime>, duration_percent: u8) -> Self {
        Self {
            start_time,
            duration_percent,
        }
    }

    /// A slot with 0% never runs, whatever its start time.
    pub fn is_absent(&self) -> bool {
        self.duration_percent == 0
    }
}

/// Summer ("Standard" mode) filtration settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_duration_minutes: Option<u32>,
    #[serde(default)]
    pub max_duration_minutes: Option<u32>,
    #[serde(default)]
    pub slot1: Slot,
    #[serde(default)]
    pub slot2: Slot,
}

/// Winter ("Active-Winter" mode) filtration settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WinterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, with = "time_of_day")]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// Complete filtration configuration for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FiltrationConfig {
    /// Opaque handle of the pump relay (e.g. `switch.pool_pump`).
    #[serde(default)]
    pub switch_reference: Option<String>,
    #[serde(default)]
    pub summer: SummerConfig,
    #[serde(default)]
    pub winter: WinterConfig,
}

impl FiltrationConfig {
    /// The relay handle, if one is configured and non-empty.
    pub fn relay(&self) -> Option<&str> {
        self.switch_reference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Either season is switched on in the options.
    pub fn filtration_enabled(&self) -> bool {
        self.summer.enabled || self.winter.enabled
    }

    /// Summer automation can actually run: enabled and a relay is set.
    pub fn summer_active(&self) -> bool {
        self.summer.enabled && self.relay().is_some()
    }

    /// Winter automation can actually run: enabled and a relay is set.
    pub fn winter_active(&self) -> bool {
        self.winter.enabled && self.relay().is_some()
    }

    /// The options UI stores "no bound" as 0.
    pub fn normalized(mut self) -> Self {
        if self.summer.min_duration_minutes == Some(0) {
            self.summer.min_duration_minutes = None;
        }
        if self.summer.max_duration_minutes == Some(0) {
            self.summer.max_duration_minutes = None;
        }
        self
    }
}

/// Range and consistency checks applied before a configuration is persisted.
///
/// Rejects rather than clamps.  The engine itself never re-validates; it
/// degrades by not planning a window it cannot plan.
pub fn validate_config(cfg: &FiltrationConfig) -> Result<(), ConfigError> {
    let summer = &cfg.summer;
    if summer.enabled {
        if cfg.relay().is_none() {
            return Err(ConfigError::ValidationFailed("switch_entity_missing"));
        }
        if summer.slot1.start_time.is_none() {
            return Err(ConfigError::ValidationFailed("summer_slot1_start_missing"));
        }
        if summer.slot1.duration_percent > 100 || summer.slot2.duration_percent > 100 {
            return Err(ConfigError::ValidationFailed(
                "summer_slot_duration_percent_out_of_range",
            ));
        }
        if let (Some(min), Some(max)) = (summer.min_duration_minutes, summer.max_duration_minutes)
        {
            if min > max {
                return Err(ConfigError::ValidationFailed(
                    "min_duration_greater_than_max_duration",
                ));
            }
        }
        if summer.slot2.duration_percent > 0 && summer.slot2.start_time.is_none() {
            return Err(ConfigError::ValidationFailed("slot2_start_missing"));
        }
        if let (Some(s1), Some(s2)) = (summer.slot1.start_time, summer.slot2.start_time) {
            if s1 >= s2 {
                return Err(ConfigError::ValidationFailed(
                    "slot1_start_greater_than_equal_slot2_start",
                ));
            }
        }
        if u16::from(summer.slot1.duration_percent) + u16::from(summer.slot2.duration_percent)
            > 100
        {
            return Err(ConfigError::ValidationFailed(
                "slot1_and_slot2_duration_percent_greater_than_100",
            ));
        }
    }

    let winter = &cfg.winter;
    if winter.enabled {
        if cfg.relay().is_none() {
            return Err(ConfigError::ValidationFailed("switch_entity_missing"));
        }
        if winter.start_time.is_none() {
            return Err(ConfigError::ValidationFailed("winter_start_missing"));
        }
        if winter.duration_minutes.unwrap_or(0) == 0 {
            return Err(ConfigError::ValidationFailed("winter_duration_missing"));
        }
    }

    Ok(())
}

/// Parse a time of day in `HH:MM:SS` or `HH:MM` form.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Serde adapter for `Option<NaiveTime>` stored as `"HH:MM:SS"`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M:%S").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_time_of_day(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {s}"))),
        }
    }
}
