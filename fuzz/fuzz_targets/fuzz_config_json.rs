//! Fuzz target: options JSON → validation → day plan
//!
//! Deserialises arbitrary bytes as a configuration and plans a day with an
//! arbitrary recommendation, verifying:
//! - No panics in parsing, validation, or planning
//! - A config that passes validation never plans slots summing above the
//!   clamped total by more than the rounding slack
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;

use iopool_filtration::config::{FiltrationConfig, validate_config};
use iopool_filtration::planner;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (rec, json) = data.split_at(4);
    let recommended = f64::from(u32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]]) % 2000);

    let Ok(config) = serde_json::from_slice::<FiltrationConfig>(json) else {
        return;
    };
    let config = config.normalized();
    let Some(now) = NaiveDate::from_ymd_opt(2025, 7, 14).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return;
    };

    let plan = planner::plan(&config, Some(recommended), now);
    if config.summer.enabled && validate_config(&config).is_ok() {
        if let Some(total) = plan.summer_total_minutes {
            let slots = plan.slot1.map_or(0, |w| w.duration_minutes)
                + plan.slot2.map_or(0, |w| w.duration_minutes);
            assert!(slots <= total + 1);
        }
    }
});
