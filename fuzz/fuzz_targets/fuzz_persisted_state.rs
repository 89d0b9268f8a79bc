//! Fuzz target: run-state and boost restore from the attribute store
//!
//! Fills every persisted key with arbitrary strings and restores both
//! records, verifying:
//! - No panics under any stored value
//! - A restored scheduled window always has a stop time
//! - A restored boost is never the "None" option
//!
//! cargo fuzz run fuzz_persisted_state

#![no_main]

use libfuzzer_sys::fuzz_target;

use iopool_filtration::adapters::memory_store::MemoryStore;
use iopool_filtration::app::ports::StoragePort;
use iopool_filtration::engine::{BoostOption, BoostState, RunState};

const KEYS: [(&str, &str); 10] = [
    ("filtration", "active_slot"),
    ("filtration", "next_stop_time"),
    ("filtration", "window_start_time"),
    ("filtration", "planned_duration_minutes"),
    ("filtration", "filtration_duration_minutes"),
    ("filtration", "slot1_end_time"),
    ("filtration", "slot2_end_time"),
    ("boost", "option"),
    ("boost", "boost_start_time"),
    ("boost", "boost_end_time"),
];

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let mut store = MemoryStore::new();
    for ((ns, key), value) in KEYS.iter().zip(text.split('\u{1f}')) {
        let _ = store.write(ns, key, value);
    }

    if let Ok(rs) = RunState::load(&store) {
        if let Some(w) = rs.scheduled() {
            assert_eq!(rs.next_stop_time(), Some(w.stop));
        }
        let _ = rs.save(&mut store);
    }

    if let Ok(Some(boost)) = BoostState::load(&store) {
        assert_ne!(boost.option, BoostOption::None);
    }
});
