//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the mock host.  Everything runs on a virtual clock.

mod boost_tests;
mod schedule_tests;
