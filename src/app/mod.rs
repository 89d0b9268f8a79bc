//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the orchestration for the filtration engine: timer
//! dispatch, operator commands, and outbound events.  All interaction with
//! the host happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without a real home-automation runtime.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
