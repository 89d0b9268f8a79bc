//! Actuator drivers.
//!
//! The engine drives exactly one actuator: the filtration pump relay.

pub mod pump;
