//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `gpio_relay`   | RelayPort          | embedded-hal output pin       |
//! | `log_sink`     | EventSink          | Log output (bus envelopes)    |
//! | `memory_store` | ConfigPort         | In-memory attribute store     |
//! |                | StoragePort        |                               |
//! | `on_time`      | (elapsed feed)     | Relay on-time since midnight  |
//! | `timer_queue`  | TimerPort          | Virtual clock                 |
//! | `sim`          | all of the above   | Simulation / host tests       |

pub mod gpio_relay;
pub mod log_sink;
pub mod memory_store;
pub mod on_time;
pub mod sim;
pub mod timer_queue;
