//! Event bus adapter over Redis Streams.
//!
//! One shared stream, named consumer groups, explicit acknowledgement.
//! Delivery is at-least-once: a consumer that dies between handler success
//! and XACK sees the entry again on its next read, so every handler in the
//! platform is written to be idempotent.

mod bus;

pub use bus::{envelope_entry_fields, BusError, EventBus, EventHandler};
