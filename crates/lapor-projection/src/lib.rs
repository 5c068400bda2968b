//! Projection fan-out worker.
//!
//! Consumes the shared stream under the `projection-service` group and
//! applies every event to N read replicas in parallel. Each replica apply
//! runs in its own transaction gated by the processed-events ledger, so a
//! redelivered event is a no-op and a failed replica retries without
//! blocking the others.

pub mod apply;
pub mod config;
pub mod schema;
pub mod worker;

pub use apply::{apply_event, Applied};
pub use worker::{FanoutHandler, Replica};
