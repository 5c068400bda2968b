//! Citizen service.
//!
//! Command path: persist a report to the authoritative write store, seed
//! the submitter's read views inline, publish `report.created`. Query
//! path: serve the submitter feed, the public feed, and the master read
//! model from the local read store. A background consumer under the
//! `reporting-service` group keeps the feeds converged on status changes
//! and upvotes from other instances.

pub mod config;
pub mod consumer;
pub mod handlers;
pub mod schema;
pub mod service;
pub mod store;

pub use service::CitizenService;
