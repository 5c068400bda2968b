//! Shared domain model for the lapor citizen-reporting platform.
//!
//! Everything the services agree on lives here: report/case/SLA statuses,
//! the event vocabulary and envelope, the category → agency routing table,
//! the error taxonomy, identity, and environment configuration helpers.
//! Service-local table rows stay in their owning service crates.

pub mod config;
pub mod error;
pub mod events;
pub mod principal;
pub mod routing;
pub mod types;

pub use error::DomainError;
pub use events::{EventEnvelope, EventType};
pub use principal::{Principal, Role};
pub use types::{ReportStatus, SlaStatus, Visibility};
