//! Core status and visibility types plus shared query helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Catch-all category assigned when a submitter omits one.
pub const DEFAULT_CATEGORY: &str = "lainnya";

/// Closed category set understood by the routing table. Unknown values are
/// accepted on input and fall back to the default agency when routed.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "infrastruktur",
    "kebersihan",
    "kesehatan",
    "keamanan",
    "kriminalitas",
    "lainnya",
];

/// Lifecycle status of a report's case. RESOLVED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Received,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
        }
    }

    /// Whether no further transitions are accepted out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for ReportStatus {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "RECEIVED" => Ok(Self::Received),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(DomainError::Validation(format!(
                "unknown report status: {other}"
            ))),
        }
    }
}

/// Submitter-chosen visibility of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Anonymous,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Anonymous => "ANONYMOUS",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Visibility {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PUBLIC" => Ok(Self::Public),
            "ANONYMOUS" => Ok(Self::Anonymous),
            other => Err(DomainError::Validation(format!(
                "unknown visibility: {other}"
            ))),
        }
    }
}

/// SLA job lifecycle. COMPLETED is terminal; PENDING escalates at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaStatus {
    Pending,
    Completed,
    Escalated,
}

impl SlaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Escalated => "ESCALATED",
        }
    }
}

impl std::fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SlaStatus {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "ESCALATED" => Ok(Self::Escalated),
            other => Err(DomainError::Validation(format!(
                "unknown SLA status: {other}"
            ))),
        }
    }
}

/// Authoritative report attributes. Created once by the citizen command
/// path; never mutated in core scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_user_id: String,
    pub visibility: Visibility,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Default page size for the paginated master list.
pub const DEFAULT_PER_PAGE: i64 = 20;
/// Upper clamp for the paginated master list.
pub const MAX_PER_PAGE: i64 = 100;

/// Page numbers below 1 fall back to 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    match page {
        Some(p) if p >= 1 => p,
        _ => 1,
    }
}

/// Per-page is clamped to [1, 100]; absent or below 1 falls back to 20.
pub fn clamp_per_page(per_page: Option<i64>) -> i64 {
    match per_page {
        Some(p) if p >= 1 => p.min(MAX_PER_PAGE),
        _ => DEFAULT_PER_PAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            ReportStatus::Received,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
        ] {
            assert_eq!(ReportStatus::try_from(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn resolved_is_the_only_terminal_status() {
        assert!(ReportStatus::Resolved.is_terminal());
        assert!(!ReportStatus::Received.is_terminal());
        assert!(!ReportStatus::InProgress.is_terminal());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ReportStatus::try_from("DONE").is_err());
    }

    #[test]
    fn visibility_parses_both_values_only() {
        assert_eq!(Visibility::try_from("PUBLIC").unwrap(), Visibility::Public);
        assert_eq!(
            Visibility::try_from("ANONYMOUS").unwrap(),
            Visibility::Anonymous
        );
        assert!(Visibility::try_from("PRIVATE").is_err());
    }

    #[test]
    fn page_below_one_falls_back_to_one() {
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(-3)), 1);
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(7)), 7);
    }

    #[test]
    fn per_page_clamps_into_range() {
        assert_eq!(clamp_per_page(Some(500)), 100);
        assert_eq!(clamp_per_page(Some(100)), 100);
        assert_eq!(clamp_per_page(Some(1)), 1);
        assert_eq!(clamp_per_page(Some(0)), 20);
        assert_eq!(clamp_per_page(None), 20);
    }
}
