//! Event vocabulary and wire envelope.
//!
//! Every domain event travels on the shared `report-events` stream inside
//! an [`EventEnvelope`]. The envelope's structural fields (id, type,
//! aggregate id, timestamp) are duplicated as flat stream-entry fields for
//! cheap filtering; the payload stays an opaque JSON object so the bus
//! never needs to understand event bodies.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::types::{Report, ReportStatus, Visibility};

/// The single stream all services publish to and consume from.
pub const REPORT_STREAM: &str = "report-events";

/// Consumer group of the case router (officer service).
pub const GROUP_OPERATIONS: &str = "operations-service";
/// Consumer group of the workflow consumer.
pub const GROUP_WORKFLOW: &str = "workflow-service";
/// Consumer group of the citizen feed refresher.
pub const GROUP_REPORTING: &str = "reporting-service";
/// Consumer group of the projection fan-out worker.
pub const GROUP_PROJECTION: &str = "projection-service";

/// Domain event types. Unknown strings are preserved so consumers can skip
/// foreign events without failing the delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    ReportCreated,
    ReportStatusUpdated,
    ReportUpvoted,
    ReportEscalated,
    ReportDeleted,
    Unknown(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ReportCreated => "report.created",
            Self::ReportStatusUpdated => "report.status.updated",
            Self::ReportUpvoted => "report.upvoted",
            Self::ReportEscalated => "report.escalated",
            Self::ReportDeleted => "report.deleted",
            Self::Unknown(s) => s,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "report.created" => Self::ReportCreated,
            "report.status.updated" => Self::ReportStatusUpdated,
            "report.upvoted" => Self::ReportUpvoted,
            "report.escalated" => Self::ReportEscalated,
            "report.deleted" => Self::ReportDeleted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Wire envelope for every published event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub report_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build an envelope with a fresh event id and a now-timestamp.
    pub fn new(
        event_type: EventType,
        report_id: Uuid,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            report_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn report_created(report: &Report) -> Self {
        let payload = ReportCreatedPayload {
            report_id: report.id,
            reporter_user_id: report.reporter_user_id.clone(),
            visibility: report.visibility,
            content: report.content.clone(),
            category: report.category.clone(),
            created_at: report.created_at,
        };
        // Serializing a plain struct of serde-friendly fields cannot fail.
        Self::new(
            EventType::ReportCreated,
            report.id,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    pub fn report_status_updated(
        report_id: Uuid,
        old_status: ReportStatus,
        new_status: ReportStatus,
        owner_agency: &str,
        changed_at: DateTime<Utc>,
    ) -> Self {
        let payload = ReportStatusUpdatedPayload {
            report_id,
            old_status,
            new_status,
            owner_agency: owner_agency.to_string(),
            changed_at,
        };
        Self::new(
            EventType::ReportStatusUpdated,
            report_id,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    pub fn report_upvoted(report_id: Uuid, voter_user_id: &str) -> Self {
        let payload = ReportUpvotedPayload {
            report_id,
            voter_user_id: voter_user_id.to_string(),
            created_at: Utc::now(),
        };
        Self::new(
            EventType::ReportUpvoted,
            report_id,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    pub fn report_escalated(report_id: Uuid, escalation_level: i32) -> Self {
        let payload = ReportEscalatedPayload {
            report_id,
            reason: ESCALATION_REASON_SLA.to_string(),
            escalation_level,
        };
        Self::new(
            EventType::ReportEscalated,
            report_id,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Decode the opaque payload into a typed event body.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Reason string carried by SLA breach escalations.
pub const ESCALATION_REASON_SLA: &str = "SLA_BREACH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCreatedPayload {
    pub report_id: Uuid,
    pub reporter_user_id: String,
    pub visibility: Visibility,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusUpdatedPayload {
    pub report_id: Uuid,
    pub old_status: ReportStatus,
    pub new_status: ReportStatus,
    pub owner_agency: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportUpvotedPayload {
    pub report_id: Uuid,
    pub voter_user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEscalatedPayload {
    pub report_id: Uuid,
    pub reason: String,
    pub escalation_level: i32,
}

/// Payload of `report.deleted`, recognized by the projector for operator
/// tooling. No core endpoint emits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDeletedPayload {
    pub report_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_every_known_value() {
        for t in [
            EventType::ReportCreated,
            EventType::ReportStatusUpdated,
            EventType::ReportUpvoted,
            EventType::ReportEscalated,
            EventType::ReportDeleted,
        ] {
            assert_eq!(EventType::from(t.as_str()), t);
        }
    }

    #[test]
    fn unknown_event_type_is_preserved_not_rejected() {
        let t = EventType::from("report.archived");
        assert_eq!(t, EventType::Unknown("report.archived".to_string()));
        assert_eq!(t.as_str(), "report.archived");
    }

    #[test]
    fn envelope_serde_round_trip() {
        let report = Report {
            id: Uuid::new_v4(),
            reporter_user_id: "citizen1".into(),
            visibility: Visibility::Public,
            content: "Jalan rusak".into(),
            category: "infrastruktur".into(),
            created_at: Utc::now(),
        };
        let envelope = EventEnvelope::report_created(&report);
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: EventEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);

        let payload: ReportCreatedPayload = parsed.payload_as().unwrap();
        assert_eq!(payload.report_id, report.id);
        assert_eq!(payload.category, "infrastruktur");
    }

    #[test]
    fn status_updated_payload_uses_screaming_snake_statuses() {
        let envelope = EventEnvelope::report_status_updated(
            Uuid::new_v4(),
            ReportStatus::Received,
            ReportStatus::InProgress,
            "AGENCY_INFRA",
            Utc::now(),
        );
        assert_eq!(envelope.payload["old_status"], "RECEIVED");
        assert_eq!(envelope.payload["new_status"], "IN_PROGRESS");
    }

    #[test]
    fn escalation_payload_carries_breach_reason() {
        let envelope = EventEnvelope::report_escalated(Uuid::new_v4(), 1);
        assert_eq!(envelope.payload["reason"], ESCALATION_REASON_SLA);
        assert_eq!(envelope.payload["escalation_level"], 1);
    }
}
