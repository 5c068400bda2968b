//! Contract tests for the event envelope and vocabulary.
//!
//! Every payload shape published on `report-events` is pinned here: field
//! names, status spellings, and the parse(serialize(E)) == E law that the
//! consumers rely on.

use chrono::Utc;
use uuid::Uuid;

use lapor_core::events::{
    EventEnvelope, EventType, ReportCreatedPayload, ReportEscalatedPayload,
    ReportStatusUpdatedPayload, ReportUpvotedPayload, ESCALATION_REASON_SLA,
};
use lapor_core::routing::agency_for_category;
use lapor_core::types::{Report, ReportStatus, Visibility};

fn sample_report() -> Report {
    Report {
        id: Uuid::new_v4(),
        reporter_user_id: "citizen1".into(),
        visibility: Visibility::Public,
        content: "Jalan rusak".into(),
        category: "infrastruktur".into(),
        created_at: Utc::now(),
    }
}

// ============================================
// Round-trip law
// ============================================

#[test]
fn every_constructor_round_trips_through_json() {
    let report = sample_report();
    let envelopes = [
        EventEnvelope::report_created(&report),
        EventEnvelope::report_status_updated(
            report.id,
            ReportStatus::Received,
            ReportStatus::InProgress,
            "AGENCY_INFRA",
            Utc::now(),
        ),
        EventEnvelope::report_upvoted(report.id, "citizen2"),
        EventEnvelope::report_escalated(report.id, 1),
    ];

    for envelope in envelopes {
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: EventEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }
}

#[test]
fn distinct_events_get_distinct_ids() {
    let report = sample_report();
    let first = EventEnvelope::report_upvoted(report.id, "citizen2");
    let second = EventEnvelope::report_upvoted(report.id, "citizen2");
    assert_ne!(first.event_id, second.event_id);
    assert_eq!(first.report_id, second.report_id);
}

// ============================================
// Wire field names (consumed cross-language)
// ============================================

#[test]
fn created_payload_carries_the_report_attributes() {
    let report = sample_report();
    let envelope = EventEnvelope::report_created(&report);
    assert_eq!(envelope.event_type, EventType::ReportCreated);
    assert_eq!(envelope.report_id, report.id);

    let payload: ReportCreatedPayload = envelope.payload_as().unwrap();
    assert_eq!(payload.reporter_user_id, "citizen1");
    assert_eq!(payload.visibility, Visibility::Public);
    assert_eq!(payload.content, "Jalan rusak");
    assert_eq!(payload.category, "infrastruktur");
}

#[test]
fn status_updated_payload_names_old_new_and_agency() {
    let id = Uuid::new_v4();
    let envelope = EventEnvelope::report_status_updated(
        id,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        "AGENCY_HEALTH",
        Utc::now(),
    );
    let payload: ReportStatusUpdatedPayload = envelope.payload_as().unwrap();
    assert_eq!(payload.old_status, ReportStatus::InProgress);
    assert_eq!(payload.new_status, ReportStatus::Resolved);
    assert_eq!(payload.owner_agency, "AGENCY_HEALTH");

    assert_eq!(envelope.payload["old_status"], "IN_PROGRESS");
    assert_eq!(envelope.payload["new_status"], "RESOLVED");
    assert_eq!(envelope.payload["owner_agency"], "AGENCY_HEALTH");
}

#[test]
fn upvoted_payload_names_the_voter() {
    let id = Uuid::new_v4();
    let envelope = EventEnvelope::report_upvoted(id, "citizen9");
    let payload: ReportUpvotedPayload = envelope.payload_as().unwrap();
    assert_eq!(payload.voter_user_id, "citizen9");
    assert_eq!(envelope.payload["voter_user_id"], "citizen9");
}

#[test]
fn escalated_payload_carries_reason_and_level() {
    let envelope = EventEnvelope::report_escalated(Uuid::new_v4(), 3);
    let payload: ReportEscalatedPayload = envelope.payload_as().unwrap();
    assert_eq!(payload.reason, ESCALATION_REASON_SLA);
    assert_eq!(payload.escalation_level, 3);
}

// ============================================
// Routing table (Scenario F)
// ============================================

#[test]
fn every_category_routes_and_unknown_falls_back() {
    assert_eq!(agency_for_category("infrastruktur"), "AGENCY_INFRA");
    assert_eq!(agency_for_category("kesehatan"), "AGENCY_HEALTH");
    assert_eq!(agency_for_category("kriminalitas"), "AGENCY_SAFETY");
    assert_eq!(agency_for_category("zzz"), "AGENCY_INFRA");
}
