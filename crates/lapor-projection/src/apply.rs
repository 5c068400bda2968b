//! Per-replica apply pipeline.
//!
//! One transaction per (event, replica): ledger check, dispatch by event
//! type, ledger insert, commit. A rollback leaves no ledger row, so the
//! event can be retried against that replica later.

use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use lapor_core::events::{
    EventEnvelope, EventType, ReportCreatedPayload, ReportDeletedPayload,
    ReportStatusUpdatedPayload, ReportUpvotedPayload,
};
use lapor_core::types::{ReportStatus, Visibility};
use lapor_core::DomainError;

/// Outcome of one per-replica apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Tables were updated and the ledger row written.
    Applied,
    /// Event id already present in this replica's ledger.
    Duplicate,
    /// Event type has no table effect here; ledger row still written.
    Skipped,
}

/// Decide what the pipeline does for an event type, independent of any
/// database state.
pub fn dispatch_kind(event_type: &EventType) -> Applied {
    match event_type {
        EventType::ReportCreated
        | EventType::ReportStatusUpdated
        | EventType::ReportUpvoted
        | EventType::ReportDeleted => Applied::Applied,
        EventType::ReportEscalated | EventType::Unknown(_) => Applied::Skipped,
    }
}

/// Typed pipeline action, decoded before the transaction opens so a
/// malformed payload can never poison the redelivery loop.
enum Action {
    Created(ReportCreatedPayload),
    StatusUpdated(ReportStatusUpdatedPayload),
    Upvoted(ReportUpvotedPayload),
    Deleted(ReportDeletedPayload),
    NoEffect,
}

fn perr(e: sqlx::Error) -> DomainError {
    DomainError::Projection(e.to_string())
}

fn decode_action(envelope: &EventEnvelope) -> Result<Action, serde_json::Error> {
    Ok(match &envelope.event_type {
        EventType::ReportCreated => Action::Created(envelope.payload_as()?),
        EventType::ReportStatusUpdated => Action::StatusUpdated(envelope.payload_as()?),
        EventType::ReportUpvoted => Action::Upvoted(envelope.payload_as()?),
        EventType::ReportDeleted => Action::Deleted(envelope.payload_as()?),
        EventType::ReportEscalated | EventType::Unknown(_) => Action::NoEffect,
    })
}

/// Apply one event to one replica, idempotently.
pub async fn apply_event(pool: &PgPool, envelope: &EventEnvelope) -> Result<Applied, DomainError> {
    let action = match decode_action(envelope) {
        Ok(action) => action,
        Err(e) => {
            warn!(event_id = %envelope.event_id, error = %e, "undecodable payload, skipping");
            return Ok(Applied::Skipped);
        }
    };

    let mut tx = pool.begin().await.map_err(perr)?;

    let seen = sqlx::query("SELECT 1 FROM processed_events WHERE event_id = $1")
        .bind(envelope.event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(perr)?;
    if seen.is_some() {
        debug!(event_id = %envelope.event_id, "event already applied, skipping");
        return Ok(Applied::Duplicate);
    }

    let outcome = match &action {
        Action::Created(payload) => {
            apply_created(&mut *tx, payload).await?;
            Applied::Applied
        }
        Action::StatusUpdated(payload) => {
            apply_status_updated(&mut *tx, payload).await?;
            Applied::Applied
        }
        Action::Upvoted(payload) => {
            apply_upvoted(&mut *tx, payload).await?;
            Applied::Applied
        }
        Action::Deleted(payload) => {
            apply_deleted(&mut *tx, payload).await?;
            Applied::Applied
        }
        Action::NoEffect => Applied::Skipped,
    };

    sqlx::query(
        "INSERT INTO processed_events (event_id, event_type, processed_at) VALUES ($1, $2, now())",
    )
    .bind(envelope.event_id)
    .bind(envelope.event_type.as_str())
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    tx.commit().await.map_err(perr)?;
    Ok(outcome)
}

async fn apply_created(
    tx: &mut PgConnection,
    payload: &ReportCreatedPayload,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO reports_read_model
            (id, reporter_user_id, visibility, content, category, category_lower,
             status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, lower($5), $6, $7, now())
        ON CONFLICT (id) DO UPDATE SET
            content = EXCLUDED.content,
            category = EXCLUDED.category,
            category_lower = EXCLUDED.category_lower,
            updated_at = now()
        "#,
    )
    .bind(payload.report_id)
    .bind(&payload.reporter_user_id)
    .bind(payload.visibility.as_str())
    .bind(&payload.content)
    .bind(&payload.category)
    .bind(ReportStatus::Received.as_str())
    .bind(payload.created_at)
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    increment_counter(tx, &payload.category, ReportStatus::Received.as_str()).await?;

    // The submitter's own view may already hold an inline-seeded row; the
    // created event never downgrades it.
    sqlx::query(
        r#"
        INSERT INTO my_reports
            (report_id, reporter_user_id, content, category, current_status,
             vote_count, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 0, $6, now())
        ON CONFLICT (report_id) DO NOTHING
        "#,
    )
    .bind(payload.report_id)
    .bind(&payload.reporter_user_id)
    .bind(&payload.content)
    .bind(&payload.category)
    .bind(ReportStatus::Received.as_str())
    .bind(payload.created_at)
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    if payload.visibility == Visibility::Public {
        sqlx::query(
            r#"
            INSERT INTO public_reports (report_id, content, category, vote_count, created_at)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(payload.report_id)
        .bind(&payload.content)
        .bind(&payload.category)
        .bind(payload.created_at)
        .execute(&mut *tx)
        .await
        .map_err(perr)?;
    }

    Ok(())
}

async fn apply_status_updated(
    tx: &mut PgConnection,
    payload: &ReportStatusUpdatedPayload,
) -> Result<(), DomainError> {
    let existing = sqlx::query("SELECT category, status FROM reports_read_model WHERE id = $1")
        .bind(payload.report_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(perr)?;

    let Some(row) = existing else {
        // Per-aggregate ordering makes this unreachable under a single
        // consumer; tolerate it on redeliveries during catch-up.
        warn!(report_id = %payload.report_id, "status update for unknown read-model row");
        return Ok(());
    };
    let category: String = row.get("category");
    let old_status: String = row.get("status");

    sqlx::query("UPDATE reports_read_model SET status = $2, updated_at = now() WHERE id = $1")
        .bind(payload.report_id)
        .bind(payload.new_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(perr)?;

    sqlx::query("UPDATE my_reports SET current_status = $2, updated_at = $3 WHERE report_id = $1")
        .bind(payload.report_id)
        .bind(payload.new_status.as_str())
        .bind(payload.changed_at)
        .execute(&mut *tx)
        .await
        .map_err(perr)?;

    if old_status != payload.new_status.as_str() {
        decrement_counter(tx, &category, &old_status).await?;
        increment_counter(tx, &category, payload.new_status.as_str()).await?;
    }

    Ok(())
}

async fn apply_upvoted(
    tx: &mut PgConnection,
    payload: &ReportUpvotedPayload,
) -> Result<(), DomainError> {
    // Dedup by voter: duplicate publishes for the same voter converge to
    // one counted vote.
    sqlx::query(
        "INSERT INTO report_voters (report_id, voter_user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(payload.report_id)
    .bind(&payload.voter_user_id)
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    refresh_vote_counts(tx, payload.report_id).await
}

async fn apply_deleted(
    tx: &mut PgConnection,
    payload: &ReportDeletedPayload,
) -> Result<(), DomainError> {
    let existing = sqlx::query("SELECT category, status FROM reports_read_model WHERE id = $1")
        .bind(payload.report_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(perr)?;

    let Some(row) = existing else {
        return Ok(());
    };
    let category: String = row.get("category");
    let status: String = row.get("status");

    for sql in [
        "DELETE FROM reports_read_model WHERE id = $1",
        "DELETE FROM my_reports WHERE report_id = $1",
        "DELETE FROM public_reports WHERE report_id = $1",
        "DELETE FROM report_voters WHERE report_id = $1",
    ] {
        sqlx::query(sql)
            .bind(payload.report_id)
            .execute(&mut *tx)
            .await
            .map_err(perr)?;
    }

    decrement_counter(tx, &category, &status).await
}

/// Upsert-increment of one (category, status) counter.
async fn increment_counter(
    tx: &mut PgConnection,
    category: &str,
    status: &str,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO report_counters (category, status, count, updated_at)
        VALUES ($1, $2, 1, now())
        ON CONFLICT (category, status) DO UPDATE SET
            count = report_counters.count + 1,
            updated_at = now()
        "#,
    )
    .bind(category)
    .bind(status)
    .execute(tx)
    .await
    .map_err(perr)?;
    Ok(())
}

/// Decrement clamped at zero; counters are never negative.
async fn decrement_counter(
    tx: &mut PgConnection,
    category: &str,
    status: &str,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE report_counters
        SET count = GREATEST(count - 1, 0), updated_at = now()
        WHERE category = $1 AND status = $2
        "#,
    )
    .bind(category)
    .bind(status)
    .execute(tx)
    .await
    .map_err(perr)?;
    Ok(())
}

async fn refresh_vote_counts(tx: &mut PgConnection, report_id: Uuid) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        UPDATE my_reports
        SET vote_count = (SELECT count(*) FROM report_voters WHERE report_id = $1),
            updated_at = now()
        WHERE report_id = $1
        "#,
    )
    .bind(report_id)
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    sqlx::query(
        r#"
        UPDATE public_reports
        SET vote_count = (SELECT count(*) FROM report_voters WHERE report_id = $1)
        WHERE report_id = $1
        "#,
    )
    .bind(report_id)
    .execute(&mut *tx)
    .await
    .map_err(perr)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalations_and_foreign_events_have_no_table_effect() {
        assert_eq!(dispatch_kind(&EventType::ReportEscalated), Applied::Skipped);
        assert_eq!(
            dispatch_kind(&EventType::Unknown("user.created".into())),
            Applied::Skipped
        );
    }

    #[test]
    fn all_report_lifecycle_events_are_applied() {
        for t in [
            EventType::ReportCreated,
            EventType::ReportStatusUpdated,
            EventType::ReportUpvoted,
            EventType::ReportDeleted,
        ] {
            assert_eq!(dispatch_kind(&t), Applied::Applied);
        }
    }
}
