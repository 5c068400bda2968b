//! Postgres store for the workflow database.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use lapor_core::types::{ReportStatus, SlaStatus};
use lapor_core::DomainError;

/// Report-status projection row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectionRow {
    pub report_id: Uuid,
    pub current_status: String,
    pub reporter_user_id: String,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SLA job row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlaJobRow {
    pub report_id: Uuid,
    pub status: String,
    pub deadline: DateTime<Utc>,
    pub escalation_level: i32,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Notification row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: String,
    pub report_id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A job escalated by one sweep.
#[derive(Debug, Clone)]
pub struct EscalatedJob {
    pub report_id: Uuid,
    pub escalation_level: i32,
}

#[derive(Clone)]
pub struct WorkflowStore {
    pool: PgPool,
}

impl WorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Seed the projection on `report.created`. Conflict-ignore so a
    /// redelivery arriving after a status update never regresses the row.
    pub async fn seed_projection(
        &self,
        report_id: Uuid,
        reporter_user_id: &str,
        deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO report_status_projection
                (report_id, current_status, reporter_user_id, deadline, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(report_id)
        .bind(ReportStatus::Received.as_str())
        .bind(reporter_user_id)
        .bind(deadline)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_projection_status(
        &self,
        report_id: Uuid,
        status: ReportStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE report_status_projection
            SET current_status = $2, updated_at = $3
            WHERE report_id = $1
            "#,
        )
        .bind(report_id)
        .bind(status.as_str())
        .bind(changed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_projection(
        &self,
        report_id: Uuid,
    ) -> Result<Option<ProjectionRow>, DomainError> {
        let row = sqlx::query_as::<_, ProjectionRow>(
            r#"
            SELECT report_id, current_status, reporter_user_id, deadline,
                   created_at, updated_at
            FROM report_status_projection
            WHERE report_id = $1
            "#,
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// One SLA job per report, no matter how often the event redelivers.
    pub async fn insert_sla_job_ignore(
        &self,
        report_id: Uuid,
        deadline: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO sla_jobs (report_id, status, deadline, escalation_level, created_at)
            VALUES ($1, $2, $3, 0, now())
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(report_id)
        .bind(SlaStatus::Pending.as_str())
        .bind(deadline)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close the job when its report resolves. COMPLETED is terminal, so
    /// an already-escalated job still completes.
    pub async fn complete_sla_job(
        &self,
        report_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE sla_jobs
            SET status = $2, processed_at = $3
            WHERE report_id = $1 AND status <> $2
            "#,
        )
        .bind(report_id)
        .bind(SlaStatus::Completed.as_str())
        .bind(processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// One sweep: every PENDING job past its deadline moves to ESCALATED
    /// with its level bumped. The returning set drives event publication.
    pub async fn escalate_due_jobs(&self) -> Result<Vec<EscalatedJob>, DomainError> {
        let rows = sqlx::query(
            r#"
            UPDATE sla_jobs
            SET status = $1, escalation_level = escalation_level + 1, processed_at = now()
            WHERE status = $2 AND deadline < now()
            RETURNING report_id, escalation_level
            "#,
        )
        .bind(SlaStatus::Escalated.as_str())
        .bind(SlaStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| EscalatedJob {
                report_id: row.get("report_id"),
                escalation_level: row.get("escalation_level"),
            })
            .collect())
    }

    pub async fn insert_notification(
        &self,
        user_id: &str,
        report_id: Uuid,
        message: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, report_id, message, is_read, created_at)
            VALUES ($1, $2, $3, false, now())
            "#,
        )
        .bind(user_id)
        .bind(report_id)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn notifications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<NotificationRow>, DomainError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, report_id, message, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT 50
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// SLA overview for the status endpoint, optionally filtered.
    pub async fn sla_jobs(
        &self,
        status: Option<SlaStatus>,
    ) -> Result<Vec<SlaJobRow>, DomainError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, SlaJobRow>(
                    r#"
                    SELECT report_id, status, deadline, escalation_level, created_at, processed_at
                    FROM sla_jobs
                    WHERE status = $1
                    ORDER BY deadline
                    LIMIT 100
                    "#,
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SlaJobRow>(
                    r#"
                    SELECT report_id, status, deadline, escalation_level, created_at, processed_at
                    FROM sla_jobs
                    ORDER BY deadline
                    LIMIT 100
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }
}
