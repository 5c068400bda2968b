//! Postgres store for cases and status history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use lapor_core::types::ReportStatus;
use lapor_core::DomainError;

/// Case row, denormalized for officer display.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CaseRow {
    pub report_id: Uuid,
    pub owner_agency: String,
    pub status: String,
    pub content: String,
    pub reporter_user_id: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Officer login row.
#[derive(Debug, Clone, FromRow)]
pub struct OfficerUser {
    pub username: String,
    pub password_sha256: String,
    pub user_id: String,
    pub agency: String,
}

#[derive(Clone)]
pub struct CaseStore {
    pool: PgPool,
}

impl CaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conflict-ignore insert: at most one case per report, no matter how
    /// often `report.created` is redelivered.
    pub async fn insert_case_ignore(
        &self,
        report_id: Uuid,
        owner_agency: &str,
        content: &str,
        reporter_user_id: &str,
        visibility: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO cases
                (report_id, owner_agency, status, content, reporter_user_id,
                 visibility, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(report_id)
        .bind(owner_agency)
        .bind(ReportStatus::Received.as_str())
        .bind(content)
        .bind(reporter_user_id)
        .bind(visibility)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_case(&self, report_id: Uuid) -> Result<Option<CaseRow>, DomainError> {
        let row = sqlx::query_as::<_, CaseRow>(
            r#"
            SELECT report_id, owner_agency, status, content, reporter_user_id,
                   visibility, created_at, updated_at
            FROM cases
            WHERE report_id = $1
            "#,
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Status update plus history append, atomically.
    pub async fn transition(
        &self,
        report_id: Uuid,
        old_status: ReportStatus,
        new_status: ReportStatus,
        changed_by: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE cases SET status = $2, updated_at = $3 WHERE report_id = $1")
            .bind(report_id)
            .bind(new_status.as_str())
            .bind(changed_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO case_status_history
                (report_id, old_status, new_status, changed_by, changed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(report_id)
        .bind(old_status.as_str())
        .bind(new_status.as_str())
        .bind(changed_by)
        .bind(changed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Agency inbox, newest first.
    pub async fn inbox(&self, agency: &str) -> Result<Vec<CaseRow>, DomainError> {
        let rows = sqlx::query_as::<_, CaseRow>(
            r#"
            SELECT report_id, owner_agency, status, content, reporter_user_id,
                   visibility, created_at, updated_at
            FROM cases
            WHERE owner_agency = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(agency)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<OfficerUser>, DomainError> {
        let user = sqlx::query_as::<_, OfficerUser>(
            r#"
            SELECT username, password_sha256, user_id, agency
            FROM officer_users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn seed_demo_users(
        &self,
        users: &[(&str, &str, &str, &str)],
    ) -> Result<(), DomainError> {
        for (username, digest, user_id, agency) in users {
            sqlx::query(
                r#"
                INSERT INTO officer_users (username, password_sha256, user_id, agency)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (username) DO NOTHING
                "#,
            )
            .bind(username)
            .bind(digest)
            .bind(user_id)
            .bind(agency)
            .execute(&self.pool)
            .await?;
        }
        info!(count = users.len(), "demo officer users ensured");
        Ok(())
    }
}
