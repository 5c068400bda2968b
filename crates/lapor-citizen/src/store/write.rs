//! Authoritative write store: reports, votes, demo users.
//!
//! All SQL is runtime-checked (`sqlx::query`, not `sqlx::query!`) so the
//! crate builds without a live database.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use lapor_core::types::{Report, Visibility};
use lapor_core::DomainError;

/// Login row for the citizen auth edge.
#[derive(Debug, Clone, FromRow)]
pub struct CitizenUser {
    pub username: String,
    pub password_sha256: String,
    pub user_id: String,
}

#[derive(Debug, FromRow)]
struct ReportRow {
    id: Uuid,
    reporter_user_id: String,
    visibility: String,
    content: String,
    category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for Report {
    type Error = DomainError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Report {
            id: row.id,
            reporter_user_id: row.reporter_user_id,
            visibility: Visibility::try_from(row.visibility.as_str())?,
            content: row.content,
            category: row.category,
            created_at: row.created_at,
        })
    }
}

/// Newtype over the write pool.
#[derive(Clone)]
pub struct ReportWriteStore {
    pool: PgPool,
}

impl ReportWriteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_report(&self, report: &Report) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO reports (id, reporter_user_id, visibility, content, category, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(report.id)
        .bind(&report.reporter_user_id)
        .bind(report.visibility.as_str())
        .bind(&report.content)
        .bind(&report.category)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_report(&self, id: Uuid) -> Result<Option<Report>, DomainError> {
        let row = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT id, reporter_user_id, visibility, content, category, created_at
            FROM reports
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Report::try_from).transpose()
    }

    /// Conflict-ignore vote insert. Returns whether a new row was written.
    pub async fn insert_vote(
        &self,
        report_id: Uuid,
        voter_user_id: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO votes (report_id, voter_user_id, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (report_id, voter_user_id) DO NOTHING
            "#,
        )
        .bind(report_id)
        .bind(voter_user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Authoritative vote count: cardinality of distinct voters.
    pub async fn vote_count(&self, report_id: Uuid) -> Result<i64, DomainError> {
        let row = sqlx::query("SELECT count(*) AS n FROM votes WHERE report_id = $1")
            .bind(report_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<CitizenUser>, DomainError> {
        let user = sqlx::query_as::<_, CitizenUser>(
            "SELECT username, password_sha256, user_id FROM citizen_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Development-only login rows, inserted when `LAPOR_SEED_DEMO_USERS`
    /// is set.
    pub async fn seed_demo_users(&self, users: &[(&str, &str, &str)]) -> Result<(), DomainError> {
        for (username, digest, user_id) in users {
            sqlx::query(
                r#"
                INSERT INTO citizen_users (username, password_sha256, user_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (username) DO NOTHING
                "#,
            )
            .bind(username)
            .bind(digest)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        }
        info!(count = users.len(), "demo citizen users ensured");
        Ok(())
    }
}
