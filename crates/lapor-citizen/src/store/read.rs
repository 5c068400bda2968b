//! Read store: submitter feed, public feed, master read model, counters.
//!
//! This database is one of the projector's replicas; the query path only
//! ever reads it, and the inline/command-path writes here are best-effort
//! seeds that the projector is allowed to overtake.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, QueryBuilder, Row};
use uuid::Uuid;

use lapor_core::types::{Report, ReportStatus};
use lapor_core::DomainError;

/// Submitter dashboard row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MyReportRow {
    pub report_id: Uuid,
    pub content: String,
    pub category: String,
    pub current_status: String,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public feed row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PublicReportRow {
    pub report_id: Uuid,
    pub content: String,
    pub category: String,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Master read-model row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReadModelRow {
    pub id: Uuid,
    pub reporter_user_id: String,
    pub visibility: String,
    pub content: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of the master list plus the unpaged total.
#[derive(Debug, Serialize)]
pub struct ReportListPage {
    pub reports: Vec<ReadModelRow>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Per-category slice of the statistics endpoint.
#[derive(Debug, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub received: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    pub categories: Vec<CategoryStats>,
    pub total: i64,
}

/// Newtype over the read pool.
#[derive(Clone)]
pub struct ReadStore {
    pool: PgPool,
}

impl ReadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ── Inline command-path seeds ─────────────────────────────

    /// Seed the submitter's own view at creation time so their dashboard
    /// is populated before the projector catches up.
    pub async fn seed_my_report(&self, report: &Report) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO my_reports
                (report_id, reporter_user_id, content, category, current_status,
                 vote_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6, now())
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(report.id)
        .bind(&report.reporter_user_id)
        .bind(&report.content)
        .bind(&report.category)
        .bind(ReportStatus::Received.as_str())
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn seed_public_report(&self, report: &Report) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO public_reports (report_id, content, category, vote_count, created_at)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (report_id) DO NOTHING
            "#,
        )
        .bind(report.id)
        .bind(&report.content)
        .bind(&report.category)
        .bind(report.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inline vote sync: record the voter and pin both views to the
    /// authoritative count.
    pub async fn sync_vote_count(
        &self,
        report_id: Uuid,
        voter_user_id: &str,
        count: i64,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO report_voters (report_id, voter_user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(report_id)
        .bind(voter_user_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "UPDATE my_reports SET vote_count = $2, updated_at = now() WHERE report_id = $1",
        )
        .bind(report_id)
        .bind(count)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE public_reports SET vote_count = $2 WHERE report_id = $1")
            .bind(report_id)
            .bind(count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ── Feed-refresh consumer writes ──────────────────────────

    pub async fn set_feed_status(
        &self,
        report_id: Uuid,
        status: ReportStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE my_reports SET current_status = $2, updated_at = $3 WHERE report_id = $1",
        )
        .bind(report_id)
        .bind(status.as_str())
        .bind(changed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consumer-side vote apply: dedup by voter, then recount.
    pub async fn record_vote(
        &self,
        report_id: Uuid,
        voter_user_id: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO report_voters (report_id, voter_user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(report_id)
        .bind(voter_user_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE my_reports
            SET vote_count = (SELECT count(*) FROM report_voters WHERE report_id = $1),
                updated_at = now()
            WHERE report_id = $1
            "#,
        )
        .bind(report_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE public_reports
            SET vote_count = (SELECT count(*) FROM report_voters WHERE report_id = $1)
            WHERE report_id = $1
            "#,
        )
        .bind(report_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ── Query path ────────────────────────────────────────────

    pub async fn my_reports(&self, reporter_user_id: &str) -> Result<Vec<MyReportRow>, DomainError> {
        let rows = sqlx::query_as::<_, MyReportRow>(
            r#"
            SELECT report_id, content, category, current_status, vote_count,
                   created_at, updated_at
            FROM my_reports
            WHERE reporter_user_id = $1
            ORDER BY created_at DESC
            LIMIT 100
            "#,
        )
        .bind(reporter_user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn public_feed(&self) -> Result<Vec<PublicReportRow>, DomainError> {
        let rows = sqlx::query_as::<_, PublicReportRow>(
            r#"
            SELECT report_id, content, category, vote_count, created_at
            FROM public_reports
            ORDER BY created_at DESC
            LIMIT 50
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Paginated master list with optional case-insensitive category
    /// filter and status filter.
    pub async fn list_reports(
        &self,
        page: i64,
        per_page: i64,
        category: Option<&str>,
        status: Option<ReportStatus>,
    ) -> Result<ReportListPage, DomainError> {
        let offset = (page - 1) * per_page;

        let mut query = QueryBuilder::new(
            "SELECT id, reporter_user_id, visibility, content, category, status, \
             created_at, updated_at FROM reports_read_model WHERE 1 = 1",
        );
        let mut count_query = QueryBuilder::new("SELECT count(*) FROM reports_read_model WHERE 1 = 1");
        for qb in [&mut query, &mut count_query] {
            if let Some(cat) = category {
                qb.push(" AND category_lower = ");
                qb.push_bind(cat.to_lowercase());
            }
            if let Some(st) = status {
                qb.push(" AND status = ");
                qb.push_bind(st.as_str());
            }
        }
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(per_page);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let reports = query
            .build_query_as::<ReadModelRow>()
            .fetch_all(&self.pool)
            .await?;
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(ReportListPage {
            reports,
            total,
            page,
            per_page,
        })
    }

    pub async fn report_by_id(&self, id: Uuid) -> Result<Option<ReadModelRow>, DomainError> {
        let row = sqlx::query_as::<_, ReadModelRow>(
            r#"
            SELECT id, reporter_user_id, visibility, content, category, status,
                   created_at, updated_at
            FROM reports_read_model
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fold the (category, status) counters into per-category stats.
    pub async fn statistics(&self) -> Result<StatsSummary, DomainError> {
        let rows = sqlx::query(
            "SELECT category, status, count FROM report_counters ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories: Vec<CategoryStats> = Vec::new();
        let mut total = 0i64;
        for row in rows {
            let category: String = row.get("category");
            let status: String = row.get("status");
            let count: i64 = row.get("count");
            total += count;

            let idx = match categories.iter().position(|c| c.category == category) {
                Some(idx) => idx,
                None => {
                    categories.push(CategoryStats {
                        category: category.clone(),
                        received: 0,
                        in_progress: 0,
                        resolved: 0,
                        total: 0,
                    });
                    categories.len() - 1
                }
            };
            let entry = &mut categories[idx];
            entry.total += count;
            match status.as_str() {
                "RECEIVED" => entry.received += count,
                "IN_PROGRESS" => entry.in_progress += count,
                "RESOLVED" => entry.resolved += count,
                _ => {}
            }
        }

        Ok(StatsSummary { categories, total })
    }
}
