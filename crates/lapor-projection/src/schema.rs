//! Read-replica schema, owned by the projection worker.
//!
//! Every replica (including the citizen service's local read store) carries
//! the same tables. DDL is idempotent so services can run it at startup.

use sqlx::PgPool;

const REPLICA_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS reports_read_model (
        id UUID PRIMARY KEY,
        reporter_user_id TEXT NOT NULL,
        visibility TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        category_lower TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_read_model_category_lower
        ON reports_read_model (category_lower)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_read_model_status
        ON reports_read_model (status)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS my_reports (
        report_id UUID PRIMARY KEY,
        reporter_user_id TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        current_status TEXT NOT NULL,
        vote_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_my_reports_reporter
        ON my_reports (reporter_user_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS public_reports (
        report_id UUID PRIMARY KEY,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        vote_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    // Consumer-side dedup for report.upvoted: publication is not
    // deduplicated at the source.
    r#"
    CREATE TABLE IF NOT EXISTS report_voters (
        report_id UUID NOT NULL,
        voter_user_id TEXT NOT NULL,
        PRIMARY KEY (report_id, voter_user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS report_counters (
        category TEXT NOT NULL,
        status TEXT NOT NULL,
        count BIGINT NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (category, status)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS processed_events (
        event_id UUID PRIMARY KEY,
        event_type TEXT NOT NULL,
        processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Create the replica tables if they do not exist yet.
pub async fn ensure_replica_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in REPLICA_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
