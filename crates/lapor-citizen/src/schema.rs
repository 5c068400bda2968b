//! Write-store schema owned by the citizen service.
//!
//! The read store uses the shared replica schema from `lapor-projection`;
//! this module covers the authoritative side only.

use sqlx::PgPool;

const WRITE_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id UUID PRIMARY KEY,
        reporter_user_id TEXT NOT NULL,
        visibility TEXT NOT NULL,
        content TEXT NOT NULL,
        category TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_reports_reporter
        ON reports (reporter_user_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS votes (
        report_id UUID NOT NULL,
        voter_user_id TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (report_id, voter_user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS citizen_users (
        username TEXT PRIMARY KEY,
        password_sha256 TEXT NOT NULL,
        user_id TEXT NOT NULL
    )
    "#,
];

pub async fn ensure_write_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in WRITE_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
