//! Operations store schema: cases, status history, officer logins.

use sqlx::PgPool;

const OPERATIONS_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cases (
        report_id UUID PRIMARY KEY,
        owner_agency TEXT NOT NULL,
        status TEXT NOT NULL,
        content TEXT NOT NULL,
        reporter_user_id TEXT NOT NULL,
        visibility TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_cases_agency
        ON cases (owner_agency, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS case_status_history (
        id BIGSERIAL PRIMARY KEY,
        report_id UUID NOT NULL,
        old_status TEXT NOT NULL,
        new_status TEXT NOT NULL,
        changed_by TEXT NOT NULL,
        changed_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS officer_users (
        username TEXT PRIMARY KEY,
        password_sha256 TEXT NOT NULL,
        user_id TEXT NOT NULL,
        agency TEXT NOT NULL
    )
    "#,
];

pub async fn ensure_operations_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in OPERATIONS_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
