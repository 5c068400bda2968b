//! Workflow store schema: projection, SLA jobs, notifications.

use sqlx::PgPool;

const WORKFLOW_DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS report_status_projection (
        report_id UUID PRIMARY KEY,
        current_status TEXT NOT NULL,
        reporter_user_id TEXT NOT NULL,
        deadline TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sla_jobs (
        report_id UUID PRIMARY KEY,
        status TEXT NOT NULL,
        deadline TIMESTAMPTZ NOT NULL,
        escalation_level INT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        processed_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_sla_jobs_pending
        ON sla_jobs (status, deadline)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id BIGSERIAL PRIMARY KEY,
        user_id TEXT NOT NULL,
        report_id UUID NOT NULL,
        message TEXT NOT NULL,
        is_read BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_notifications_user
        ON notifications (user_id, created_at DESC)
    "#,
];

pub async fn ensure_workflow_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in WORKFLOW_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
