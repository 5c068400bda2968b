//! lapor-workflow — workflow and SLA service.
//!
//! Reads config from env vars:
//!   WORKFLOW_DB_*        — workflow store (projection, SLA jobs, notifications)
//!   BUS_HOST / BUS_PORT  — event bus endpoint
//!   SERVER_PORT          — listen port (default 8083)
//!   INSTANCE_ID          — consumer name within the workflow group
//!   SLA_DURATION_SECS    — initial SLA duration (default 60)
//!   LAPOR_JWT_SECRET     — HS256 secret for the auth edge

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use lapor_bus::EventBus;
use lapor_core::config::connect_pool;
use lapor_core::events::{GROUP_WORKFLOW, REPORT_STREAM};
use lapor_http::JwtConfig;
use lapor_workflow::config::{WorkflowConfig, POOL_MAX, POOL_MIN_IDLE};
use lapor_workflow::consumer::WorkflowConsumer;
use lapor_workflow::handlers::build_router;
use lapor_workflow::schema::ensure_workflow_schema;
use lapor_workflow::sweeper::SlaSweeper;
use lapor_workflow::{SlaConfig, WorkflowStore};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lapor_workflow=debug".into()),
        )
        .init();

    let cfg = WorkflowConfig::from_env();

    let pool = connect_pool(&cfg.db, POOL_MAX, POOL_MIN_IDLE)
        .await
        .expect("failed to connect to workflow store");
    ensure_workflow_schema(&pool)
        .await
        .expect("failed to ensure workflow schema");

    let store = WorkflowStore::new(pool);
    let sla = Arc::new(SlaConfig::new(cfg.sla_duration_secs));

    let bus = EventBus::connect(&cfg.bus)
        .await
        .expect("failed to connect to event bus");
    bus.ensure_group(REPORT_STREAM, GROUP_WORKFLOW)
        .await
        .expect("failed to ensure consumer group");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = {
        let bus = bus.clone();
        let instance = cfg.instance_id.clone();
        let handler = Arc::new(WorkflowConsumer::new(store.clone(), Arc::clone(&sla)));
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            bus.consume(GROUP_WORKFLOW, &instance, handler, shutdown_rx)
                .await;
        })
    };

    let sweeper = {
        let sweeper = SlaSweeper::new(store.clone(), bus.clone());
        tokio::spawn(async move {
            sweeper.run(shutdown_rx).await;
        })
    };

    let app = build_router(store, sla, JwtConfig::from_env());

    let listener = TcpListener::bind(("0.0.0.0", cfg.server_port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind port {}: {e}", cfg.server_port));
    info!(port = cfg.server_port, "workflow service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("server error");

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, async {
        let _ = consumer.await;
        let _ = sweeper.await;
    })
    .await;
    info!("workflow service stopped");
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
}
