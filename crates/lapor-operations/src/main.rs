//! lapor-operations — officer-facing service.
//!
//! Reads config from env vars:
//!   OPERATIONS_DB_*      — operations store (cases, history)
//!   BUS_HOST / BUS_PORT  — event bus endpoint
//!   SERVER_PORT          — listen port (default 8082)
//!   INSTANCE_ID          — consumer name within the operations group
//!   LAPOR_JWT_SECRET     — HS256 secret for the auth edge

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use lapor_bus::EventBus;
use lapor_core::config::connect_pool;
use lapor_core::events::{GROUP_OPERATIONS, REPORT_STREAM};
use lapor_core::routing::{AGENCY_HEALTH, AGENCY_INFRA, AGENCY_SAFETY};
use lapor_http::{password_digest, JwtConfig};
use lapor_operations::config::{OperationsConfig, POOL_MAX, POOL_MIN_IDLE};
use lapor_operations::consumer::CaseRouter;
use lapor_operations::handlers::build_router;
use lapor_operations::schema::ensure_operations_schema;
use lapor_operations::store::CaseStore;
use lapor_operations::OperationsService;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lapor_operations=debug".into()),
        )
        .init();

    let cfg = OperationsConfig::from_env();

    let pool = connect_pool(&cfg.db, POOL_MAX, POOL_MIN_IDLE)
        .await
        .expect("failed to connect to operations store");
    ensure_operations_schema(&pool)
        .await
        .expect("failed to ensure operations schema");

    let store = CaseStore::new(pool);

    if cfg.seed_demo_users {
        store
            .seed_demo_users(&[
                ("officer1", &password_digest("password123"), "officer1", AGENCY_INFRA),
                ("officer2", &password_digest("password123"), "officer2", AGENCY_HEALTH),
                ("officer3", &password_digest("password123"), "officer3", AGENCY_SAFETY),
            ])
            .await
            .expect("failed to seed demo users");
    }

    let bus = EventBus::connect(&cfg.bus)
        .await
        .expect("failed to connect to event bus");
    bus.ensure_group(REPORT_STREAM, GROUP_OPERATIONS)
        .await
        .expect("failed to ensure consumer group");

    let service = Arc::new(OperationsService::new(store.clone(), bus.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = {
        let bus = bus.clone();
        let instance = cfg.instance_id.clone();
        let handler = Arc::new(CaseRouter::new(store));
        tokio::spawn(async move {
            bus.consume(GROUP_OPERATIONS, &instance, handler, shutdown_rx)
                .await;
        })
    };

    let app = build_router(service, JwtConfig::from_env());

    let listener = TcpListener::bind(("0.0.0.0", cfg.server_port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind port {}: {e}", cfg.server_port));
    info!(port = cfg.server_port, "operations service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("server error");

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, consumer).await;
    info!("operations service stopped");
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
}
