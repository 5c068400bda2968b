//! lapor-citizen — citizen-facing service.
//!
//! Reads config from env vars:
//!   CITIZEN_WRITE_DB_*   — authoritative store (reports, votes)
//!   CITIZEN_READ_DB_*    — local read store (one of the projector replicas)
//!   BUS_HOST / BUS_PORT  — event bus endpoint
//!   SERVER_PORT          — listen port (default 8081)
//!   INSTANCE_ID          — consumer name within the reporting group
//!   LAPOR_JWT_SECRET     — HS256 secret for the auth edge

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use lapor_bus::EventBus;
use lapor_citizen::config::{CitizenConfig, POOL_MAX, POOL_MIN_IDLE};
use lapor_citizen::consumer::FeedRefresher;
use lapor_citizen::handlers::build_router;
use lapor_citizen::schema::ensure_write_schema;
use lapor_citizen::store::{ReadStore, ReportWriteStore};
use lapor_citizen::CitizenService;
use lapor_core::config::connect_pool;
use lapor_core::events::{GROUP_REPORTING, REPORT_STREAM};
use lapor_http::{password_digest, JwtConfig};
use lapor_projection::schema::ensure_replica_schema;

/// In-flight requests get this long after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lapor_citizen=debug".into()),
        )
        .init();

    let cfg = CitizenConfig::from_env();

    let write_pool = connect_pool(&cfg.write_db, POOL_MAX, POOL_MIN_IDLE)
        .await
        .expect("failed to connect to write store");
    let read_pool = connect_pool(&cfg.read_db, POOL_MAX, POOL_MIN_IDLE)
        .await
        .expect("failed to connect to read store");

    ensure_write_schema(&write_pool)
        .await
        .expect("failed to ensure write schema");
    ensure_replica_schema(&read_pool)
        .await
        .expect("failed to ensure read schema");

    let write = ReportWriteStore::new(write_pool);
    let read = ReadStore::new(read_pool);

    if cfg.seed_demo_users {
        write
            .seed_demo_users(&[(
                "citizen1",
                &password_digest("password123"),
                "citizen1",
            )])
            .await
            .expect("failed to seed demo users");
    }

    let bus = EventBus::connect(&cfg.bus)
        .await
        .expect("failed to connect to event bus");
    bus.ensure_group(REPORT_STREAM, GROUP_REPORTING)
        .await
        .expect("failed to ensure consumer group");

    let service = Arc::new(CitizenService::new(write, read.clone(), bus.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = {
        let bus = bus.clone();
        let instance = cfg.instance_id.clone();
        let handler = Arc::new(FeedRefresher::new(read));
        tokio::spawn(async move {
            bus.consume(GROUP_REPORTING, &instance, handler, shutdown_rx)
                .await;
        })
    };

    let app = build_router(service, JwtConfig::from_env());

    let listener = TcpListener::bind(("0.0.0.0", cfg.server_port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind port {}: {e}", cfg.server_port));
    info!(port = cfg.server_port, "citizen service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .expect("server error");

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, consumer).await;
    info!("citizen service stopped");
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
}
