//! lapor-projection — projection fan-out worker.
//!
//! Reads config from env vars:
//!   REPLICA_HOSTS        — comma-separated replica hosts (required in prod)
//!   REPLICA_DB_*         — connection template applied to every host
//!   BUS_HOST / BUS_PORT  — event bus endpoint
//!   INSTANCE_ID          — consumer name within the group

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use lapor_bus::EventBus;
use lapor_core::config::connect_pool;
use lapor_core::events::{GROUP_PROJECTION, REPORT_STREAM};
use lapor_projection::config::{ProjectionConfig, POOL_MAX, POOL_MIN_IDLE};
use lapor_projection::schema::ensure_replica_schema;
use lapor_projection::{FanoutHandler, Replica};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lapor_projection=debug".into()),
        )
        .init();

    let cfg = ProjectionConfig::from_env();
    assert!(
        !cfg.replica_hosts.is_empty(),
        "REPLICA_HOSTS must name at least one replica"
    );

    let mut replicas = Vec::with_capacity(cfg.replica_hosts.len());
    for host in &cfg.replica_hosts {
        let pool = connect_pool(&cfg.replica_db.with_host(host), POOL_MAX, POOL_MIN_IDLE)
            .await
            .expect("failed to connect to replica");
        ensure_replica_schema(&pool)
            .await
            .expect("failed to ensure replica schema");
        replicas.push(Replica {
            host: host.clone(),
            pool,
        });
    }
    info!(replicas = replicas.len(), "replica pools ready");

    let bus = EventBus::connect(&cfg.bus)
        .await
        .expect("failed to connect to event bus");
    bus.ensure_group(REPORT_STREAM, GROUP_PROJECTION)
        .await
        .expect("failed to ensure consumer group");

    let handler = Arc::new(FanoutHandler::new(replicas));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = {
        let bus = bus.clone();
        let instance = cfg.instance_id.clone();
        tokio::spawn(async move {
            bus.consume(GROUP_PROJECTION, &instance, handler, shutdown_rx)
                .await;
        })
    };

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = consumer.await;
    info!("projection worker stopped");
}
