//! Fan-out across replicas with partial-success acknowledgement.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::join_all;
use sqlx::PgPool;
use tracing::{debug, warn};

use lapor_bus::EventHandler;
use lapor_core::events::EventEnvelope;

use crate::apply::{apply_event, Applied};

/// One read replica and its dedicated pool.
pub struct Replica {
    pub host: String,
    pub pool: PgPool,
}

/// Bus handler that applies each event to every replica in parallel.
///
/// Acks (returns `Ok`) when at least one replica applied; only a full
/// failure leaves the entry pending for redelivery. Replicas that failed
/// catch up on the redelivery, gated by their ledgers.
pub struct FanoutHandler {
    replicas: Arc<Vec<Replica>>,
}

impl FanoutHandler {
    pub fn new(replicas: Vec<Replica>) -> Self {
        Self {
            replicas: Arc::new(replicas),
        }
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}

#[async_trait]
impl EventHandler for FanoutHandler {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        let applies = self.replicas.iter().map(|replica| async {
            (replica.host.as_str(), apply_event(&replica.pool, event).await)
        });
        let results = join_all(applies).await;

        let mut succeeded = 0usize;
        for (host, result) in results {
            match result {
                Ok(Applied::Duplicate) => {
                    debug!(host, event_id = %event.event_id, "replica already had event");
                    succeeded += 1;
                }
                Ok(_) => succeeded += 1,
                Err(e) => {
                    warn!(
                        host,
                        event_id = %event.event_id,
                        event_type = %event.event_type,
                        error = %e,
                        "replica apply failed"
                    );
                }
            }
        }

        if succeeded == 0 {
            return Err(anyhow!(
                "all {} replicas failed for event {}",
                self.replicas.len(),
                event.event_id
            ));
        }
        if succeeded < self.replicas.len() {
            warn!(
                event_id = %event.event_id,
                succeeded,
                total = self.replicas.len(),
                "partial replica success, acking anyway"
            );
        }
        Ok(())
    }
}
