//! SLA breach sweeper.
//!
//! Every tick, moves overdue PENDING jobs to ESCALATED (level bumped,
//! processed-at stamped) and publishes `report.escalated` per job. A job
//! escalates at most once: once off PENDING it is never re-selected.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use lapor_bus::EventBus;
use lapor_core::events::EventEnvelope;

use crate::store::WorkflowStore;

/// Sweep period. Breach detection may lag a deadline by up to one tick.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub struct SlaSweeper {
    store: WorkflowStore,
    bus: EventBus,
}

impl SlaSweeper {
    pub fn new(store: WorkflowStore, bus: EventBus) -> Self {
        Self { store, bus }
    }

    /// Run the sweep loop until the shutdown watch flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = SWEEP_INTERVAL.as_secs(), "SLA sweeper started");
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        // The immediate first tick would race service startup; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep_once().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("SLA sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One sweep pass; failures are logged and retried next tick.
    pub async fn sweep_once(&self) {
        let escalated = match self.store.escalate_due_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "SLA sweep failed");
                return;
            }
        };

        for job in escalated {
            info!(
                report_id = %job.report_id,
                level = job.escalation_level,
                "SLA breached, escalating"
            );
            let envelope =
                EventEnvelope::report_escalated(job.report_id, job.escalation_level);
            if let Err(e) = self.bus.publish(&envelope).await {
                // The job row is already ESCALATED; the event is lost until
                // operator replay.
                error!(
                    report_id = %job.report_id,
                    error = %e,
                    "report.escalated publish failed"
                );
            }
        }
    }
}
