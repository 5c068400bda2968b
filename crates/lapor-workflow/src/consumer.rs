//! Workflow consumer (`workflow-service` group).
//!
//! `report.created` seeds the projection and the SLA job with a deadline
//! read from the runtime SLA config. `report.status.updated` advances the
//! projection, closes the SLA job on RESOLVED, and notifies the reporter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use lapor_bus::EventHandler;
use lapor_core::events::{
    EventEnvelope, EventType, ReportCreatedPayload, ReportStatusUpdatedPayload,
};
use lapor_core::types::ReportStatus;

use crate::sla::SlaConfig;
use crate::store::WorkflowStore;

/// Notification text appended on every status change.
pub fn status_notification_message(new_status: ReportStatus) -> String {
    format!("Your report status has been updated to: {new_status}")
}

pub struct WorkflowConsumer {
    store: WorkflowStore,
    sla: Arc<SlaConfig>,
}

impl WorkflowConsumer {
    pub fn new(store: WorkflowStore, sla: Arc<SlaConfig>) -> Self {
        Self { store, sla }
    }

    async fn on_created(&self, payload: ReportCreatedPayload) -> anyhow::Result<()> {
        let deadline = payload.created_at + self.sla.duration().await;

        self.store
            .seed_projection(
                payload.report_id,
                &payload.reporter_user_id,
                deadline,
                payload.created_at,
            )
            .await?;
        let created = self
            .store
            .insert_sla_job_ignore(payload.report_id, deadline)
            .await?;

        if created {
            debug!(report_id = %payload.report_id, %deadline, "SLA job created");
        }
        Ok(())
    }

    async fn on_status_updated(&self, payload: ReportStatusUpdatedPayload) -> anyhow::Result<()> {
        self.store
            .set_projection_status(payload.report_id, payload.new_status, payload.changed_at)
            .await?;

        if payload.new_status == ReportStatus::Resolved {
            self.store
                .complete_sla_job(payload.report_id, Utc::now())
                .await?;
            debug!(report_id = %payload.report_id, "SLA job completed");
        }

        // The projection carries the reporter id for exactly this lookup.
        match self.store.find_projection(payload.report_id).await? {
            Some(projection) => {
                self.store
                    .insert_notification(
                        &projection.reporter_user_id,
                        payload.report_id,
                        &status_notification_message(payload.new_status),
                    )
                    .await?;
            }
            None => {
                warn!(
                    report_id = %payload.report_id,
                    "no projection row, skipping notification"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for WorkflowConsumer {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        match &event.event_type {
            EventType::ReportCreated => match event.payload_as() {
                Ok(payload) => self.on_created(payload).await,
                Err(e) => {
                    warn!(event_id = %event.event_id, error = %e, "bad created payload, skipping");
                    Ok(())
                }
            },
            EventType::ReportStatusUpdated => match event.payload_as() {
                Ok(payload) => self.on_status_updated(payload).await,
                Err(e) => {
                    warn!(event_id = %event.event_id, error = %e, "bad status payload, skipping");
                    Ok(())
                }
            },
            // Escalations, upvotes, and foreign events are not workflow
            // concerns.
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_message_names_the_new_status() {
        assert_eq!(
            status_notification_message(ReportStatus::InProgress),
            "Your report status has been updated to: IN_PROGRESS"
        );
        assert_eq!(
            status_notification_message(ReportStatus::Resolved),
            "Your report status has been updated to: RESOLVED"
        );
    }
}
