//! Case router consumer (`operations-service` group).
//!
//! Handles only `report.created`: derives the owning agency from the
//! category and inserts the inbox row. Redeliveries are absorbed by the
//! conflict-ignore insert; every other event type is acked untouched.

use async_trait::async_trait;
use tracing::{debug, warn};

use lapor_bus::EventHandler;
use lapor_core::events::{EventEnvelope, EventType, ReportCreatedPayload};
use lapor_core::routing::agency_for_category;

use crate::store::CaseStore;

pub struct CaseRouter {
    store: CaseStore,
}

impl CaseRouter {
    pub fn new(store: CaseStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for CaseRouter {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        if event.event_type != EventType::ReportCreated {
            return Ok(());
        }

        let payload: ReportCreatedPayload = match event.payload_as() {
            Ok(p) => p,
            Err(e) => {
                warn!(event_id = %event.event_id, error = %e, "bad created payload, skipping");
                return Ok(());
            }
        };

        let owner_agency = agency_for_category(&payload.category);
        let inserted = self
            .store
            .insert_case_ignore(
                payload.report_id,
                owner_agency,
                &payload.content,
                &payload.reporter_user_id,
                payload.visibility.as_str(),
                payload.created_at,
            )
            .await?;

        if inserted {
            debug!(
                report_id = %payload.report_id,
                owner_agency,
                category = %payload.category,
                "case routed"
            );
        } else {
            debug!(report_id = %payload.report_id, "case already exists, redelivery absorbed");
        }
        Ok(())
    }
}
