//! Feed-refresh consumer (`reporting-service` group).
//!
//! Keeps the local read store's feeds converged when other services mutate
//! report state: status changes from the officer path, upvotes from other
//! citizen instances. Creation is covered by the inline seed and the
//! projector.

use async_trait::async_trait;
use tracing::{debug, warn};

use lapor_bus::EventHandler;
use lapor_core::events::{
    EventEnvelope, EventType, ReportStatusUpdatedPayload, ReportUpvotedPayload,
};

use crate::store::ReadStore;

pub struct FeedRefresher {
    read: ReadStore,
}

impl FeedRefresher {
    pub fn new(read: ReadStore) -> Self {
        Self { read }
    }
}

#[async_trait]
impl EventHandler for FeedRefresher {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()> {
        match &event.event_type {
            EventType::ReportStatusUpdated => {
                let payload: ReportStatusUpdatedPayload = match event.payload_as() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(event_id = %event.event_id, error = %e, "bad status payload, skipping");
                        return Ok(());
                    }
                };
                self.read
                    .set_feed_status(payload.report_id, payload.new_status, payload.changed_at)
                    .await?;
                debug!(
                    report_id = %payload.report_id,
                    status = %payload.new_status,
                    "feed status refreshed"
                );
                Ok(())
            }
            EventType::ReportUpvoted => {
                let payload: ReportUpvotedPayload = match event.payload_as() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(event_id = %event.event_id, error = %e, "bad upvote payload, skipping");
                        return Ok(());
                    }
                };
                self.read
                    .record_vote(payload.report_id, &payload.voter_user_id)
                    .await?;
                Ok(())
            }
            // Not a feed concern; acked without effect.
            _ => Ok(()),
        }
    }
}
