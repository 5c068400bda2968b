//! Publish, group management, and the consume loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use lapor_core::config::BusConfig;
use lapor_core::events::{EventEnvelope, REPORT_STREAM};

/// Max entries fetched per XREADGROUP call. Tunable, not a contract.
const READ_BATCH: usize = 50;
/// XREADGROUP block timeout in milliseconds.
const BLOCK_MS: usize = 1000;
/// Linear backoff after a failed stream read.
const READ_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus transport failure: {0}")]
    Transport(#[from] redis::RedisError),

    #[error("envelope codec failure: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("malformed stream entry: {0}")]
    Malformed(String),
}

/// Per-message callback for [`EventBus::consume`].
///
/// Return `Err` only for transient infrastructure failures: the entry is
/// left unacked and redelivered. Unrecognized event types are a skip, not
/// an error.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &EventEnvelope) -> anyhow::Result<()>;
}

/// Handle to the shared `report-events` stream.
///
/// Cheap to clone; all clones share one multiplexed connection that
/// reconnects on broker failure.
#[derive(Clone)]
pub struct EventBus {
    manager: ConnectionManager,
}

impl EventBus {
    pub async fn connect(cfg: &BusConfig) -> Result<Self, BusError> {
        let client = redis::Client::open(cfg.url())?;
        let manager = client.get_connection_manager().await?;
        info!(host = %cfg.host, port = cfg.port, "connected to event bus");
        Ok(Self { manager })
    }

    /// Append an envelope to the stream. Returns the stream entry id on
    /// durable append.
    pub async fn publish(&self, envelope: &EventEnvelope) -> Result<String, BusError> {
        let fields = envelope_entry_fields(envelope)?;
        let mut conn = self.manager.clone();
        let entry_id: String = conn.xadd(REPORT_STREAM, "*", &fields).await?;
        debug!(
            event_id = %envelope.event_id,
            event_type = %envelope.event_type,
            report_id = %envelope.report_id,
            entry_id = %entry_id,
            "event published"
        );
        Ok(entry_id)
    }

    /// Create the stream (if absent) and the consumer group starting at
    /// offset 0. An already-existing group is success.
    pub async fn ensure_group(&self, stream: &str, group: &str) -> Result<(), BusError> {
        let mut conn = self.manager.clone();
        match conn
            .xgroup_create_mkstream::<_, _, _, String>(stream, group, "0")
            .await
        {
            Ok(_) => {
                info!(stream, group, "consumer group created");
                Ok(())
            }
            Err(e) if is_busygroup(&e) => {
                debug!(stream, group, "consumer group already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Long-running consume loop for one consumer of one group.
    ///
    /// Reads batches of new entries, invokes the handler per entry, and
    /// acks on handler success. The consumer's pending list is drained
    /// first (and re-drained after any handler failure), so an entry left
    /// unacked by a crash or a failed handler is redelivered on the next
    /// read. Transient read errors back off linearly; the loop exits when
    /// the shutdown watch flips to `true`.
    pub async fn consume(
        &self,
        group: &str,
        consumer: &str,
        handler: Arc<dyn EventHandler>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(group, consumer, "event consumer started");
        let mut conn = self.manager.clone();
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(READ_BATCH)
            .block(BLOCK_MS);

        // "0" replays this consumer's pending entries; ">" waits for new
        // ones. Start on the pending list to pick up whatever a previous
        // incarnation left unacked.
        let mut read_id = "0";

        loop {
            if *shutdown.borrow() {
                break;
            }

            let read_ids = [read_id];
            let read = tokio::select! {
                r = conn.xread_options::<_, _, StreamReadReply>(
                    &[REPORT_STREAM], &read_ids, &opts,
                ) => r,
                _ = shutdown.changed() => continue,
            };

            let reply = match read {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(group, error = %e, "stream read failed, backing off");
                    tokio::time::sleep(READ_BACKOFF).await;
                    continue;
                }
            };

            let mut delivered = 0usize;
            let mut failed = false;
            for key in reply.keys {
                for entry in key.ids {
                    delivered += 1;
                    if !self
                        .dispatch_entry(&mut conn, group, handler.as_ref(), &entry)
                        .await
                    {
                        failed = true;
                    }
                }
            }

            if failed {
                // Re-read the pending list so the failed entries come
                // straight back instead of waiting for a restart.
                read_id = "0";
                tokio::time::sleep(READ_BACKOFF).await;
            } else if read_id == "0" && delivered == 0 {
                read_id = ">";
            }
        }
        info!(group, consumer, "event consumer stopped");
    }

    /// Handle one stream entry, acking when appropriate. Returns `false`
    /// only for a handler failure that should trigger redelivery.
    async fn dispatch_entry(
        &self,
        conn: &mut ConnectionManager,
        group: &str,
        handler: &dyn EventHandler,
        entry: &StreamId,
    ) -> bool {
        let envelope = match envelope_from_entry(entry) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Poison entry: an envelope that will never parse would
                // otherwise redeliver forever. Ack it and move on.
                error!(group, entry_id = %entry.id, error = %e, "unparseable entry, acking");
                ack(conn, group, &entry.id).await;
                return true;
            }
        };

        match handler.handle(&envelope).await {
            Ok(()) => {
                ack(conn, group, &entry.id).await;
                true
            }
            Err(e) => {
                warn!(
                    group,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    error = %e,
                    "handler failed, leaving entry pending for redelivery"
                );
                false
            }
        }
    }
}

async fn ack(conn: &mut ConnectionManager, group: &str, entry_id: &str) {
    if let Err(e) = conn
        .xack::<_, _, _, i64>(REPORT_STREAM, group, &[entry_id])
        .await
    {
        // The entry stays pending and will be redelivered; handlers are
        // idempotent so this is safe.
        warn!(group, entry_id, error = %e, "ack failed");
    }
}

fn is_busygroup(e: &redis::RedisError) -> bool {
    e.code() == Some("BUSYGROUP")
}

/// Flatten an envelope into stream entry fields. The structural fields are
/// duplicated for cheap filtering; `payload` carries the full serialized
/// envelope.
pub fn envelope_entry_fields(
    envelope: &EventEnvelope,
) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
    Ok(vec![
        ("event_id", envelope.event_id.to_string()),
        ("event_type", envelope.event_type.as_str().to_string()),
        ("report_id", envelope.report_id.to_string()),
        ("timestamp", envelope.timestamp.to_rfc3339()),
        ("payload", serde_json::to_string(envelope)?),
    ])
}

fn envelope_from_entry(entry: &StreamId) -> Result<EventEnvelope, BusError> {
    let payload: String = entry
        .get("payload")
        .ok_or_else(|| BusError::Malformed(format!("entry {} has no payload field", entry.id)))?;
    Ok(serde_json::from_str(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lapor_core::events::EventType;
    use lapor_core::types::{Report, Visibility};
    use uuid::Uuid;

    fn sample_envelope() -> EventEnvelope {
        EventEnvelope::report_created(&Report {
            id: Uuid::new_v4(),
            reporter_user_id: "citizen1".into(),
            visibility: Visibility::Public,
            content: "Lampu jalan mati".into(),
            category: "infrastruktur".into(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn entry_fields_carry_structural_duplicates() {
        let envelope = sample_envelope();
        let fields = envelope_entry_fields(&envelope).unwrap();
        let get = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("event_id"), envelope.event_id.to_string());
        assert_eq!(get("event_type"), "report.created");
        assert_eq!(get("report_id"), envelope.report_id.to_string());
    }

    #[test]
    fn payload_field_round_trips_the_envelope() {
        let envelope = sample_envelope();
        let fields = envelope_entry_fields(&envelope).unwrap();
        let payload = &fields.iter().find(|(k, _)| *k == "payload").unwrap().1;
        let parsed: EventEnvelope = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(parsed.event_type, EventType::ReportCreated);
    }
}
