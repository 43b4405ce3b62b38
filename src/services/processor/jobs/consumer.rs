use super::super::aggregator::{Aggregator, PendingEvent};
use super::super::context::Context;
use crate::libraries::helpers::keys;
use crate::libraries::storage::RawEvent;
use crate::{
    libraries::resources::{ResourceManager, ResourceManagerProvider},
    with_redis_resource,
};
use anyhow::Result;
use async_trait::async_trait;
use futures::{future::FutureExt, pin_mut, select};
use jatsl::{Job, TaskManager};
use log::{debug, error, warn};
use redis::aio::ConnectionLike;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

/// Liveness pause after an empty poll, not a backoff
const IDLE_DELAY: Duration = Duration::from_millis(50);
/// Coarse backoff after a queue or store failure
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Start of the consumer's pending entry list
const STREAM_ID_HEAD: &str = "0";
/// Entries never delivered to the group before
const STREAM_ID_ADDITIONS: &str = ">";
/// End of the stream
const STREAM_ID_TAIL: &str = "$";

/// Pulls undelivered entries off the event stream and hands them to the
/// [`Aggregator`] batch by batch
///
/// Entries stay pending in the consumer group until the aggregator has
/// committed and acknowledged them, so a crash mid-batch only ever causes
/// redelivery, never loss.
#[derive(Clone)]
pub struct EventConsumerJob {}

#[async_trait]
impl Job for EventConsumerJob {
    type Context = Context;

    const NAME: &'static str = module_path!();
    const SUPPORTS_GRACEFUL_TERMINATION: bool = true;

    async fn execute(&self, manager: TaskManager<Self::Context>) -> Result<()> {
        let mut queue = with_redis_resource!(manager);
        let config = manager.context.config.clone();
        let aggregator = Aggregator::new(manager.context.store.clone());

        // Any failure apart from the group already existing aborts startup.
        ensure_group(&mut queue, &config.group).await?;
        debug!(
            "Reading from group {} as consumer {}",
            config.group, config.consumer
        );

        let read_options = StreamReadOptions::default()
            .group(&config.group, &config.consumer)
            .count(config.batch_size)
            .block(config.poll_timeout);

        manager.ready().await;

        let termination = manager.termination_signal().fuse();
        pin_mut!(termination);

        // Entries left pending by a predecessor with the same identity are
        // drained first, afterwards the cursor moves to undelivered entries.
        let mut cursor = STREAM_ID_HEAD;

        loop {
            // The stop signal is observed at the iteration boundary, an
            // in-flight batch always runs to completion or failure first.
            select! {
                () = termination => break,
                default => {}
            }

            let entries = match poll(&mut queue, &read_options, cursor).await {
                Ok(entries) => entries,
                Err(e) => {
                    error!("Failed to read from event stream: {}", e);
                    sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            if entries.is_empty() {
                if cursor == STREAM_ID_HEAD {
                    cursor = STREAM_ID_ADDITIONS;
                } else {
                    sleep(IDLE_DELAY).await;
                }

                continue;
            }

            let batch = decode_batch(&mut queue, &config.group, entries).await;

            if let Err(e) = aggregator.process_batch(&mut queue, &config.group, batch).await {
                // Everything committed before the failure is already
                // acknowledged. The failing entry and everything after it
                // are still pending, rewinding the cursor redelivers them
                // on the next poll.
                error!("Failed to process batch: {}", e);
                cursor = STREAM_ID_HEAD;
                sleep(RETRY_DELAY).await;
            }
        }

        Ok(())
    }
}

impl EventConsumerJob {
    pub fn new() -> Self {
        Self {}
    }
}

/// Creates the consumer group at the tail of the event stream
///
/// The stream is created alongside the group if it does not exist yet. A
/// group that already exists is treated as success and keeps its delivery
/// cursor.
pub async fn ensure_group<C>(con: &mut C, group: &str) -> RedisResult<()>
where
    C: ConnectionLike + Send,
{
    match con
        .xgroup_create_mkstream::<_, _, _, ()>(keys::EVENT_STREAM, group, STREAM_ID_TAIL)
        .await
    {
        Err(e) if e.code() != Some("BUSYGROUP") => Err(e),
        _ => Ok(()),
    }
}

/// Requests a batch of entries at the given delivery cursor
///
/// Reads at [`STREAM_ID_ADDITIONS`] block up to the configured poll timeout,
/// reads inside the pending entry list return immediately.
async fn poll<C>(con: &mut C, options: &StreamReadOptions, cursor: &str) -> RedisResult<Vec<StreamId>>
where
    C: ConnectionLike + Send,
{
    // A timed-out poll replies nil which decodes to None
    let reply: Option<StreamReadReply> = con
        .xread_options(&[keys::EVENT_STREAM], &[cursor], options)
        .await?;

    Ok(reply
        .and_then(|mut reply| reply.keys.pop())
        .map(|key| key.ids)
        .unwrap_or_default())
}

/// Decodes a polled batch into typed events at the aggregation boundary
///
/// Entries that fail to decode are acknowledged and dropped so they cannot
/// wedge the loop. The producer validates events before enqueueing them, so
/// this is a corruption path, not a data path.
async fn decode_batch<C>(con: &mut C, group: &str, entries: Vec<StreamId>) -> Vec<PendingEvent>
where
    C: ConnectionLike + Send,
{
    let mut batch = Vec::with_capacity(entries.len());

    for entry in entries {
        match RawEvent::decode(&string_fields(&entry)) {
            Ok(event) => batch.push(PendingEvent {
                entry_id: entry.id,
                event,
            }),
            Err(e) => {
                warn!("Discarding malformed entry {}: {}", entry.id, e);

                if let Err(e) = con
                    .xack::<_, _, _, ()>(keys::EVENT_STREAM, group, &[&entry.id])
                    .await
                {
                    warn!("Failed to acknowledge malformed entry {}: {}", entry.id, e);
                }
            }
        }
    }

    batch
}

fn string_fields(entry: &StreamId) -> HashMap<String, String> {
    entry
        .map
        .keys()
        .filter_map(|field| {
            entry
                .get::<String>(field)
                .map(|value| (field.clone(), value))
        })
        .collect()
}
