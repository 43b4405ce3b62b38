use crate::libraries::helpers::keys;
use crate::libraries::storage::{database, AggregateStore, RawEvent};
use log::{debug, warn};
use redis::aio::ConnectionLike;
use redis::AsyncCommands;
use sqlx::Error as SQLError;

/// A decoded queue entry awaiting aggregation, identified by the stream
/// entry id it is acknowledged under
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub entry_id: String,
    pub event: RawEvent,
}

/// Folds raw events into the daily aggregates
///
/// Events are processed one at a time, each inside its own transaction. This
/// is a deliberate policy choice over a batch transaction: a failure on one
/// event keeps the committed-and-acknowledged prefix of its batch instead of
/// rolling everything back for redelivery.
pub struct Aggregator {
    store: AggregateStore,
}

impl Aggregator {
    pub fn new(store: AggregateStore) -> Self {
        Self { store }
    }

    /// Applies a batch and acknowledges every event that committed
    ///
    /// A failure aborts the remainder of the batch, leaving the failing
    /// entry and everything after it pending for redelivery.
    pub async fn process_batch<C>(
        &self,
        queue: &mut C,
        group: &str,
        batch: Vec<PendingEvent>,
    ) -> Result<(), SQLError>
    where
        C: ConnectionLike + Send,
    {
        for PendingEvent { entry_id, event } in batch {
            self.apply(&event).await?;

            // The commit above is the durability boundary. A failed
            // acknowledgment only risks a harmless redelivery later.
            if let Err(e) = queue
                .xack::<_, _, _, ()>(keys::EVENT_STREAM, group, &[&entry_id])
                .await
            {
                warn!("Failed to acknowledge entry {}: {}", entry_id, e);
            }
        }

        Ok(())
    }

    /// Applies a single event inside one transaction
    ///
    /// The dedup ledger insert and the unique counter update commit together,
    /// the ledger's affected-row count gates the counter so two events for
    /// the same new user can never double-increment it.
    pub async fn apply(&self, event: &RawEvent) -> Result<(), SQLError> {
        let mut tx = self.store.pool().begin().await?;
        let date = event.date();

        database::insert_event(&mut tx, event).await?;

        let unique_inserted = match event.user_id.as_deref() {
            Some(user_id) => {
                database::record_unique_user(&mut tx, &event.site_id, date, user_id).await?
            }
            None => false,
        };

        database::upsert_daily_stats(&mut tx, &event.site_id, date, unique_inserted).await?;
        database::upsert_path_views(&mut tx, &event.site_id, date, &event.path).await?;

        tx.commit().await?;

        debug!(
            "Aggregated {} event for site {} ({})",
            event.event_type, event.site_id, date
        );

        Ok(())
    }
}
