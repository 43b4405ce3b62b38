//! Event processing service
//!
//! Consumes batches from the event stream through a consumer group and folds
//! them into the per-site daily aggregates, one event and one transaction at
//! a time.

use super::SharedOptions;
use crate::libraries::helpers::constants;
use crate::libraries::lifecycle::Heart;
use anyhow::Result;
use jatsl::{schedule, JobScheduler, StatusServer};
use log::info;
use structopt::StructOpt;
use uuid::Uuid;

mod aggregator;
mod context;
mod jobs;

pub use aggregator::{Aggregator, PendingEvent};
pub use context::ConsumerConfig;
use context::Context;
pub use jobs::ensure_group;
use jobs::EventConsumerJob;

#[derive(Debug, StructOpt)]
/// Event processing service
///
/// Turns the raw event stream into consistent daily counters.
pub struct Options {
    /// PostgreSQL database server URL
    #[structopt(
        long,
        env = "DATABASE_URL",
        default_value = constants::DEFAULT_DATABASE_URL,
        value_name = "url"
    )]
    database: String,

    /// Consumer group shared by all processor instances
    #[structopt(long, env, default_value = "analytics_group")]
    group: String,

    /// Consumer identity within the group, unique per instance
    ///
    /// Defaults to a generated identity. Set it explicitly so a restarted
    /// instance picks up the entries that were pending for its predecessor.
    #[structopt(long, env)]
    consumer: Option<String>,

    /// Maximum number of entries to request per poll
    #[structopt(long, env, default_value = "20")]
    batch_size: usize,

    /// Milliseconds a poll blocks waiting for new entries
    #[structopt(long, env, default_value = "2000")]
    poll_timeout: usize,
}

pub async fn run(shared_options: SharedOptions, options: Options) -> Result<()> {
    let (mut heart, _) = Heart::new();

    let consumer = options
        .consumer
        .clone()
        .unwrap_or_else(|| format!("processor-{}", Uuid::new_v4()));

    let config = ConsumerConfig {
        group: options.group.clone(),
        consumer,
        batch_size: options.batch_size,
        poll_timeout: options.poll_timeout,
    };

    let context = Context::new(shared_options.redis, &options.database, config).await?;
    let scheduler = JobScheduler::default();

    let status_job = StatusServer::new(&scheduler, shared_options.status_server);
    let consumer_job = EventConsumerJob::new();

    schedule!(scheduler, context, {
        status_job,
        consumer_job
    });

    let death_reason = heart.death().await;
    info!("Heart died: {}", death_reason);

    scheduler.terminate_jobs().await;

    Ok(())
}
