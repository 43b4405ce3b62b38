//! Event ingestion service
//!
//! Validates submitted events and appends them to the durable event stream
//! as quickly as possible.

use super::SharedOptions;
use crate::libraries::helpers::constants;
use crate::libraries::lifecycle::Heart;
use anyhow::Result;
use jatsl::{schedule, JobScheduler, StatusServer};
use log::info;
use structopt::StructOpt;

mod context;
mod jobs;
mod structures;

use context::Context;
use jobs::ServerJob;
pub use structures::EventSubmission;

#[derive(Debug, StructOpt)]
/// Event ingestion service
///
/// Accepts analytics events over HTTP and enqueues them for processing.
pub struct Options {
    /// Port on which the HTTP server will listen
    #[structopt(short, long, default_value = constants::PORT_INGEST)]
    port: u16,
}

pub async fn run(shared_options: SharedOptions, options: Options) -> Result<()> {
    let (mut heart, _) = Heart::new();

    let context = Context::new(shared_options.redis);
    let scheduler = JobScheduler::default();

    let status_job = StatusServer::new(&scheduler, shared_options.status_server);
    let server_job = ServerJob::new(options.port);

    schedule!(scheduler, context, {
        status_job,
        server_job
    });

    let death_reason = heart.death().await;
    info!("Heart died: {}", death_reason);

    scheduler.terminate_jobs().await;

    Ok(())
}
