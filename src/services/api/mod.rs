//! Reporting service
//!
//! Read-only HTTP access to the daily aggregates.

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
pub use structures::{PathViews, StatsReply};

#[derive(Debug, StructOpt)]
/// Reporting service
///
/// Serves per-site daily statistics from the aggregate store.
pub struct Options {
    /// Port on which the HTTP server will listen
    #[structopt(short, long, default_value = constants::PORT_API)]
    port: u16,

    /// PostgreSQL database server URL
    #[structopt(
        long,
        env = "DATABASE_URL",
        default_value = constants::DEFAULT_DATABASE_URL,
        value_name = "url"
    )]
    database: String,
}

pub async fn run(shared_options: SharedOptions, options: Options) -> Result<()> {
    let (mut heart, _) = Heart::new();

    let context = Context::new(&options.database).await?;
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
