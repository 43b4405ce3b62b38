use anyhow::Result;
use structopt::StructOpt;

use webtally::services::*;

#[derive(Debug, StructOpt)]
#[structopt(about = "Durable web-analytics ingestion and aggregation pipeline.")]
struct MainOptions {
    #[structopt(flatten)]
    shared_options: SharedOptions,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    Ingest(ingest::Options),

    Processor(processor::Options),

    Api(api::Options),
}

#[tokio::main]
async fn main() -> Result<()> {
    let main_options = MainOptions::from_args();
    let shared_options = main_options.shared_options;

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&shared_options.log)
        .init();

    match main_options.cmd {
        Command::Ingest(options) => ingest::run(shared_options, options).await?,
        Command::Processor(options) => processor::run(shared_options, options).await?,
        Command::Api(options) => api::run(shared_options, options).await?,
    }

    Ok(())
}
