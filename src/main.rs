use clap::Parser;

use rankharvest::api::HarvestApi;
use rankharvest::artifact::{parse_date, yesterday};
use rankharvest::client::{RateLimitedClient, ReqwestTransport};
use rankharvest::config::Config;
use rankharvest::runner::PipelineRunner;
use rankharvest::storage::LocalBlobStore;
use rankharvest::util;
use rankharvest::warehouse::LocalWarehouse;
use rankharvest::Result;

/// Harvest one day of ranked matches.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Logical date, `YYYYMMDD`. Defaults to yesterday (UTC).
    #[arg(long)]
    date: Option<String>,
}

#[tokio::main]
async fn main() {
    util::init_logging();
    let args = Args::parse();
    if let Err(e) = run(args).await {
        log::error!("Run aborted: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let date = match args.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => yesterday(),
    };
    let config = Config::from_env()?;

    let client = RateLimitedClient::new(ReqwestTransport::new(config.http_timeout)?);
    let api = HarvestApi::new(
        client,
        &config.platform_url,
        &config.regional_url,
        &config.riot_token,
    )?;
    let store = LocalBlobStore::new(&config.storage.root);
    let warehouse = LocalWarehouse::new(&config.warehouse.root);

    let runner = PipelineRunner {
        api: &api,
        store: &store,
        warehouse: &warehouse,
        config: &config,
    };
    let report = runner.run(date).await?;
    for (stage, elapsed) in &report.timings {
        log::info!("{:>10}: {:?}", stage, elapsed);
    }
    log::info!(
        "{}: {} summoners, {} resolved, {} match ids, {} matches, {} champion rows.",
        report.label,
        report.roster.summoners,
        report.resolve.kept,
        report.match_ids.match_ids,
        report.ingest.matches,
        report.ingest.participations
    );
    Ok(())
}
