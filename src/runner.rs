//! Runs every stage for one logical date.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::api::HarvestApi;
use crate::artifact::{DateLabel, Layout};
use crate::config::Config;
use crate::error::Result;
use crate::stages::{
    ChampionLookupBuilder, IdentifierResolver, IngestReport, MatchIdDiscoverer, MatchIdReport,
    MatchIngestor, ResolveReport, RosterFetcher, RosterReport,
};
use crate::storage::BlobStore;
use crate::warehouse::Warehouse;

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// `YYYYMMDD` label of the run's artifacts.
    pub label: String,
    /// Champions in the lookup.
    pub champions: usize,
    /// Roster stage counts.
    pub roster: RosterReport,
    /// Resolution stage counts.
    pub resolve: ResolveReport,
    /// Discovery stage counts.
    pub match_ids: MatchIdReport,
    /// Ingestion stage counts and dataset paths.
    pub ingest: IngestReport,
    /// Rows loaded into the matches and champions tables.
    pub loaded: (u64, u64),
    /// Wall-clock time of each stage, in run order.
    pub timings: Vec<(&'static str, Duration)>,
}

/// Wires the API, storage, and warehouse into the stage sequence.
pub struct PipelineRunner<'a> {
    /// Shared by every stage, and with it the rate limit.
    pub api: &'a HarvestApi,
    /// Artifact storage.
    pub store: &'a dyn BlobStore,
    /// Final load target.
    pub warehouse: &'a dyn Warehouse,
    /// Storage layout, sample size, and table names.
    pub config: &'a Config,
}

impl PipelineRunner<'_> {
    /// Run all stages for `date`. The first failing stage aborts the run.
    pub async fn run(&self, date: NaiveDate) -> Result<PipelineReport> {
        let label = DateLabel::new(date);
        let layout = Layout::new(self.config.storage.clone(), &self.config.work_dir);
        let mut report = PipelineReport {
            label: label.to_string(),
            ..Default::default()
        };
        log::info!("Starting run for {} ({}).", date, label);
        let run_start = Instant::now();

        let prepare = ChampionLookupBuilder {
            api: self.api,
            store: self.store,
            layout: &layout,
            url: &self.config.ddragon_champions_url,
        };
        report.champions = timed(&mut report.timings, "prepare", prepare.run(&label)).await?;

        let roster = RosterFetcher {
            api: self.api,
            store: self.store,
            layout: &layout,
            sample_size: self.config.summoners_size,
        };
        report.roster = timed(&mut report.timings, "roster", roster.run(&label)).await?;

        let resolver = IdentifierResolver {
            api: self.api,
            store: self.store,
            layout: &layout,
        };
        report.resolve = timed(&mut report.timings, "resolve", resolver.run(&label)).await?;

        let discoverer = MatchIdDiscoverer {
            api: self.api,
            store: self.store,
            layout: &layout,
        };
        report.match_ids =
            timed(&mut report.timings, "match_ids", discoverer.run(date, &label)).await?;

        let ingestor = MatchIngestor {
            api: self.api,
            store: self.store,
            layout: &layout,
        };
        report.ingest = timed(&mut report.timings, "ingest", ingestor.run(&label)).await?;

        let warehouse = &self.config.warehouse;
        let (matches_path, champs_path) = (&report.ingest.matches_path, &report.ingest.champs_path);
        report.loaded = timed(&mut report.timings, "load", async {
            Ok((
                self.warehouse.load_csv(matches_path, &warehouse.matches_table)?,
                self.warehouse.load_csv(champs_path, &warehouse.champions_table)?,
            ))
        })
        .await?;

        log::info!("Run for {} done in {:?}.", label, run_start.elapsed());
        Ok(report)
    }
}

async fn timed<T>(
    timings: &mut Vec<(&'static str, Duration)>,
    stage: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    match &out {
        Ok(_) => log::info!("Stage `{}` took {:?}.", stage, elapsed),
        Err(e) => log::error!("Stage `{}` failed after {:?}: {}", stage, elapsed, e),
    }
    timings.push((stage, elapsed));
    out
}
