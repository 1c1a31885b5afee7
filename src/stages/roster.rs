//! Roster discovery: a random sample of ranked players per tier and division.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use riven::consts::QueueType;

use crate::api::HarvestApi;
use crate::artifact::{Artifact, DateLabel, Layout};
use crate::error::Result;
use crate::models::RankedEntry;
use crate::records::{Summoner, DIVISIONS, TIERS};
use crate::storage::BlobStore;

use super::publish_rows;

/// Queues harvested.
pub const QUEUES: [QueueType; 1] = [QueueType::RANKED_SOLO_5x5];

/// Only the first page of each league is read.
const PAGE: u32 = 1;

/// Counts of a roster run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterReport {
    /// `(tier, division, queue)` triples fetched successfully.
    pub pages: usize,
    /// Triples that failed and were skipped.
    pub failed: usize,
    /// Entries written.
    pub summoners: usize,
}

/// Uniform sample of up to `size` entries of `page`, without replacement.
pub fn sample_entries<R: Rng + ?Sized>(
    page: Vec<RankedEntry>,
    size: usize,
    rng: &mut R,
) -> Vec<RankedEntry> {
    if page.len() <= size {
        return page;
    }
    page.choose_multiple(rng, size).cloned().collect()
}

/// Fetches and samples league pages into the roster artifact.
pub struct RosterFetcher<'a> {
    /// Reads league pages.
    pub api: &'a HarvestApi,
    /// Receives the roster artifact.
    pub store: &'a dyn BlobStore,
    /// Names the roster artifact.
    pub layout: &'a Layout,
    /// Sample size per triple.
    pub sample_size: usize,
}

impl RosterFetcher<'_> {
    /// Run with an entropy-seeded RNG.
    pub async fn run(&self, label: &DateLabel) -> Result<RosterReport> {
        self.run_with_rng(label, &mut StdRng::from_entropy()).await
    }

    /// Run with the given RNG.
    pub async fn run_with_rng<R: Rng + Send>(
        &self,
        label: &DateLabel,
        rng: &mut R,
    ) -> Result<RosterReport> {
        let mut report = RosterReport::default();
        let mut roster = Vec::new();

        // Highest tier first.
        for tier in TIERS.into_iter().rev() {
            for division in DIVISIONS {
                for queue in &QUEUES {
                    match self.api.league_entries(queue, tier, division, PAGE).await {
                        Ok(page) => {
                            let fetched = page.len();
                            let sample = sample_entries(page, self.sample_size, rng);
                            log::info!(
                                "{} {} {}: kept {} of {} entries.",
                                queue,
                                tier,
                                division,
                                sample.len(),
                                fetched
                            );
                            roster.extend(
                                sample
                                    .into_iter()
                                    .map(|entry| Summoner::from_entry(entry, tier, division)),
                            );
                            report.pages += 1;
                        }
                        Err(e) => {
                            log::error!("{} {} {}: {}", queue, tier, division, e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        publish_rows(
            self.store,
            self.layout,
            Artifact::Summoners,
            label,
            &Summoner::HEADER,
            &roster,
        )?;
        report.summoners = roster.len();
        Ok(report)
    }
}
