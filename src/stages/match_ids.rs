//! Match-id discovery over one UTC day, de-duplicated across the whole run.

use std::collections::HashSet;

use chrono::NaiveDate;

use riven::consts::Tier;

use crate::api::HarvestApi;
use crate::artifact::{day_window, Artifact, DateLabel, Layout};
use crate::error::Result;
use crate::records::{MatchIdRecord, Summoner};
use crate::storage::BlobStore;

use super::{fetch_rows, publish_rows};

/// Insertion-ordered set of match ids. The first offer of an id wins.
#[derive(Debug, Default)]
pub struct MatchIdSet {
    seen: HashSet<String>,
    records: Vec<MatchIdRecord>,
}

impl MatchIdSet {
    /// Record `match_id` under `tier` unless already present. Returns whether it was new.
    pub fn offer(&mut self, tier: Tier, match_id: String) -> bool {
        if !self.seen.insert(match_id.clone()) {
            return false;
        }
        self.records.push(MatchIdRecord { tier, match_id });
        true
    }

    /// Number of distinct ids.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no id was offered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct ids in first-offer order.
    pub fn records(&self) -> &[MatchIdRecord] {
        &self.records
    }
}

/// Counts of a discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchIdReport {
    /// Players queried.
    pub players: usize,
    /// Players whose query failed.
    pub failed: usize,
    /// Ids already seen this run.
    pub duplicates: usize,
    /// Unique ids written.
    pub match_ids: usize,
}

/// Lists each resolved player's matches of the day.
pub struct MatchIdDiscoverer<'a> {
    /// Lists match ids.
    pub api: &'a HarvestApi,
    /// Holds the resolved roster and receives the match id artifact.
    pub store: &'a dyn BlobStore,
    /// Names the artifacts.
    pub layout: &'a Layout,
}

impl MatchIdDiscoverer<'_> {
    /// List the matches every resolved player started on `date` (UTC) and publish the
    /// distinct ids.
    pub async fn run(&self, date: NaiveDate, label: &DateLabel) -> Result<MatchIdReport> {
        let players: Vec<Summoner> =
            fetch_rows(self.store, self.layout, Artifact::ResolvedSummoners, label)?;
        let (start, end) = day_window(date);
        log::info!(
            "Listing matches of {} players between {} and {}.",
            players.len(),
            start,
            end
        );

        let mut report = MatchIdReport {
            players: players.len(),
            ..Default::default()
        };
        let mut ids = MatchIdSet::default();
        for player in players {
            let Some(puuid) = player.puuid.as_deref() else {
                log::warn!("Summoner `{}` has no puuid, skipped.", player.summoner_name);
                report.failed += 1;
                continue;
            };
            match self.api.match_ids(puuid, start, end).await {
                Ok(found) => {
                    for match_id in found {
                        if !ids.offer(player.tier, match_id) {
                            report.duplicates += 1;
                        }
                    }
                }
                Err(e) => {
                    log::error!(
                        "Failed to list matches of `{}` ({}): {}",
                        player.summoner_name,
                        puuid,
                        e
                    );
                    report.failed += 1;
                }
            }
        }
        report.match_ids = ids.len();

        publish_rows(
            self.store,
            self.layout,
            Artifact::MatchIds,
            label,
            &MatchIdRecord::HEADER,
            ids.records(),
        )?;
        Ok(report)
    }
}
