//! Summoner name → puuid resolution, backed by a cache persisted across runs.

use std::collections::BTreeMap;

use crate::api::HarvestApi;
use crate::artifact::{Artifact, DateLabel, Layout};
use crate::error::{Error, Result};
use crate::records::Summoner;
use crate::storage::BlobStore;

use super::{fetch_rows, publish_rows};

/// Name → puuid. Only successful resolutions are ever inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PuuidCache(BTreeMap<String, String>);

impl PuuidCache {
    /// Load the persisted cache, or an empty one if none exists yet.
    pub fn load(store: &dyn BlobStore, layout: &Layout, label: &DateLabel) -> Result<Self> {
        match store.read_string(&layout.blob_name(Artifact::PuuidCache, label)) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(Error::MissingArtifact(name)) => {
                log::info!("No puuid cache at `{}`, starting empty.", name);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the persisted cache with this one.
    pub fn persist(&self, store: &dyn BlobStore, layout: &Layout, label: &DateLabel) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        store.write_string(&layout.blob_name(Artifact::PuuidCache, label), &json)
    }

    /// Cached puuid of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Remember a successful resolution.
    pub fn insert(&mut self, name: String, puuid: String) {
        self.0.insert(name, puuid);
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no name is cached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Counts of a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Roster rows read.
    pub entries: usize,
    /// Answered from the cache.
    pub cache_hits: usize,
    /// Resolved over the network.
    pub resolved: usize,
    /// Unknown names.
    pub not_found: usize,
    /// Lookups that failed.
    pub failed: usize,
    /// Rows written.
    pub kept: usize,
}

/// Adds puuids to the roster, dropping players that cannot be resolved.
pub struct IdentifierResolver<'a> {
    /// Looks up unknown names.
    pub api: &'a HarvestApi,
    /// Holds the roster, the resolved roster, and the cache.
    pub store: &'a dyn BlobStore,
    /// Names the artifacts.
    pub layout: &'a Layout,
}

impl IdentifierResolver<'_> {
    /// Resolve the date's roster and publish the resolved roster. A missing roster is an
    /// error; unresolvable players are dropped.
    pub async fn run(&self, label: &DateLabel) -> Result<ResolveReport> {
        let roster: Vec<Summoner> = fetch_rows(self.store, self.layout, Artifact::Summoners, label)?;
        let mut cache = PuuidCache::load(self.store, self.layout, label)?;
        let mut report = ResolveReport {
            entries: roster.len(),
            ..Default::default()
        };

        let mut resolved = Vec::with_capacity(roster.len());
        for mut summoner in roster {
            summoner.puuid = self.resolve(&summoner.summoner_name, &mut cache, &mut report).await;
            if summoner.puuid.is_some() {
                resolved.push(summoner);
            }
        }
        report.kept = resolved.len();

        publish_rows(
            self.store,
            self.layout,
            Artifact::ResolvedSummoners,
            label,
            &Summoner::HEADER,
            &resolved,
        )?;
        cache.persist(self.store, self.layout, label)?;
        log::info!(
            "Resolved {} of {} summoners ({} cache hits), cache holds {}.",
            report.kept,
            report.entries,
            report.cache_hits,
            cache.len()
        );
        Ok(report)
    }

    async fn resolve(
        &self,
        name: &str,
        cache: &mut PuuidCache,
        report: &mut ResolveReport,
    ) -> Option<String> {
        if let Some(puuid) = cache.get(name) {
            log::debug!("Cache hit for `{}`.", name);
            report.cache_hits += 1;
            return Some(puuid.to_owned());
        }
        match self.api.summoner_by_name(name).await {
            Ok(Some(summoner)) => {
                report.resolved += 1;
                cache.insert(name.to_owned(), summoner.puuid.clone());
                Some(summoner.puuid)
            }
            Ok(None) => {
                log::warn!("Summoner `{}` not found.", name);
                report.not_found += 1;
                None
            }
            Err(e) => {
                log::error!("Failed to resolve summoner `{}`: {}", name, e);
                report.failed += 1;
                None
            }
        }
    }
}
