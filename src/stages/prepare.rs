//! Champion id → name lookup, rebuilt from Data Dragon at the start of each run.

use std::collections::BTreeMap;

use riven::consts::Champion;
use serde_with::serde_as;

use crate::api::HarvestApi;
use crate::artifact::{Artifact, DateLabel, Layout};
use crate::error::{Error, Result};
use crate::storage::BlobStore;

/// Champion id → champion key, e.g. `62 → "MonkeyKing"`.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ChampionLookup(
    #[serde_as(as = "BTreeMap<serde_with::DisplayFromStr, _>")] pub BTreeMap<i32, String>,
);

impl ChampionLookup {
    /// Name of `champion`. Unknown ids are an error: the table is rebuilt every run.
    pub fn name(&self, champion: Champion) -> Result<&str> {
        self.0
            .get(&champion.0)
            .map(String::as_str)
            .ok_or(Error::UnknownChampion(champion.0))
    }

    /// Load the side input.
    pub fn load(store: &dyn BlobStore, layout: &Layout, label: &DateLabel) -> Result<Self> {
        let json = store.read_string(&layout.blob_name(Artifact::ChampsLookup, label))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Store the side input, replacing it.
    pub fn store(&self, store: &dyn BlobStore, layout: &Layout, label: &DateLabel) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        store.write_string(&layout.blob_name(Artifact::ChampsLookup, label), &json)
    }
}

impl FromIterator<(i32, String)> for ChampionLookup {
    fn from_iter<I: IntoIterator<Item = (i32, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds [`ChampionLookup`] from Data Dragon and stores it.
pub struct ChampionLookupBuilder<'a> {
    /// Fetches the champion list.
    pub api: &'a HarvestApi,
    /// Receives the lookup.
    pub store: &'a dyn BlobStore,
    /// Names the lookup blob.
    pub layout: &'a Layout,
    /// Data Dragon `champion.json`.
    pub url: &'a str,
}

impl ChampionLookupBuilder<'_> {
    /// Fetch, invert, and store. Returns the number of champions.
    pub async fn run(&self, label: &DateLabel) -> Result<usize> {
        let list = self.api.champion_list(self.url).await?;
        let lookup = list
            .into_id_map()
            .into_iter()
            .map(|(key, name)| {
                key.parse::<i32>()
                    .map(|id| (id, name))
                    .map_err(|_| Error::Config(format!("Non-numeric champion key {:?}", key)))
            })
            .collect::<Result<ChampionLookup>>()?;
        lookup.store(self.store, self.layout, label)?;
        log::info!("Champion lookup has {} champions.", lookup.0.len());
        Ok(lookup.0.len())
    }
}
