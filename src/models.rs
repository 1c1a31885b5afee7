//! Response bodies the pipeline reads. API bodies are [`riven::models`] types; this module
//! adds the shapes riven does not model.

use std::collections::{BTreeMap, HashMap};

use riven::models::league_v4::LeagueEntry;

/// In-band error body, e.g. `{"status":{"message":"Data not found","status_code":404}}`.
#[derive(Debug, serde::Deserialize)]
pub struct StatusEnvelope {
    /// Embedded status.
    pub status: StatusDto,
}

/// See [`StatusEnvelope`].
#[derive(Debug, serde::Deserialize)]
pub struct StatusDto {
    /// HTTP-equivalent status code.
    pub status_code: u16,
}

/// A league page entry: riven's [`LeagueEntry`] plus the display name the page still
/// carries, which riven no longer models.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RankedEntry {
    /// Display name, the key for puuid resolution. Empty if the page omits it.
    #[serde(rename = "summonerName", default)]
    pub summoner_name: String,
    /// Everything else.
    #[serde(flatten)]
    pub entry: LeagueEntry,
}

/// Data Dragon `champion.json`.
#[derive(Debug, serde::Deserialize)]
pub struct ChampionListDto {
    /// Keyed by champion key, e.g. `MonkeyKing`.
    pub data: HashMap<String, ChampionDto>,
}

/// A Data Dragon champion.
#[derive(Debug, serde::Deserialize)]
pub struct ChampionDto {
    /// Numeric id, as a string.
    pub key: String,
}

impl ChampionListDto {
    /// Invert to numeric id string → champion key.
    pub fn into_id_map(self) -> BTreeMap<String, String> {
        self.data
            .into_iter()
            .map(|(name, champion)| (champion.key, name))
            .collect()
    }
}
