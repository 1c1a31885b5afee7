//! Row structs for the CSV artifacts. Column order is the field order.

use chrono::NaiveDateTime;
use riven::consts::{Champion, Division, Map, QueueType, Team, Tier};
use riven::models::league_v4::MiniSeries;
use serde_with::serde_as;

use crate::models::RankedEntry;

/// Harvested tiers, lowest first. Apex tiers and `EMERALD` are not harvested.
pub const TIERS: [Tier; 6] = [
    Tier::IRON,
    Tier::BRONZE,
    Tier::SILVER,
    Tier::GOLD,
    Tier::PLATINUM,
    Tier::DIAMOND,
];

/// Divisions of a tier, `I` first.
pub const DIVISIONS: [Division; 4] = [Division::I, Division::II, Division::III, Division::IV];

/// A ranked player picked from a league page.
///
/// The same row shape is used by the roster artifact (with `puuid` always empty) and the
/// resolved roster artifact (with `puuid` always set).
#[serde_as]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    /// League UUID.
    pub league_id: Option<String>,
    /// E.g. `RANKED_SOLO_5x5`.
    pub queue_type: QueueType,
    /// Tier.
    pub tier: Tier,
    /// Division.
    pub rank: Division,
    /// Encrypted summoner id, if the page still carries it.
    pub summoner_id: Option<String>,
    /// Display name, the key for puuid resolution.
    pub summoner_name: String,
    /// LP.
    pub league_points: i32,
    /// Ranked wins.
    pub wins: i32,
    /// Ranked losses.
    pub losses: i32,
    /// Veteran flag.
    pub veteran: bool,
    /// Inactive flag.
    pub inactive: bool,
    /// Fresh blood flag.
    pub fresh_blood: bool,
    /// Hot streak flag.
    pub hot_streak: bool,
    /// Promotion series, JSON-encoded.
    #[serde_as(as = "Option<serde_with::json::JsonString>")]
    #[serde(default)]
    pub mini_series: Option<MiniSeries>,
    /// Riot PUUID (player universally unique ID).
    #[serde(default)]
    pub puuid: Option<String>,
}

impl Summoner {
    /// CSV columns.
    pub const HEADER: [&'static str; 15] = [
        "leagueId",
        "queueType",
        "tier",
        "rank",
        "summonerId",
        "summonerName",
        "leaguePoints",
        "wins",
        "losses",
        "veteran",
        "inactive",
        "freshBlood",
        "hotStreak",
        "miniSeries",
        "puuid",
    ];

    /// Roster row of an entry read from the `tier`/`division` page. The page's own tier and
    /// division fill in when the entry omits them. `puuid` starts empty.
    pub fn from_entry(ranked: RankedEntry, tier: Tier, division: Division) -> Self {
        let RankedEntry {
            summoner_name,
            entry,
        } = ranked;
        Self {
            league_id: entry.league_id,
            queue_type: entry.queue_type,
            tier: entry.tier.unwrap_or(tier),
            rank: entry.rank.unwrap_or(division),
            summoner_id: entry.summoner_id,
            summoner_name,
            league_points: entry.league_points,
            wins: entry.wins,
            losses: entry.losses,
            veteran: entry.veteran,
            inactive: entry.inactive,
            fresh_blood: entry.fresh_blood,
            hot_streak: entry.hot_streak,
            mini_series: entry.mini_series,
            puuid: None,
        }
    }
}

/// A discovered match id and the tier of the player it was first seen for.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchIdRecord {
    /// Tier of the first contributing player.
    pub tier: Tier,
    /// E.g. `EUW1_6543210987`.
    pub match_id: String,
}

impl MatchIdRecord {
    /// CSV columns.
    pub const HEADER: [&'static str; 2] = ["tier", "match_id"];
}

/// Per-side objective block of a [`MatchRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideRecord {
    /// Took the first baron.
    pub first_baron: bool,
    /// Barons taken.
    pub nb_barons: i32,
    /// Drew first blood.
    pub first_kill: bool,
    /// Champion kills.
    pub nb_kills: i32,
    /// Took the first dragon.
    pub first_dragon: bool,
    /// Dragons taken.
    pub nb_dragons: i32,
    /// Took the first rift herald.
    pub first_rift_herald: bool,
    /// Rift heralds taken.
    pub nb_rift_heralds: i32,
    /// Destroyed the first tower.
    pub first_tower: bool,
    /// Towers destroyed.
    pub nb_towers: i32,
    /// Side won.
    pub win: bool,
}

impl SideRecord {
    const COLUMNS: [&'static str; 11] = [
        "firstBaron",
        "nbBarons",
        "firstKill",
        "nbKills",
        "firstDragon",
        "nbDragons",
        "firstRiftHerald",
        "nbRiftHeralds",
        "firstTower",
        "nbTowers",
        "win",
    ];

    fn fields(&self) -> [String; 11] {
        [
            self.first_baron.to_string(),
            self.nb_barons.to_string(),
            self.first_kill.to_string(),
            self.nb_kills.to_string(),
            self.first_dragon.to_string(),
            self.nb_dragons.to_string(),
            self.first_rift_herald.to_string(),
            self.nb_rift_heralds.to_string(),
            self.first_tower.to_string(),
            self.nb_towers.to_string(),
            self.win.to_string(),
        ]
    }
}

/// One row per match.
///
/// Written with [`MatchRecord::header`] and [`MatchRecord::fields`]; the two sides are
/// flattened into `100_*` and `200_*` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// E.g. `EUW1_6543210987`.
    pub match_id: String,
    /// Tier the match id was discovered under.
    pub tier: Tier,
    /// Epoch milliseconds.
    pub game_start_timestamp: i64,
    /// Epoch milliseconds.
    pub game_end_timestamp: i64,
    /// UTC wall clock, second precision.
    pub game_start_time: NaiveDateTime,
    /// UTC wall clock, second precision.
    pub game_end_time: NaiveDateTime,
    /// Seconds.
    pub game_duration: i64,
    /// Map. Maps other than [`Map::SUMMONERS_RIFT`] only appear for `CLASSIC` games.
    pub map_id: Map,
    /// `major.minor`.
    pub game_version: String,
    /// Team 100.
    pub blue: SideRecord,
    /// Team 200.
    pub red: SideRecord,
}

impl MatchRecord {
    /// CSV header row.
    pub fn header() -> Vec<String> {
        let base = [
            "matchId",
            "tier",
            "gameStartTimestamp",
            "gameEndTimestamp",
            "gameStartTime",
            "gameEndTime",
            "gameDuration",
            "mapId",
            "gameVersion",
        ];
        let sides = ["100", "200"].into_iter().flat_map(|team| {
            SideRecord::COLUMNS
                .iter()
                .map(move |column| format!("{}_{}", team, column))
        });
        base.into_iter().map(str::to_owned).chain(sides).collect()
    }

    /// CSV fields, in [`Self::header`] order.
    pub fn fields(&self) -> Vec<String> {
        let base = [
            self.match_id.clone(),
            self.tier.to_string(),
            self.game_start_timestamp.to_string(),
            self.game_end_timestamp.to_string(),
            self.game_start_time.to_string(),
            self.game_end_time.to_string(),
            self.game_duration.to_string(),
            self.map_id.to_string(),
            self.game_version.clone(),
        ];
        base.into_iter()
            .chain(self.blue.fields())
            .chain(self.red.fields())
            .collect()
    }
}

/// One row per pick or ban. Pick rows carry KDA and opponent, ban rows carry `turn`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    /// Match the row belongs to.
    pub match_id: String,
    /// UTC wall clock of the game start.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub game_start_time: NaiveDateTime,
    /// Tier the match id was discovered under.
    pub tier: Tier,
    /// A played champion.
    pub pick: bool,
    /// A banned champion. Always `!pick`.
    pub ban: bool,
    /// Win flag of the row's own team.
    pub win: bool,
    /// Picks only.
    pub assists: Option<i32>,
    /// Picks only.
    pub deaths: Option<i32>,
    /// Picks only.
    pub kills: Option<i32>,
    /// [`Champion::NONE`] for an empty ban.
    pub champion_id: Champion,
    /// `None` for an empty ban.
    pub champion_name: Option<String>,
    /// Champion name of the positional opponent.
    pub opponent: Option<String>,
    /// Picks only. Empty when the API could not assign one.
    pub team_position: Option<String>,
    /// Side of the picking or banning team.
    pub team_id: Team,
    /// Ban turn, bans only.
    pub turn: Option<i32>,
}

impl ParticipationRecord {
    /// CSV columns.
    pub const HEADER: [&'static str; 15] = [
        "matchId",
        "gameStartTime",
        "tier",
        "pick",
        "ban",
        "win",
        "assists",
        "deaths",
        "kills",
        "championId",
        "championName",
        "opponent",
        "teamPosition",
        "teamId",
        "turn",
    ];
}
