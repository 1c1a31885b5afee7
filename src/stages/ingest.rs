//! Match detail retrieval, flattened into the two final datasets.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime};
use itertools::Itertools;
use riven::consts::{Champion, GameMode, Map, Team, Tier};
use riven::models::match_v5::{Info, Match, Participant, Team as MatchTeam};

use crate::api::HarvestApi;
use crate::artifact::{Artifact, DateLabel, Layout};
use crate::error::{Error, Result};
use crate::records::{MatchIdRecord, MatchRecord, ParticipationRecord, SideRecord};
use crate::storage::{self, BlobStore};

use super::{fetch_rows, ChampionLookup};

/// Whether a match is ingested. Only matches that are neither `CLASSIC` nor on the Rift
/// are skipped.
pub fn keep_match(info: &Info) -> bool {
    !(GameMode::CLASSIC != info.game_mode && Map::SUMMONERS_RIFT != info.map_id)
}

/// `12.10.445.5478` → `12.10`.
pub fn truncate_version(version: &str) -> String {
    version.split('.').take(2).join(".")
}

/// Flatten one match into its match row and its pick and ban rows.
pub fn transform_match(
    detail: &Match,
    tier: Tier,
    champions: &ChampionLookup,
) -> Result<(MatchRecord, Vec<ParticipationRecord>)> {
    let match_id = &detail.metadata.match_id;
    let info = &detail.info;
    let malformed = |reason: String| Error::MalformedMatch {
        match_id: match_id.clone(),
        reason,
    };

    let wall_clock = |ms: i64| -> Result<NaiveDateTime> {
        DateTime::from_timestamp(ms.div_euclid(1000), 0)
            .map(|t| t.naive_utc())
            .ok_or_else(|| malformed(format!("timestamp {} out of range", ms)))
    };
    let game_end_timestamp = info
        .game_end_timestamp
        .ok_or_else(|| malformed("no gameEndTimestamp".to_owned()))?;
    let game_start_time = wall_clock(info.game_start_timestamp)?;
    let game_end_time = wall_clock(game_end_timestamp)?;

    if 2 != info.teams.len() {
        return Err(malformed(format!("{} teams", info.teams.len())));
    }
    let team = |team_id: Team| {
        info.teams
            .iter()
            .find(|team| team_id == team.team_id)
            .ok_or_else(|| malformed(format!("no team {:?}", team_id)))
    };
    let blue = team(Team::BLUE)?;
    let red = team(Team::RED)?;

    let record = MatchRecord {
        match_id: match_id.clone(),
        tier,
        game_start_timestamp: info.game_start_timestamp,
        game_end_timestamp,
        game_start_time,
        game_end_time,
        game_duration: info.game_duration,
        map_id: info.map_id,
        game_version: truncate_version(&info.game_version),
        blue: side(blue),
        red: side(red),
    };

    let row = |pick: bool, team_id: Team, win: bool, champion_id: Champion| ParticipationRecord {
        match_id: match_id.clone(),
        game_start_time,
        tier,
        pick,
        ban: !pick,
        win,
        assists: None,
        deaths: None,
        kills: None,
        champion_id,
        champion_name: None,
        opponent: None,
        team_position: None,
        team_id,
        turn: None,
    };

    let mut rows = Vec::with_capacity(info.participants.len() + 10);
    for participant in &info.participants {
        let own = team(participant.team_id)?;
        let opponent = match opponent_of(participant, &info.participants) {
            Some(opponent) => Some(champions.name(opponent.champion_id)?.to_owned()),
            None => None,
        };
        rows.push(ParticipationRecord {
            assists: Some(participant.assists),
            deaths: Some(participant.deaths),
            kills: Some(participant.kills),
            champion_name: Some(champions.name(participant.champion_id)?.to_owned()),
            opponent,
            team_position: Some(participant.team_position.clone()),
            ..row(true, participant.team_id, own.win, participant.champion_id)
        });
    }
    for team in &info.teams {
        for ban in &team.bans {
            let champion_name = match ban.champion_id {
                Champion::NONE => None,
                id => Some(champions.name(id)?.to_owned()),
            };
            rows.push(ParticipationRecord {
                champion_name,
                turn: Some(ban.pick_turn),
                ..row(false, team.team_id, team.win, ban.champion_id)
            });
        }
    }
    Ok((record, rows))
}

fn side(team: &MatchTeam) -> SideRecord {
    let objectives = &team.objectives;
    SideRecord {
        first_baron: objectives.baron.first,
        nb_barons: objectives.baron.kills,
        first_kill: objectives.champion.first,
        nb_kills: objectives.champion.kills,
        first_dragon: objectives.dragon.first,
        nb_dragons: objectives.dragon.kills,
        first_rift_herald: objectives.rift_herald.first,
        nb_rift_heralds: objectives.rift_herald.kills,
        first_tower: objectives.tower.first,
        nb_towers: objectives.tower.kills,
        win: team.win,
    }
}

/// First participant of another team in the same position. Unpositioned players have none.
fn opponent_of<'a>(
    participant: &Participant,
    participants: &'a [Participant],
) -> Option<&'a Participant> {
    if participant.team_position.is_empty() {
        return None;
    }
    participants.iter().find(|other| {
        other.team_id != participant.team_id && other.team_position == participant.team_position
    })
}

/// Counts and outputs of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Match ids read.
    pub match_ids: usize,
    /// Matches skipped by [`keep_match`].
    pub filtered: usize,
    /// Matches that failed to fetch or transform.
    pub failed: usize,
    /// Match rows written.
    pub matches: usize,
    /// Participation rows written.
    pub participations: usize,
    /// Local copy of the match dataset.
    pub matches_path: PathBuf,
    /// Local copy of the participation dataset.
    pub champs_path: PathBuf,
}

/// Fetches every discovered match and writes both datasets for the date.
pub struct MatchIngestor<'a> {
    /// Fetches match details.
    pub api: &'a HarvestApi,
    /// Holds the match ids and the lookup, receives both datasets.
    pub store: &'a dyn BlobStore,
    /// Names the artifacts.
    pub layout: &'a Layout,
}

impl MatchIngestor<'_> {
    /// Fetch, filter, and flatten every discovered match, then write both datasets. A
    /// match that fails is logged and skipped.
    pub async fn run(&self, label: &DateLabel) -> Result<IngestReport> {
        let ids: Vec<MatchIdRecord> = fetch_rows(self.store, self.layout, Artifact::MatchIds, label)?;
        let champions = ChampionLookup::load(self.store, self.layout, label)?;

        let mut report = IngestReport {
            match_ids: ids.len(),
            ..Default::default()
        };
        let mut matches = Vec::new();
        let mut participations = Vec::new();
        for (i, MatchIdRecord { tier, match_id }) in ids.iter().enumerate() {
            if 0 == (i + 1) % 100 {
                log::info!("Processed {} / {} matches.", i + 1, ids.len());
            }
            let detail = match self.api.match_detail(match_id).await {
                Ok(detail) => detail,
                Err(e) => {
                    log::error!("Failed to fetch match `{}`: {}", match_id, e);
                    report.failed += 1;
                    continue;
                }
            };
            if !keep_match(&detail.info) {
                log::debug!(
                    "Skipping match `{}`: mode {} on map {}.",
                    match_id,
                    detail.info.game_mode,
                    detail.info.map_id
                );
                report.filtered += 1;
                continue;
            }
            match transform_match(&detail, *tier, &champions) {
                Ok((record, rows)) => {
                    matches.push(record);
                    participations.extend(rows);
                }
                Err(e) => {
                    log::error!("Failed to transform match `{}`: {}", match_id, e);
                    report.failed += 1;
                }
            }
        }

        report.matches_path = self.layout.local_path(Artifact::MatchesData, label);
        storage::write_csv_records(
            &report.matches_path,
            &MatchRecord::header(),
            matches.iter().map(MatchRecord::fields),
        )?;
        self.store.upload(
            &report.matches_path,
            &self.layout.blob_name(Artifact::MatchesData, label),
        )?;

        report.champs_path = self.layout.local_path(Artifact::ChampsData, label);
        storage::write_csv(
            &report.champs_path,
            &ParticipationRecord::HEADER,
            &participations,
        )?;
        self.store.upload(
            &report.champs_path,
            &self.layout.blob_name(Artifact::ChampsData, label),
        )?;

        report.matches = matches.len();
        report.participations = participations.len();
        log::info!(
            "Ingested {} matches ({} filtered, {} failed), {} champion rows.",
            report.matches,
            report.filtered,
            report.failed,
            report.participations
        );
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::stages::fixture::{api, Fixture};
    use crate::testing::{json_ok, match_json, participant, team, FakeTransport};

    const POSITIONS: [&str; 5] = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];

    fn lookup() -> ChampionLookup {
        (1..=12).map(|id| (id, format!("Champ{}", id))).collect()
    }

    fn player(champion_id: i32, position: &str, team_id: u16) -> serde_json::Value {
        let mut value = participant(team_id, champion_id, position);
        value["assists"] = json!(1);
        value["deaths"] = json!(2);
        value["kills"] = json!(3);
        value
    }

    fn standard_match(match_id: &str) -> serde_json::Value {
        let participants = POSITIONS
            .iter()
            .enumerate()
            .map(|(i, pos)| player(i as i32 + 1, pos, 100))
            .chain(
                POSITIONS
                    .iter()
                    .enumerate()
                    .map(|(i, pos)| player(i as i32 + 6, pos, 200)),
            )
            .collect::<Vec<_>>();
        let teams = vec![team(100, true, 2, &[11, -1]), team(200, false, 2, &[12])];
        match_json(match_id, 1_715_774_400_123, participants, teams)
    }

    /// Match bodies hold borrowed enum strings, so they decode from text.
    fn detail(value: serde_json::Value) -> Match {
        serde_json::from_str(&value.to_string()).unwrap()
    }

    #[test]
    fn test_filter_is_and() {
        let mut info = detail(standard_match("M")).info;
        assert!(keep_match(&info));
        info.game_mode = GameMode::ARAM;
        assert!(keep_match(&info), "non-classic on the rift is kept");
        info.map_id = Map::HOWLING_ABYSS;
        assert!(!keep_match(&info));
        info.game_mode = GameMode::CLASSIC;
        assert!(keep_match(&info));
    }

    #[test]
    fn test_truncate_version() {
        assert_eq!("14.10", truncate_version("14.10.585.9165"));
        assert_eq!("14", truncate_version("14"));
    }

    #[test]
    fn test_win_flags_follow_own_team() {
        let (record, rows) =
            transform_match(&detail(standard_match("EUW1_1")), Tier::GOLD, &lookup()).unwrap();
        assert!(record.blue.win);
        assert!(!record.red.win);
        assert_eq!("14.10", record.game_version);
        assert_eq!("2024-05-15 12:00:00", record.game_start_time.to_string());
        assert_eq!(1_715_776_200_123, record.game_end_timestamp);
        assert_eq!(Map::SUMMONERS_RIFT, record.map_id);
        assert_eq!(2, record.red.nb_towers);
        assert!(!record.red.first_tower);

        let picks = rows.iter().filter(|r| r.pick).collect::<Vec<_>>();
        assert_eq!(10, picks.len());
        for pick in picks {
            assert_eq!(Team::BLUE == pick.team_id, pick.win, "{:?}", pick);
            assert_eq!(Some(3), pick.kills);
        }
        let top = rows.iter().find(|r| Champion::ANNIE == r.champion_id).unwrap();
        assert_eq!(Some("Champ6"), top.opponent.as_deref());
    }

    #[test]
    fn test_bans() {
        let (_, rows) =
            transform_match(&detail(standard_match("EUW1_1")), Tier::GOLD, &lookup()).unwrap();
        let bans = rows.iter().filter(|r| r.ban).collect::<Vec<_>>();
        assert_eq!(3, bans.len());

        let empty = bans.iter().find(|r| Champion::NONE == r.champion_id).unwrap();
        assert_eq!(None, empty.champion_name);
        assert!(!empty.pick);
        assert_eq!(None, empty.kills);
        assert_eq!(Some(2), empty.turn);
        assert!(empty.win);

        let red_ban = bans.iter().find(|r| Champion(12) == r.champion_id).unwrap();
        assert_eq!(Some("Champ12"), red_ban.champion_name.as_deref());
        assert!(!red_ban.win);
        assert_eq!(Team::RED, red_ban.team_id);
    }

    #[test]
    fn test_lopsided_positions_have_no_opponent() {
        let mut value = standard_match("EUW1_1");
        value["info"]["participants"][9] = player(10, "TOP", 100);
        let (_, rows) = transform_match(&detail(value), Tier::GOLD, &lookup()).unwrap();
        let lone_support = rows.iter().find(|r| Champion(5) == r.champion_id).unwrap();
        assert_eq!(None, lone_support.opponent);
        let extra_top = rows.iter().find(|r| Champion(10) == r.champion_id).unwrap();
        assert_eq!(Some("Champ6"), extra_top.opponent.as_deref());
    }

    #[test]
    fn test_unknown_champion_fails_match() {
        let mut value = standard_match("EUW1_1");
        value["info"]["participants"][0]["championId"] = json!(999);
        assert!(matches!(
            transform_match(&detail(value), Tier::GOLD, &lookup()),
            Err(Error::UnknownChampion(999))
        ));
    }

    #[test]
    fn test_missing_side_is_malformed() {
        let mut value = standard_match("EUW1_1");
        value["info"]["teams"][1]["teamId"] = json!(300);
        assert!(matches!(
            transform_match(&detail(value), Tier::GOLD, &lookup()),
            Err(Error::MalformedMatch { .. })
        ));
    }

    #[test]
    fn test_missing_end_timestamp_is_malformed() {
        let mut value = standard_match("EUW1_1");
        if let Some(info) = value["info"].as_object_mut() {
            info.remove("gameEndTimestamp");
        }
        assert!(matches!(
            transform_match(&detail(value), Tier::GOLD, &lookup()),
            Err(Error::MalformedMatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let fx = Fixture::new();
        let ids = [
            MatchIdRecord {
                tier: Tier::GOLD,
                match_id: "EUW1_1".to_owned(),
            },
            MatchIdRecord {
                tier: Tier::IRON,
                match_id: "EUW1_2".to_owned(),
            },
            MatchIdRecord {
                tier: Tier::IRON,
                match_id: "EUW1_3".to_owned(),
            },
        ];
        let local = fx.dir.path().join("seed.csv");
        storage::write_csv(&local, &MatchIdRecord::HEADER, &ids).unwrap();
        fx.store.upload(&local, &fx.blob(Artifact::MatchIds)).unwrap();
        lookup().store(&fx.store, &fx.layout, &fx.label).unwrap();

        let api = api(FakeTransport::new(|url| {
            let id = url.rsplit('/').next().unwrap_or_default();
            let mut value = standard_match(id);
            if "EUW1_2" == id {
                value["info"]["gameMode"] = json!("URF");
                value["info"]["mapId"] = json!(12);
            }
            if "EUW1_3" == id {
                return json_ok("{}");
            }
            json_ok(value.to_string())
        }));
        let ingestor = MatchIngestor {
            api: &api,
            store: &fx.store,
            layout: &fx.layout,
        };

        let first = ingestor.run(&fx.label).await.unwrap();
        assert_eq!(1, first.matches);
        assert_eq!(1, first.filtered);
        assert_eq!(1, first.failed);
        assert_eq!(13, first.participations);
        let matches_once = std::fs::read(&first.matches_path).unwrap();
        let champs_once = std::fs::read(&first.champs_path).unwrap();

        let second = ingestor.run(&fx.label).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(matches_once, std::fs::read(&second.matches_path).unwrap());
        assert_eq!(champs_once, std::fs::read(&second.champs_path).unwrap());
        assert_eq!(
            champs_once,
            fx.store.read_string(&fx.blob(Artifact::ChampsData)).unwrap().into_bytes()
        );

        let text = String::from_utf8(champs_once).unwrap();
        assert_eq!(ParticipationRecord::HEADER.join(","), text.lines().next().unwrap());
        assert_eq!(14, text.lines().count());
    }
}
