//! Scripted transport and response builders for tests. Compiled only for tests or with the
//! `testing` feature.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

use crate::client::{RawResponse, Transport};
use crate::error::Result;

type Handler = Box<dyn Fn(&str) -> RawResponse + Send + Sync>;

/// [`Transport`] answering from a handler function and recording every requested URL.
pub struct FakeTransport {
    handler: Handler,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    /// Answer each request with `handler(url)`.
    pub fn new(handler: impl Fn(&str) -> RawResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Default::default(),
        }
    }

    /// Answer requests with `responses` in order, then with 500s.
    pub fn scripted(responses: impl IntoIterator<Item = RawResponse>) -> Self {
        let queue = Mutex::new(responses.into_iter().collect::<VecDeque<_>>());
        Self::new(move |_url| {
            queue
                .lock()
                .ok()
                .and_then(|mut queue| queue.pop_front())
                .unwrap_or_else(|| RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "script exhausted"))
        })
    }

    /// Shared handle to the URLs requested so far.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl Transport for FakeTransport {
    fn get<'a>(&'a self, url: &'a str, _headers: &'a HeaderMap) -> BoxFuture<'a, Result<RawResponse>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_owned());
        }
        let response = (self.handler)(url);
        futures::future::ready(Ok(response)).boxed()
    }
}

/// `200 OK` with a JSON body.
pub fn json_ok(body: impl Into<String>) -> RawResponse {
    RawResponse::new(StatusCode::OK, body)
}

/// In-band 404 body, as the API sends for unknown summoners.
pub fn not_found() -> RawResponse {
    RawResponse::new(
        StatusCode::NOT_FOUND,
        r#"{"status":{"message":"Data not found","status_code":404}}"#,
    )
}

/// `200 OK` whose body is an in-band 503.
pub fn unavailable() -> RawResponse {
    json_ok(r#"{"status":{"message":"Service unavailable","status_code":503}}"#)
}

/// `summoner-v4` body for `puuid`.
pub fn summoner_json(puuid: &str) -> String {
    json!({
        "puuid": puuid,
        "profileIconId": 4568,
        "revisionDate": 1_715_774_400_000_i64,
        "summonerLevel": 312,
    })
    .to_string()
}

/// `league-v4` entry of a display name on a `tier`/`rank` page.
pub fn league_entry(summoner_name: &str, tier: &str, rank: &str) -> Value {
    json!({
        "leagueId": "f0a1d3c2-league",
        "puuid": format!("entry-puuid-{}", summoner_name),
        "queueType": "RANKED_SOLO_5x5",
        "tier": tier,
        "rank": rank,
        "summonerId": format!("sid-{}", summoner_name),
        "summonerName": summoner_name,
        "leaguePoints": 75,
        "wins": 30,
        "losses": 20,
        "veteran": false,
        "inactive": false,
        "freshBlood": true,
        "hotStreak": false,
    })
}

const PARTICIPANT: &str = include_str!("participant.json");

/// `match-v5` participant with every stat zeroed.
pub fn participant(team_id: u16, champion_id: i32, team_position: &str) -> Value {
    let mut value: Value = serde_json::from_str(PARTICIPANT).unwrap_or_default();
    value["teamId"] = json!(team_id);
    value["championId"] = json!(champion_id);
    value["teamPosition"] = json!(team_position);
    value["individualPosition"] = json!(team_position);
    value["puuid"] = json!(format!("puuid-{}-{}", team_id, champion_id));
    value
}

/// `match-v5` team. Every objective reads `{"first": win, "kills": objective_kills}` and
/// `bans` are champion ids in pick-turn order.
pub fn team(team_id: u16, win: bool, objective_kills: i32, bans: &[i32]) -> Value {
    let objective = json!({ "first": win, "kills": objective_kills });
    json!({
        "teamId": team_id,
        "win": win,
        "objectives": {
            "baron": objective,
            "champion": objective,
            "dragon": objective,
            "inhibitor": objective,
            "riftHerald": objective,
            "tower": objective,
        },
        "bans": bans
            .iter()
            .enumerate()
            .map(|(i, champion_id)| json!({ "championId": champion_id, "pickTurn": i + 1 }))
            .collect::<Vec<_>>(),
    })
}

/// Ranked solo `match-v5` match on Summoner's Rift, lasting 30 minutes from
/// `game_start_timestamp` (epoch milliseconds).
pub fn match_json(
    match_id: &str,
    game_start_timestamp: i64,
    participants: Vec<Value>,
    teams: Vec<Value>,
) -> Value {
    let puuids = participants
        .iter()
        .map(|participant| participant["puuid"].clone())
        .collect::<Vec<_>>();
    let game_id = match_id
        .rsplit('_')
        .next()
        .and_then(|id| id.parse::<i64>().ok())
        .unwrap_or_default();
    json!({
        "metadata": {
            "dataVersion": "2",
            "matchId": match_id,
            "participants": puuids,
        },
        "info": {
            "gameCreation": game_start_timestamp - 60_000,
            "gameDuration": 1800,
            "gameEndTimestamp": game_start_timestamp + 1_800_000,
            "gameId": game_id,
            "gameMode": "CLASSIC",
            "gameName": format!("teambuilder-match-{}", game_id),
            "gameStartTimestamp": game_start_timestamp,
            "gameType": "MATCHED_GAME",
            "gameVersion": "14.10.585.9165",
            "mapId": 11,
            "participants": participants,
            "platformId": "EUW1",
            "queueId": 420,
            "teams": teams,
        },
    })
}

#[cfg(test)]
mod test {
    use riven::models::match_v5::Match;

    use super::*;

    #[test]
    fn test_match_json_decodes() {
        let participants = (0..10)
            .map(|i| participant(if i < 5 { 100 } else { 200 }, i + 1, "TOP"))
            .collect();
        let teams = vec![team(100, true, 1, &[-1]), team(200, false, 0, &[])];
        let text = match_json("EUW1_42", 1_715_774_400_000, participants, teams).to_string();
        let decoded: Match = serde_json::from_str(&text).unwrap();
        assert_eq!(42, decoded.info.game_id);
        assert_eq!(10, decoded.info.participants.len());
        assert_eq!(10, decoded.metadata.participants.len());
    }
}
