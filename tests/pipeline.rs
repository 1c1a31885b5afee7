use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use http::header::RETRY_AFTER;
use http::{HeaderValue, StatusCode};
use riven::consts::Tier;
use serde_json::json;

use rankharvest::api::HarvestApi;
use rankharvest::artifact::{Artifact, DateLabel, Layout};
use rankharvest::client::{RateLimitedClient, RawResponse};
use rankharvest::config::Config;
use rankharvest::records::{MatchIdRecord, Summoner};
use rankharvest::runner::PipelineRunner;
use rankharvest::stages::{fetch_rows, PuuidCache};
use rankharvest::storage::{BlobStore, LocalBlobStore};
use rankharvest::testing::{
    json_ok, league_entry, match_json, not_found, participant, summoner_json, team, FakeTransport,
};
use rankharvest::warehouse::LocalWarehouse;

const POSITIONS: [&str; 5] = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];

fn champion_list() -> String {
    let data = (1..=10)
        .map(|id| (format!("Champ{}", id), json!({ "key": id.to_string() })))
        .collect::<serde_json::Map<_, _>>();
    json!({ "data": data }).to_string()
}

fn league_page(url: &str) -> String {
    if !url.contains("/DIAMOND/I?") {
        return "[]".to_owned();
    }
    let entries = ["alpha", "bravo", "ghost"]
        .iter()
        .map(|name| {
            let mut entry = league_entry(name, "DIAMOND", "I");
            entry["miniSeries"] = json!({"losses": 0, "progress": "WN", "target": 3, "wins": 1});
            entry
        })
        .collect::<Vec<_>>();
    serde_json::Value::Array(entries).to_string()
}

fn match_detail(match_id: &str) -> String {
    let participants = (0..10)
        .map(|i| {
            let team_id = if i < 5 { 100 } else { 200 };
            let mut player = participant(team_id, i as i32 + 1, POSITIONS[i % 5]);
            player["assists"] = json!(i);
            player["deaths"] = json!(1);
            player["kills"] = json!(2);
            player
        })
        .collect::<Vec<_>>();
    let teams = vec![team(100, false, 1, &[-1]), team(200, true, 1, &[-1])];
    match_json(match_id, 1_715_774_400_000, participants, teams).to_string()
}

/// Routes each endpoint to canned data. The first champion list request is throttled.
fn riot(throttled: Arc<AtomicUsize>) -> impl Fn(&str) -> RawResponse + Send + Sync {
    move |url| {
        if url.contains("champion.json") {
            if 0 == throttled.fetch_add(1, Ordering::SeqCst) {
                return RawResponse::new(StatusCode::TOO_MANY_REQUESTS, "")
                    .with_header(RETRY_AFTER, HeaderValue::from_static("3"));
            }
            return json_ok(champion_list());
        }
        if url.contains("/lol/league/v4/entries/") {
            return json_ok(league_page(url));
        }
        if let Some(name) = url.split("/by-name/").nth(1) {
            return match name {
                "ghost" => not_found(),
                name => json_ok(summoner_json(&format!("puuid-{}", name))),
            };
        }
        if url.contains("/by-puuid/puuid-alpha/") {
            return json_ok(r#"["EUW1_1", "EUW1_2"]"#);
        }
        if url.contains("/by-puuid/puuid-bravo/") {
            return json_ok(r#"["EUW1_2"]"#);
        }
        match url.rsplit('/').next() {
            Some(id) if id.starts_with("EUW1_") => json_ok(match_detail(id)),
            _ => RawResponse::new(StatusCode::NOT_FOUND, "unrouted"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_owned();
    let config = Config::from_lookup(move |name| {
        let path = |sub: &str| Some(root.join(sub).to_string_lossy().into_owned());
        match name {
            "RIOT_TOKEN" => Some("RGAPI-test".to_owned()),
            "RIOT_PLATFORM_URL" => Some("http://platform.test".to_owned()),
            "RIOT_REGIONAL_URL" => Some("http://regional.test".to_owned()),
            "DDRAGON_CHAMPIONS_URL" => Some("http://ddragon.test/champion.json".to_owned()),
            "SUMMONERS_SIZE" => Some("5".to_owned()),
            "STORAGE_ROOT" => path("bucket"),
            "WORK_DIR" => path("work"),
            "WAREHOUSE_ROOT" => path("warehouse"),
            _ => None,
        }
    })
    .unwrap();

    let throttled = Arc::new(AtomicUsize::new(0));
    let transport = FakeTransport::new(riot(Arc::clone(&throttled)));
    let calls = transport.calls();
    let api = HarvestApi::new(
        RateLimitedClient::new(transport),
        &config.platform_url,
        &config.regional_url,
        &config.riot_token,
    )
    .unwrap();
    let store = LocalBlobStore::new(&config.storage.root);
    let warehouse = LocalWarehouse::new(&config.warehouse.root);
    let runner = PipelineRunner {
        api: &api,
        store: &store,
        warehouse: &warehouse,
        config: &config,
    };

    let date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
    let start = tokio::time::Instant::now();
    let report = runner.run(date).await.unwrap();
    assert!(Duration::from_secs(3) <= start.elapsed());
    assert_eq!(2, throttled.load(Ordering::SeqCst));

    assert_eq!("20240515", report.label);
    assert_eq!(10, report.champions);
    assert_eq!(24, report.roster.pages);
    assert_eq!(3, report.roster.summoners);
    assert_eq!(2, report.resolve.kept);
    assert_eq!(1, report.resolve.not_found);
    assert_eq!(2, report.match_ids.match_ids);
    assert_eq!(1, report.match_ids.duplicates);
    assert_eq!(2, report.ingest.matches);
    assert_eq!(24, report.ingest.participations);
    assert_eq!((2, 24), report.loaded);
    assert_eq!(
        vec!["prepare", "roster", "resolve", "match_ids", "ingest", "load"],
        report.timings.iter().map(|(stage, _)| *stage).collect::<Vec<_>>()
    );

    let layout = Layout::new(config.storage.clone(), &config.work_dir);
    let label = DateLabel::new(date);
    let resolved: Vec<Summoner> =
        fetch_rows(&store, &layout, Artifact::ResolvedSummoners, &label).unwrap();
    assert_eq!(
        vec![Some("puuid-alpha"), Some("puuid-bravo")],
        resolved.iter().map(|s| s.puuid.as_deref()).collect::<Vec<_>>()
    );
    assert_eq!(Some(3), resolved[0].mini_series.as_ref().map(|m| m.target));

    let ids: Vec<MatchIdRecord> = fetch_rows(&store, &layout, Artifact::MatchIds, &label).unwrap();
    assert!(ids.iter().all(|r| Tier::DIAMOND == r.tier));

    let cache = PuuidCache::load(&store, &layout, &label).unwrap();
    assert_eq!(2, cache.len());
    assert_eq!(None, cache.get("ghost"));

    let matches = store
        .read_string(&layout.blob_name(Artifact::MatchesData, &label))
        .unwrap();
    let mut lines = matches.lines();
    assert!(lines.next().unwrap().starts_with("matchId,tier,gameStartTimestamp"));
    assert_eq!(
        "EUW1_1,DIAMOND,1715774400000,1715776200000,2024-05-15 12:00:00,2024-05-15 12:30:00,1800,11,14.10,\
         false,1,false,1,false,1,false,1,false,1,false,\
         true,1,true,1,true,1,true,1,true,1,true",
        lines.next().unwrap()
    );

    // Second run: the cache answers alpha and bravo, ghost is asked again.
    let before = calls.lock().unwrap().len();
    runner.run(date).await.unwrap();
    let second = calls.lock().unwrap()[before..].to_vec();
    let lookups = second.iter().filter(|url| url.contains("/by-name/")).collect::<Vec<_>>();
    assert_eq!(1, lookups.len());
    assert!(lookups[0].ends_with("/by-name/ghost"));

    let table = std::fs::read_to_string(warehouse.table_path("matches")).unwrap();
    assert_eq!(5, table.lines().count());
}
