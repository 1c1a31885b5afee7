//! The four API endpoints the pipeline uses, plus the Data Dragon champion list.
//!
//! Bodies decode into [`riven::models`] types. Every call goes through the shared
//! [`RateLimitedClient`] and applies [`UnavailableRetry`] itself.

use http::{HeaderMap, HeaderValue};
use riven::consts::{Division, QueueType, Tier};
use riven::models::match_v5::Match;
use riven::models::summoner_v4::Summoner;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::client::{ApiStatus, RateLimitedClient, RawResponse};
use crate::error::{excerpt, Error, Result};
use crate::models::{ChampionListDto, RankedEntry};
use crate::retry::UnavailableRetry;

/// Max match ids returned by one `by-puuid` request. No further pages are requested.
pub const MATCH_IDS_COUNT: u32 = 100;

/// Typed access to the API endpoints the pipeline reads.
pub struct HarvestApi {
    client: RateLimitedClient,
    platform_url: Url,
    regional_url: Url,
    auth: HeaderMap,
    unavailable: UnavailableRetry,
}

impl HarvestApi {
    /// New API handle. `platform_url` serves league and summoner endpoints,
    /// `regional_url` serves match endpoints.
    pub fn new(
        client: RateLimitedClient,
        platform_url: &str,
        regional_url: &str,
        token: &SecretString,
    ) -> Result<Self> {
        let parse = |name: &str, raw: &str| {
            Url::parse(raw).map_err(|e| Error::Config(format!("Invalid {} URL {:?}: {}", name, raw, e)))
        };
        let mut token = HeaderValue::from_str(token.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid API token: {}", e)))?;
        token.set_sensitive(true);
        let mut auth = HeaderMap::new();
        auth.insert("x-riot-token", token);

        Ok(Self {
            client,
            platform_url: parse("platform", platform_url)?,
            regional_url: parse("regional", regional_url)?,
            auth,
            unavailable: UnavailableRetry::default(),
        })
    }

    /// `GET /lol/league/v4/entries/{queue}/{tier}/{division}?page={page}`
    pub async fn league_entries(
        &self,
        queue: &QueueType,
        tier: Tier,
        division: Division,
        page: u32,
    ) -> Result<Vec<RankedEntry>> {
        let mut url = endpoint(
            &self.platform_url,
            &["lol", "league", "v4", "entries", queue.as_ref(), tier.as_ref(), division.as_ref()],
        );
        url.query_pairs_mut().append_pair("page", &page.to_string());
        let response = self.fetch(&url).await?;
        expect_ok(&url, &response)?;
        decode("league entries", &response)
    }

    /// `GET /lol/summoner/v4/summoners/by-name/{name}`. `None` if the name is unknown.
    pub async fn summoner_by_name(&self, name: &str) -> Result<Option<Summoner>> {
        let url = endpoint(
            &self.platform_url,
            &["lol", "summoner", "v4", "summoners", "by-name", name],
        );
        let response = self.fetch(&url).await?;
        if ApiStatus::NotFound == response.api_status() {
            return Ok(None);
        }
        expect_ok(&url, &response)?;
        decode("summoner", &response).map(Some)
    }

    /// `GET /lol/match/v5/matches/by-puuid/{puuid}/ids`, first [`MATCH_IDS_COUNT`] ids
    /// with `start_time <= game start < end_time` (epoch seconds).
    pub async fn match_ids(&self, puuid: &str, start_time: i64, end_time: i64) -> Result<Vec<String>> {
        let mut url = endpoint(
            &self.regional_url,
            &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
        );
        url.query_pairs_mut()
            .append_pair("startTime", &start_time.to_string())
            .append_pair("endTime", &end_time.to_string())
            .append_pair("start", "0")
            .append_pair("count", &MATCH_IDS_COUNT.to_string());
        let response = self.fetch(&url).await?;
        expect_ok(&url, &response)?;
        decode("match ids", &response)
    }

    /// `GET /lol/match/v5/matches/{match_id}`
    pub async fn match_detail(&self, match_id: &str) -> Result<Match> {
        let url = endpoint(&self.regional_url, &["lol", "match", "v5", "matches", match_id]);
        let response = self.fetch(&url).await?;
        expect_ok(&url, &response)?;
        decode("match", &response)
    }

    /// Data Dragon `champion.json` at `url`. Sent without the API token.
    pub async fn champion_list(&self, url: &str) -> Result<ChampionListDto> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("Invalid champion list URL {:?}: {}", url, e)))?;
        let response = self
            .unavailable
            .get(&self.client, url.as_str(), &HeaderMap::new())
            .await?;
        expect_ok(&url, &response)?;
        decode("champion list", &response)
    }

    async fn fetch(&self, url: &Url) -> Result<RawResponse> {
        log::debug!("GET {}", url);
        self.unavailable.get(&self.client, url.as_str(), &self.auth).await
    }
}

/// `base` with `segments` appended, each percent-encoded.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn expect_ok(url: &Url, response: &RawResponse) -> Result<()> {
    match response.api_status() {
        ApiStatus::Ok => Ok(()),
        _ => Err(Error::Status {
            url: url.to_string(),
            status: response
                .embedded_status()
                .unwrap_or(response.status.as_u16()),
            body: excerpt(&response.body),
        }),
    }
}

fn decode<T: DeserializeOwned>(what: &str, response: &RawResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|source| Error::Decode {
        what: what.to_owned(),
        source,
        body: excerpt(&response.body),
    })
}
