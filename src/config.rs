//! Run configuration, read from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use riven::consts::PlatformRoute;
use secrecy::SecretString;

use crate::error::{Error, Result};

/// Data Dragon champion list used to build the champion lookup.
pub const DEFAULT_DDRAGON_CHAMPIONS_URL: &str =
    "http://ddragon.leagueoflegends.com/cdn/12.10.1/data/en_US/champion.json";

/// Everything a pipeline run needs besides the date.
#[derive(Debug)]
pub struct Config {
    /// API key, sent as `X-Riot-Token`.
    pub riot_token: SecretString,
    /// Platform hosting league and summoner endpoints.
    pub platform: PlatformRoute,
    /// Base URL for platform endpoints.
    pub platform_url: String,
    /// Base URL for match endpoints.
    pub regional_url: String,
    /// Roster entries kept per (tier, division, queue) page.
    pub summoners_size: usize,
    /// Object storage settings.
    pub storage: StorageConfig,
    /// Local staging directory for artifacts.
    pub work_dir: PathBuf,
    /// Warehouse settings.
    pub warehouse: WarehouseConfig,
    /// Data Dragon `champion.json` URL.
    pub ddragon_champions_url: String,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

/// Where artifacts live in object storage.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket root (a directory for [`crate::storage::LocalBlobStore`]).
    pub root: PathBuf,
    /// Prefix for intermediate stage artifacts.
    pub temp_prefix: String,
    /// Prefix for the two final datasets.
    pub data_prefix: String,
    /// Prefix for side inputs (champion lookup, puuid cache).
    pub side_input_prefix: String,
}

/// Warehouse target tables.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for [`crate::warehouse::LocalWarehouse`].
    pub root: PathBuf,
    /// Table receiving [`crate::records::MatchRecord`] rows.
    pub matches_table: String,
    /// Table receiving [`crate::records::ParticipationRecord`] rows.
    pub champions_table: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let envvar = |name: &str, default: &str| -> String {
            lookup(name).unwrap_or_else(|| default.to_owned())
        };

        let riot_token = secret(&lookup, "RIOT_TOKEN")?;
        let platform: PlatformRoute = envvar("RIOT_PLATFORM", "EUW1").parse().map_err(|e| {
            Error::Config(format!("Env var `RIOT_PLATFORM` is not a platform route: {}", e))
        })?;
        let platform_url = lookup("RIOT_PLATFORM_URL").unwrap_or_else(|| {
            format!("https://{}.api.riotgames.com", platform.to_string().to_lowercase())
        });
        let regional_url = lookup("RIOT_REGIONAL_URL").unwrap_or_else(|| {
            format!(
                "https://{}.api.riotgames.com",
                platform.to_regional().to_string().to_lowercase()
            )
        });
        let summoners_size = parse_positive(&lookup, "SUMMONERS_SIZE", 20)?;
        let http_timeout = Duration::from_secs(parse_positive(&lookup, "HTTP_TIMEOUT_SECS", 30)?);

        Ok(Self {
            riot_token,
            platform,
            platform_url,
            regional_url,
            summoners_size: summoners_size as usize,
            storage: StorageConfig {
                root: envvar("STORAGE_ROOT", "bucket").into(),
                temp_prefix: envvar("STORAGE_TEMP_PREFIX", "temp"),
                data_prefix: envvar("STORAGE_DATA_PREFIX", "data"),
                side_input_prefix: envvar("STORAGE_SIDE_INPUT_PREFIX", "side_input"),
            },
            work_dir: envvar("WORK_DIR", "data").into(),
            warehouse: WarehouseConfig {
                root: envvar("WAREHOUSE_ROOT", "warehouse").into(),
                matches_table: envvar("MATCHES_TABLE", "matches"),
                champions_table: envvar("CHAMPIONS_TABLE", "champions"),
            },
            ddragon_champions_url: envvar("DDRAGON_CHAMPIONS_URL", DEFAULT_DDRAGON_CHAMPIONS_URL),
            http_timeout,
        })
    }
}

/// Get a required secret.
fn secret(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<SecretString> {
    lookup(name)
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| Error::Config(format!("Env var `{}` must be set", name)))
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<u64> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(value) if 0 < value => Ok(value),
        _ => Err(Error::Config(format!(
            "Env var `{}` should be a positive integer string, got {:?}",
            name, raw
        ))),
    }
}
