//! Artifact naming, keyed by the logical date of a run.

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, Utc};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Seconds in the discovery window.
pub const DAY_SECS: i64 = 86_400;

/// Date label used in every artifact name: unpadded year, two-digit month and day.
///
/// `2024-05-15` becomes `20240515`. Years are never padded, so year `999` would give
/// `9990515`; the stage writing an artifact and the stage reading it both go through
/// this type so the names always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateLabel(String);

impl DateLabel {
    /// Label for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self(format!("{}{:02}{:02}", date.year(), date.month(), date.day()))
    }

    /// Label string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a `YYYYMMDD` command line date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Date(s.to_owned()));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| Error::Date(s.to_owned()))
}

/// Yesterday, in UTC.
pub fn yesterday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

/// Midnight-to-midnight UTC span of `date`, as epoch seconds `(start, end)`.
pub fn day_window(date: NaiveDate) -> (i64, i64) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    (start, start + DAY_SECS)
}

/// The artifacts a run reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Sampled roster.
    Summoners,
    /// Roster with puuids, unresolved entries dropped.
    ResolvedSummoners,
    /// De-duplicated `(tier, match_id)` pairs.
    MatchIds,
    /// One row per match.
    MatchesData,
    /// One row per pick or ban.
    ChampsData,
    /// Champion id to name side input.
    ChampsLookup,
    /// Summoner name to puuid side input.
    PuuidCache,
}

/// Which storage prefix an artifact lives under.
enum Prefix {
    Temp,
    Data,
    SideInput,
}

impl Artifact {
    fn prefix(self) -> Prefix {
        match self {
            Self::Summoners | Self::ResolvedSummoners | Self::MatchIds => Prefix::Temp,
            Self::MatchesData | Self::ChampsData => Prefix::Data,
            Self::ChampsLookup | Self::PuuidCache => Prefix::SideInput,
        }
    }

    /// File name, without storage prefix.
    pub fn file_name(self, label: &DateLabel) -> String {
        match self {
            Self::Summoners => format!("summoners_{}.csv", label),
            Self::ResolvedSummoners => format!("summoners_puuid_{}.csv", label),
            Self::MatchIds => format!("matches_id_{}.csv", label),
            Self::MatchesData => format!("matches_data_{}.csv", label),
            Self::ChampsData => format!("champs_data_{}.csv", label),
            Self::ChampsLookup => "champs_lookup.json".to_owned(),
            Self::PuuidCache => "puuid_cache.json".to_owned(),
        }
    }
}

/// Resolves artifacts to blob names and local staging paths.
#[derive(Debug, Clone)]
pub struct Layout {
    storage: StorageConfig,
    work_dir: PathBuf,
}

impl Layout {
    /// New layout.
    pub fn new(storage: StorageConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            work_dir: work_dir.into(),
        }
    }

    /// Name of the artifact blob in object storage.
    pub fn blob_name(&self, artifact: Artifact, label: &DateLabel) -> String {
        let prefix = match artifact.prefix() {
            Prefix::Temp => &self.storage.temp_prefix,
            Prefix::Data => &self.storage.data_prefix,
            Prefix::SideInput => &self.storage.side_input_prefix,
        };
        format!("{}/{}", prefix, artifact.file_name(label))
    }

    /// Local staging path of the artifact.
    pub fn local_path(&self, artifact: Artifact, label: &DateLabel) -> PathBuf {
        self.work_dir.join(artifact.file_name(label))
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_label_pads_month_and_day() {
        assert_eq!("20240515", DateLabel::new(date(2024, 5, 15)).as_str());
        assert_eq!("20240105", DateLabel::new(date(2024, 1, 5)).as_str());
        assert_eq!("20241231", DateLabel::new(date(2024, 12, 31)).as_str());
    }

    #[test]
    fn test_label_does_not_pad_year() {
        assert_eq!("9990102", DateLabel::new(date(999, 1, 2)).as_str());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(date(2024, 5, 15), parse_date("20240515").unwrap());
        assert!(parse_date("2024515").is_err());
        assert!(parse_date("20241315").is_err());
        assert!(parse_date("2024-5-15").is_err());
    }

    #[test]
    fn test_day_window() {
        let (start, end) = day_window(date(2024, 5, 15));
        assert_eq!(1_715_731_200, start);
        assert_eq!(start + DAY_SECS, end);
    }

    #[test]
    fn test_blob_names() {
        let layout = Layout::new(
            StorageConfig {
                root: "bucket".into(),
                temp_prefix: "tmp".to_owned(),
                data_prefix: "data".to_owned(),
                side_input_prefix: "side".to_owned(),
            },
            "work",
        );
        let label = DateLabel::new(date(2024, 5, 15));
        assert_eq!(
            "tmp/summoners_20240515.csv",
            layout.blob_name(Artifact::Summoners, &label)
        );
        assert_eq!(
            "data/champs_data_20240515.csv",
            layout.blob_name(Artifact::ChampsData, &label)
        );
        assert_eq!(
            "side/puuid_cache.json",
            layout.blob_name(Artifact::PuuidCache, &label)
        );
        assert_eq!(
            Path::new("work/matches_id_20240515.csv"),
            layout.local_path(Artifact::MatchIds, &label)
        );
    }
}
