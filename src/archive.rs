//! Chess.com archive listing and game download.
//!
//! Both calls are best-effort: any transport, status or decode failure is
//! logged and turned into an empty result so one bad month (or an unknown
//! account) never stops the run.

use crate::game::GameRecord;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::time::Duration;

/// Root of the published-data API.
pub const DEFAULT_BASE_URL: &str = "https://api.chess.com/pub";

/// Identifying header sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("opening-stats/", env!("CARGO_PKG_VERSION"));

/// Anything that can list a player's archives and return the games in one.
pub trait GameSource {
    /// Archive endpoints for `username`, oldest first as served.
    fn archives(&self, username: &str) -> Vec<String>;

    /// Games in one archive.
    fn games(&self, archive: &str) -> Vec<GameRecord>;
}

#[derive(Debug, Deserialize)]
struct ArchiveList {
    #[serde(default)]
    archives: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GamesPage {
    #[serde(default)]
    games: Vec<serde_json::Value>,
}

/// Blocking client for the Chess.com published-data API.
pub struct ChessComClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ChessComClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn archives_url(&self, username: &str) -> String {
        format!(
            "{}/player/{}/games/archives",
            self.base_url,
            username.trim().to_lowercase()
        )
    }

    /// List monthly archive URLs for `username`. Empty on any failure.
    pub fn fetch_archives(&self, username: &str) -> Vec<String> {
        match self.try_fetch_archives(username) {
            Ok(archives) => archives,
            Err(e) => {
                log::warn!("Error fetching archives for '{}': {:#}", username, e);
                Vec::new()
            }
        }
    }

    fn try_fetch_archives(&self, username: &str) -> Result<Vec<String>> {
        let url = self.archives_url(username);
        let list: ArchiveList = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?
            .json()
            .context("Archive list is not valid JSON")?;
        Ok(list.archives)
    }

    /// Fetch the games in one archive. Empty on any failure; individual
    /// records that fail to decode are skipped.
    pub fn fetch_games(&self, archive_url: &str) -> Vec<GameRecord> {
        match self.try_fetch_games(archive_url) {
            Ok(games) => games,
            Err(e) => {
                log::warn!("Error fetching games from {}: {:#}", archive_url, e);
                Vec::new()
            }
        }
    }

    fn try_fetch_games(&self, archive_url: &str) -> Result<Vec<GameRecord>> {
        let page: GamesPage = self
            .client
            .get(archive_url)
            .send()
            .with_context(|| format!("Request to {} failed", archive_url))?
            .error_for_status()?
            .json()
            .context("Game list is not valid JSON")?;
        Ok(decode_games(page.games, archive_url))
    }
}

impl GameSource for ChessComClient {
    fn archives(&self, username: &str) -> Vec<String> {
        self.fetch_archives(username)
    }

    fn games(&self, archive: &str) -> Vec<GameRecord> {
        self.fetch_games(archive)
    }
}

/// Decode each raw game on its own so one malformed record only costs
/// that record.
pub fn decode_games(raw: Vec<serde_json::Value>, archive_url: &str) -> Vec<GameRecord> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<GameRecord>(value) {
            Ok(game) => Some(game),
            Err(e) => {
                log::warn!("{}: game {} skipped: {}", archive_url, idx + 1, e);
                None
            }
        })
        .collect()
}

// ─── Month ranges ────────────────────────────────────────────────────────────

/// Calendar month of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
}

impl ArchiveMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    /// Month from an archive URL ending in `.../games/YYYY/MM`.
    pub fn from_url(url: &str) -> Option<Self> {
        let mut parts = url.trim().trim_end_matches('/').rsplit('/');
        let month: u32 = parts.next()?.parse().ok()?;
        let year: i32 = parts.next()?.parse().ok()?;
        Self::new(year, month)
    }
}

impl std::str::FromStr for ArchiveMonth {
    type Err = anyhow::Error;

    /// Parses `YYYY-MM` (also accepts `YYYY/MM`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = format!("{}-01", s.trim().replace('/', "-"));
        let date = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
            .with_context(|| format!("Invalid month '{}' (expected YYYY-MM)", s))?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }
}

impl std::fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of months; open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthRange {
    pub since: Option<ArchiveMonth>,
    pub until: Option<ArchiveMonth>,
}

impl MonthRange {
    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    pub fn contains(&self, month: ArchiveMonth) -> bool {
        self.since.is_none_or(|s| month >= s) && self.until.is_none_or(|u| month <= u)
    }
}

/// Keep the archives whose month falls inside `range`.
///
/// With an unbounded range every archive is kept, dated or not. Otherwise an
/// archive whose URL carries no month is dropped with a warning.
pub fn filter_archives(archives: Vec<String>, range: &MonthRange) -> Vec<String> {
    if range.is_unbounded() {
        return archives;
    }
    archives
        .into_iter()
        .filter(|url| match ArchiveMonth::from_url(url) {
            Some(month) => range.contains(month),
            None => {
                log::warn!("Archive URL has no month, skipping: {}", url);
                false
            }
        })
        .collect()
}
