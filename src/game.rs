//! Game records as served by the Chess.com published-data API.
//!
//! Only the fields the opening report needs are modelled; everything else in
//! the archive JSON is ignored.

use regex::Regex;
use serde::Deserialize;

/// One side of a game.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Player {
    /// Account name, in whatever casing the server returned
    #[serde(default)]
    pub username: Option<String>,
}

/// A single game from a monthly archive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub white: Player,
    #[serde(default)]
    pub black: Player,
    /// Full PGN, including the tag section
    #[serde(default)]
    pub pgn: String,
    /// Opening page URL, e.g. `https://www.chess.com/openings/Sicilian-Defense`
    #[serde(default)]
    pub eco_url: Option<String>,
    /// Raw opening code or URL
    #[serde(default)]
    pub eco: Option<String>,
    #[serde(default)]
    pub time_class: Option<String>,
    /// "chess" for standard games, otherwise the variant name
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub rated: Option<bool>,
    /// Game page, used to identify a record in log messages
    #[serde(default)]
    pub url: Option<String>,
}

impl GameRecord {
    /// The player on `side`.
    pub fn player(&self, side: Side) -> &Player {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    /// Value of the first `[Name "value"]` tag line in the PGN.
    pub fn pgn_tag(&self, name: &str) -> Option<&str> {
        pgn_tag(&self.pgn, name)
    }
}

/// Colour a player had in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "white" | "w" => Ok(Side::White),
            "black" | "b" => Ok(Side::Black),
            other => Err(anyhow::anyhow!("Unknown side '{}' (expected white or black)", other)),
        }
    }
}

/// Find a tag line such as `[Result "1-0"]` and return its quoted value.
///
/// Only lines that start with the tag are considered, so a tag name that
/// happens to appear inside a comment in the movetext is not picked up.
pub fn pgn_tag<'a>(pgn: &'a str, name: &str) -> Option<&'a str> {
    lazy_static::lazy_static! {
        static ref TAG_LINE: Regex = Regex::new(r#"(?m)^\s*\[(\w+)\s+"([^"]*)"\]"#).unwrap();
    }

    TAG_LINE
        .captures_iter(pgn)
        .find(|cap| &cap[1] == name)
        .and_then(|cap| cap.get(2))
        .map(|m| m.as_str())
}
