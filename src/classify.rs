//! Opening and result classification for a single game.
//!
//! A game is reduced to an `(opening name, outcome)` pair, scored from the
//! side being analysed. Games that should not be counted (wrong side,
//! unfinished, no opening information) classify to `None`; records that are
//! structurally broken classify to an error so the caller can log and skip.

use crate::game::{GameRecord, Side};
use anyhow::{Context, Result};

/// Placeholder used when no opening information is present at all.
pub const UNDEFINED_OPENING: &str = "Undefined";

/// Result of a game relative to the analysed side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Which side results are scored from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Perspective {
    /// Only games where `username` played `side`, scored for that side.
    Subject { username: String, side: Side },
    /// Every game, always scored from white's side regardless of who the
    /// account holder was.
    White,
}

impl Perspective {
    pub fn subject(username: &str, side: Side) -> Self {
        Perspective::Subject {
            username: username.trim().to_string(),
            side,
        }
    }

    /// The side outcomes are scored from.
    pub fn scoring_side(&self) -> Side {
        match self {
            Perspective::Subject { side, .. } => *side,
            Perspective::White => Side::White,
        }
    }
}

/// Extra per-game filters applied on top of the perspective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Only count games of this time class (`bullet`, `blitz`, `rapid`, `daily`)
    pub time_class: Option<String>,
    /// Count variant games (chess960, bughouse, ...) as well as standard chess
    pub include_variants: bool,
    /// Skip casual games
    pub rated_only: bool,
}

impl GameFilter {
    fn accepts(&self, game: &GameRecord) -> bool {
        // A record without `rules` is standard chess
        if !self.include_variants && game.rules.as_deref().is_some_and(|r| r != "chess") {
            return false;
        }
        // Likewise, missing `rated` counts as rated
        if self.rated_only && !game.rated.unwrap_or(true) {
            return false;
        }
        match &self.time_class {
            Some(wanted) => game
                .time_class
                .as_deref()
                .is_some_and(|tc| tc.eq_ignore_ascii_case(wanted)),
            None => true,
        }
    }
}

/// A game reduced to what the tally needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedGame {
    pub opening: String,
    pub outcome: Outcome,
}

/// Classify one game.
///
/// Returns `Ok(None)` when the game is filtered out or cannot be scored
/// (no `Result` tag, unfinished, undefined opening) and `Err` when the record
/// is missing data the perspective depends on.
pub fn classify_game(
    game: &GameRecord,
    perspective: &Perspective,
    filter: &GameFilter,
) -> Result<Option<ClassifiedGame>> {
    if let Perspective::Subject { username, side } = perspective {
        let player = game
            .player(*side)
            .username
            .as_deref()
            .with_context(|| format!("Game has no {} username", side))?;
        if !player.eq_ignore_ascii_case(username) {
            return Ok(None);
        }
    }

    if !filter.accepts(game) {
        return Ok(None);
    }

    let opening = normalize_opening_name(raw_opening(game));
    if opening.is_empty() || opening.eq_ignore_ascii_case(UNDEFINED_OPENING) {
        return Ok(None);
    }

    let Some(result) = game.pgn_tag("Result") else {
        return Ok(None);
    };

    Ok(score_result(result, perspective.scoring_side())
        .map(|outcome| ClassifiedGame { opening, outcome }))
}

/// Pick the best available opening description, in order of preference:
/// the `Opening` tag, the `eco_url` field, the `ECOUrl` tag, the `eco` field.
fn raw_opening(game: &GameRecord) -> &str {
    game.pgn_tag("Opening")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| non_empty(game.eco_url.as_deref()))
        .or_else(|| game.pgn_tag("ECOUrl").filter(|s| !s.trim().is_empty()))
        .or_else(|| non_empty(game.eco.as_deref()))
        .unwrap_or(UNDEFINED_OPENING)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// Turn an opening tag, URL or code into a display name / tally key.
///
/// A URL is cut down to its last path segment. `-`, `_`, `:` and `,` count
/// as word separators, apostrophes are dropped, whitespace is collapsed, and
/// the result is capitalized (first letter upper, rest lower). The tag
/// `Sicilian Defense: Najdorf Variation` and the slug
/// `Sicilian-Defense-Najdorf-Variation` give the same key.
pub fn normalize_opening_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    let slug = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    } else {
        trimmed
    };

    let spaced: String = slug
        .chars()
        .filter(|c| !matches!(*c, '\'' | '\u{2019}'))
        .map(|c| if matches!(c, '-' | '_' | ':' | ',') { ' ' } else { c })
        .collect();
    let words: Vec<&str> = spaced.split_whitespace().collect();
    capitalize(&words.join(" "))
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Map a PGN result string to an outcome for `side`.
/// Unfinished (`*`) or unrecognised results give `None`.
pub fn score_result(result: &str, side: Side) -> Option<Outcome> {
    match (result.trim(), side) {
        ("1-0", Side::White) | ("0-1", Side::Black) => Some(Outcome::Win),
        ("0-1", Side::White) | ("1-0", Side::Black) => Some(Outcome::Loss),
        ("1/2-1/2", _) => Some(Outcome::Draw),
        _ => None,
    }
}
