//! Per-opening win/loss/draw counters.

use crate::classify::{classify_game, GameFilter, Outcome, Perspective};
use crate::game::GameRecord;
use std::collections::HashMap;

/// Running counters for one opening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcomes {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Outcomes {
    pub fn new(wins: u32, losses: u32, draws: u32) -> Self {
        Self {
            wins,
            losses,
            draws,
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// (wins + draws) / losses, with losses floored at 1.
    pub fn success_ratio(&self) -> f64 {
        (self.wins + self.draws) as f64 / self.losses.max(1) as f64
    }
}

/// Opening name -> outcome counters.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: HashMap<String, Outcomes>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one game, creating the opening's entry on first sight.
    pub fn record(&mut self, opening: &str, outcome: Outcome) {
        self.entries
            .entry(opening.to_string())
            .or_default()
            .record(outcome);
    }

    pub fn get(&self, opening: &str) -> Option<&Outcomes> {
        self.entries.get(opening)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcomes)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Outcomes)> for Tally {
    fn from_iter<I: IntoIterator<Item = (String, Outcomes)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A tally plus bookkeeping about what was left out of it.
#[derive(Debug, Clone, Default)]
pub struct TallySummary {
    pub tally: Tally,
    /// Games that made it into the tally
    pub counted: usize,
    /// Games filtered out or without a usable opening/result
    pub skipped: usize,
    /// Malformed records that could not be classified
    pub failed: usize,
}

/// Classify every game and count the ones that score.
///
/// A record that fails to classify is logged and skipped; it never aborts
/// the batch.
pub fn tally_games(
    games: &[GameRecord],
    perspective: &Perspective,
    filter: &GameFilter,
) -> TallySummary {
    let mut summary = TallySummary::default();

    for (idx, game) in games.iter().enumerate() {
        match classify_game(game, perspective, filter) {
            Ok(Some(classified)) => {
                summary.tally.record(&classified.opening, classified.outcome);
                summary.counted += 1;
            }
            Ok(None) => summary.skipped += 1,
            Err(e) => {
                log::warn!(
                    "Game {} ({}): skipped: {:#}",
                    idx + 1,
                    game.url.as_deref().unwrap_or("no url"),
                    e
                );
                summary.failed += 1;
            }
        }
    }

    log::debug!(
        "Tallied {} games into {} openings ({} skipped, {} failed)",
        summary.counted,
        summary.tally.len(),
        summary.skipped,
        summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Player, Side};

    fn game(white: &str, black: &str, opening: &str, result: Option<&str>) -> GameRecord {
        let mut pgn = format!("[Opening \"{}\"]\n", opening);
        if let Some(r) = result {
            pgn.push_str(&format!("[Result \"{}\"]\n", r));
        }
        GameRecord {
            white: Player {
                username: Some(white.to_string()),
                ..Default::default()
            },
            black: Player {
                username: Some(black.to_string()),
                ..Default::default()
            },
            pgn,
            ..Default::default()
        }
    }

    #[test]
    fn test_success_ratio() {
        assert_eq!(Outcomes::new(2, 1, 0).success_ratio(), 2.0);
        assert_eq!(Outcomes::new(3, 0, 1).success_ratio(), 4.0);
        assert_eq!(Outcomes::new(0, 0, 0).success_ratio(), 0.0);
        assert_eq!(Outcomes::new(1, 4, 1).success_ratio(), 0.5);
    }

    #[test]
    fn test_tally_example() {
        let games = vec![
            game("a", "b", "e4 e5", Some("1-0")),
            game("a", "b", "e4 e5", Some("1-0")),
            game("a", "b", "e4 e5", Some("0-1")),
        ];
        let summary = tally_games(&games, &Perspective::White, &GameFilter::default());
        assert_eq!(summary.tally.len(), 1);
        assert_eq!(summary.tally.get("E4 e5"), Some(&Outcomes::new(2, 1, 0)));
        assert_eq!(summary.counted, 3);
    }

    #[test]
    fn test_games_without_result_not_counted() {
        let games = vec![
            game("a", "b", "French Defense", None),
            game("a", "b", "French Defense", Some("1/2-1/2")),
            game("a", "b", "Caro-Kann", None),
        ];
        let summary = tally_games(&games, &Perspective::White, &GameFilter::default());
        assert_eq!(summary.tally.get("French defense"), Some(&Outcomes::new(0, 0, 1)));
        assert_eq!(summary.tally.get("Caro kann"), None);
        assert_eq!(summary.counted, 1);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_malformed_game_does_not_abort() {
        let mut broken = game("me", "x", "Ruy Lopez", Some("1-0"));
        broken.white.username = None;
        let games = vec![broken, game("me", "x", "Ruy Lopez", Some("1-0"))];
        let summary = tally_games(
            &games,
            &Perspective::subject("me", Side::White),
            &GameFilter::default(),
        );
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.tally.get("Ruy lopez"), Some(&Outcomes::new(1, 0, 0)));
    }

    #[test]
    fn test_split_by_side() {
        let games = vec![
            game("me", "x", "Ruy Lopez", Some("1-0")),
            game("y", "me", "Sicilian Defense", Some("1-0")),
            game("y", "me", "Sicilian Defense", Some("0-1")),
        ];
        let white = tally_games(&games, &Perspective::subject("ME", Side::White), &GameFilter::default());
        let black = tally_games(&games, &Perspective::subject("me", Side::Black), &GameFilter::default());

        assert_eq!(white.tally.len(), 1);
        assert_eq!(white.tally.get("Ruy lopez"), Some(&Outcomes::new(1, 0, 0)));
        assert_eq!(black.tally.get("Sicilian defense"), Some(&Outcomes::new(1, 1, 0)));
    }
}
