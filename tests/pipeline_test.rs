//! End-to-end pipeline tests against an in-memory game source.
//!
//! Exercises the same code path as the CLI: archive filtering, per-side
//! tallies, ranking and chart/CSV output, without touching the network.

use opening_stats::archive::{ArchiveMonth, GameSource, MonthRange};
use opening_stats::game::{GameRecord, Player};
use opening_stats::pipeline::{run_analysis, AnalysisConfig, PerspectiveMode};
use opening_stats::report::ChartOutcome;
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves canned archives and records which archives were requested.
struct FakeSource {
    archives: Vec<String>,
    games: HashMap<String, Vec<GameRecord>>,
    requested: RefCell<Vec<String>>,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            archives: Vec::new(),
            games: HashMap::new(),
            requested: RefCell::new(Vec::new()),
        }
    }

    fn with_month(mut self, month: &str, games: Vec<GameRecord>) -> Self {
        let url = format!("https://api.chess.com/pub/player/me/games/{}", month);
        self.archives.push(url.clone());
        self.games.insert(url, games);
        self
    }
}

impl GameSource for FakeSource {
    fn archives(&self, _username: &str) -> Vec<String> {
        self.archives.clone()
    }

    fn games(&self, archive: &str) -> Vec<GameRecord> {
        self.requested.borrow_mut().push(archive.to_string());
        self.games.get(archive).cloned().unwrap_or_default()
    }
}

fn game(white: &str, black: &str, eco_url: &str, result: Option<&str>) -> GameRecord {
    let pgn = match result {
        Some(r) => format!("[White \"{}\"]\n[Black \"{}\"]\n[Result \"{}\"]\n\n1. e4 e5", white, black, r),
        None => format!("[White \"{}\"]\n[Black \"{}\"]\n\n1. e4 e5", white, black),
    };
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
        eco_url: Some(format!("https://www.chess.com/openings/{}", eco_url)),
        time_class: Some("blitz".to_string()),
        ..Default::default()
    }
}

fn config_in(dir: &std::path::Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::new("Me");
    config.output_dir = dir.to_path_buf();
    config
}

#[test]
fn test_two_charts_for_subject() {
    let source = FakeSource::new()
        .with_month(
            "2024/01",
            vec![
                game("me", "x", "Italian-Game", Some("1-0")),
                game("me", "y", "Italian-Game", Some("0-1")),
                game("x", "ME", "Sicilian-Defense", Some("0-1")),
            ],
        )
        .with_month(
            "2024/02",
            vec![
                game("me", "z", "italian_game", Some("1/2-1/2")),
                game("y", "me", "Sicilian-Defense", None),
            ],
        );

    let dir = tempfile::tempdir().unwrap();
    let summary = run_analysis(&source, &config_in(dir.path()), None).unwrap();

    assert_eq!(summary.archives, 2);
    assert_eq!(summary.games, 5);
    assert_eq!(summary.reports.len(), 2);

    let white = &summary.reports[0];
    assert_eq!(white.ranked.len(), 1);
    assert_eq!(white.ranked[0].opening, "Italian game");
    assert_eq!(white.ranked[0].total_games, 3);
    assert_eq!(white.ranked[0].success_ratio, 2.0);
    assert_eq!(
        white.chart,
        ChartOutcome::Written(dir.path().join("as_white.png"))
    );

    // The black game without a result tag is not counted
    let black = &summary.reports[1];
    assert_eq!(black.counted, 1);
    assert_eq!(black.ranked[0].opening, "Sicilian defense");
    assert_eq!(black.ranked[0].win_pct, 100.0);

    assert!(dir.path().join("as_white.png").exists());
    assert!(dir.path().join("as_black.png").exists());
}

#[test]
fn test_no_archives_writes_nothing() {
    let source = FakeSource::new();
    let dir = tempfile::tempdir().unwrap();
    let summary = run_analysis(&source, &config_in(dir.path()), None).unwrap();

    assert_eq!(summary.games, 0);
    for report in &summary.reports {
        assert_eq!(report.chart, ChartOutcome::NoData);
        assert!(report.ranked.is_empty());
    }
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_empty_archives_writes_nothing() {
    let source = FakeSource::new()
        .with_month("2024/01", Vec::new())
        .with_month("2024/02", Vec::new());
    let dir = tempfile::tempdir().unwrap();
    let summary = run_analysis(&source, &config_in(dir.path()), None).unwrap();

    assert_eq!(summary.archives, 2);
    assert!(summary
        .reports
        .iter()
        .all(|r| r.chart == ChartOutcome::NoData));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_white_perspective_scores_every_game_for_white() {
    let source = FakeSource::new().with_month(
        "2024/01",
        vec![
            game("me", "x", "Ruy-Lopez", Some("1-0")),
            game("x", "me", "Ruy-Lopez", Some("1-0")),
        ],
    );
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.mode = PerspectiveMode::White;

    let summary = run_analysis(&source, &config, None).unwrap();
    assert_eq!(summary.reports.len(), 1);
    let report = &summary.reports[0];
    // "me" lost the second game, but from white's side both are wins
    assert_eq!(report.ranked[0].win_pct, 100.0);
    assert_eq!(report.ranked[0].total_games, 2);
    assert!(dir.path().join("me_openings.png").exists());
}

#[test]
fn test_month_range_limits_fetches() {
    let source = FakeSource::new()
        .with_month("2023/12", vec![game("me", "x", "Ruy-Lopez", Some("1-0"))])
        .with_month("2024/01", vec![game("me", "x", "Ruy-Lopez", Some("1-0"))])
        .with_month("2024/02", vec![game("me", "x", "Ruy-Lopez", Some("1-0"))]);
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.months = MonthRange {
        since: Some(ArchiveMonth::new(2024, 1).unwrap()),
        until: None,
    };

    let summary = run_analysis(&source, &config, None).unwrap();
    assert_eq!(summary.archives, 2);
    assert_eq!(source.requested.borrow().len(), 2);
    assert_eq!(summary.reports[0].ranked[0].total_games, 2);
}

#[test]
fn test_csv_export() {
    let source = FakeSource::new().with_month(
        "2024/01",
        vec![
            game("me", "x", "Italian-Game", Some("1-0")),
            game("me", "x", "Italian-Game", Some("1-0")),
            game("me", "x", "Italian-Game", Some("0-1")),
        ],
    );
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.csv = true;

    let summary = run_analysis(&source, &config, None).unwrap();
    let csv_path = summary.reports[0].csv.clone().unwrap();
    assert_eq!(csv_path, dir.path().join("as_white.csv"));
    let content = std::fs::read_to_string(csv_path).unwrap();
    assert!(content.contains("Italian game,66.7,33.3,0.0,3,2.00"));

    // No black games, so no black table either
    assert!(summary.reports[1].csv.is_none());
}

#[test]
fn test_top_ten_of_fifteen() {
    let mut games = Vec::new();
    for i in 0..15 {
        for _ in 0..(20 - i) {
            games.push(game("me", "x", &format!("Opening-{:02}", i), Some("0-1")));
        }
    }
    // The rarest opening is also the most successful
    games.push(game("me", "x", "Opening-14", Some("1-0")));

    let source = FakeSource::new().with_month("2024/01", games);
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.sides = vec![opening_stats::Side::White];

    let summary = run_analysis(&source, &config, None).unwrap();
    let ranked = &summary.reports[0].ranked;
    assert_eq!(ranked.len(), 10);
    assert_eq!(ranked[0].opening, "Opening 00");
    assert_eq!(ranked[9].opening, "Opening 09");
    assert!(ranked.iter().all(|s| s.opening != "Opening 14"));
}
