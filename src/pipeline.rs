//! End-to-end analysis: fetch every archive, tally per perspective, write
//! one chart per perspective.
//!
//! Returns structured results instead of printing so the CLI decides how to
//! present them.

use crate::archive::{filter_archives, GameSource, MonthRange};
use crate::classify::{GameFilter, Perspective};
use crate::game::{GameRecord, Side};
use crate::report::{rank_openings, write_chart, write_csv, ChartOutcome, OpeningStats};
use crate::tally::tally_games;
use ab_glyph::FontVec;
use anyhow::Result;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration
// ============================================================================

/// How results are scored, as chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerspectiveMode {
    /// One chart per side the subject played, scored for the subject
    #[default]
    Subject,
    /// A single chart over all games, scored for white
    White,
}

/// Configuration for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Chess.com account to analyse
    pub username: String,
    pub mode: PerspectiveMode,
    /// Sides to chart in subject mode; ignored in white mode
    pub sides: Vec<Side>,
    /// Directory charts (and CSVs) are written to
    pub output_dir: PathBuf,
    /// Openings per chart
    pub top_n: usize,
    /// Archive months to include
    pub months: MonthRange,
    pub filter: GameFilter,
    /// Also write each ranked table as CSV next to its chart
    pub csv: bool,
}

impl AnalysisConfig {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            mode: PerspectiveMode::Subject,
            sides: vec![Side::White, Side::Black],
            output_dir: PathBuf::from("."),
            top_n: crate::report::DEFAULT_TOP_N,
            months: MonthRange::default(),
            filter: GameFilter::default(),
            csv: false,
        }
    }

    /// One job per chart to produce.
    pub fn jobs(&self) -> Vec<ReportJob> {
        match self.mode {
            PerspectiveMode::Subject => self
                .sides
                .iter()
                .map(|&side| ReportJob {
                    perspective: Perspective::subject(&self.username, side),
                    title: format!(
                        "Win/Loss/Draw Percentages for Top {} Openings (As {})",
                        self.top_n,
                        capitalized(side.label())
                    ),
                    file_stem: format!("as_{}", side.label()),
                })
                .collect(),
            PerspectiveMode::White => vec![ReportJob {
                perspective: Perspective::White,
                title: format!(
                    "Win/Loss/Draw Percentages for Top {} Openings in {}'s Games (White's View)",
                    self.top_n, self.username
                ),
                file_stem: format!("{}_openings", file_safe(&self.username)),
            }],
        }
    }
}

/// One chart to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportJob {
    pub perspective: Perspective,
    pub title: String,
    /// Output file name without extension
    pub file_stem: String,
}

// ============================================================================
// Results
// ============================================================================

/// Result of one report job.
#[derive(Debug, Clone)]
pub struct ReportResult {
    pub title: String,
    pub chart: ChartOutcome,
    pub csv: Option<PathBuf>,
    pub ranked: Vec<OpeningStats>,
    pub counted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of a whole run.
#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub archives: usize,
    pub games: usize,
    pub reports: Vec<ReportResult>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Download every game in the selected archives, in archive order.
pub fn fetch_all_games<S: GameSource>(
    source: &S,
    username: &str,
    months: &MonthRange,
) -> (usize, Vec<GameRecord>) {
    let archives = filter_archives(source.archives(username), months);
    log::info!("{} archives to fetch for '{}'", archives.len(), username);

    let mut games = Vec::new();
    for (i, archive) in archives.iter().enumerate() {
        let batch = source.games(archive);
        log::debug!(
            "[{}/{}] {}: {} games",
            i + 1,
            archives.len(),
            archive,
            batch.len()
        );
        games.extend(batch);
    }
    (archives.len(), games)
}

/// Run the full analysis.
///
/// Fetch and classification problems are logged and only reduce what gets
/// counted; the only errors returned are output failures.
pub fn run_analysis<S: GameSource>(
    source: &S,
    config: &AnalysisConfig,
    font: Option<&FontVec>,
) -> Result<AnalysisSummary> {
    let (archives, games) = fetch_all_games(source, &config.username, &config.months);

    let mut reports = Vec::new();
    for job in config.jobs() {
        reports.push(run_job(&games, &job, config, font)?);
    }

    Ok(AnalysisSummary {
        archives,
        games: games.len(),
        reports,
    })
}

fn run_job(
    games: &[GameRecord],
    job: &ReportJob,
    config: &AnalysisConfig,
    font: Option<&FontVec>,
) -> Result<ReportResult> {
    let summary = tally_games(games, &job.perspective, &config.filter);
    let ranked = rank_openings(&summary.tally, config.top_n);

    let chart_path = output_path(&config.output_dir, &job.file_stem, "png");
    let chart = write_chart(&ranked, &job.title, &chart_path, font)?;

    let csv = if config.csv && !ranked.is_empty() {
        let csv_path = output_path(&config.output_dir, &job.file_stem, "csv");
        write_csv(&ranked, &csv_path)?;
        Some(csv_path)
    } else {
        None
    };

    Ok(ReportResult {
        title: job.title.clone(),
        chart,
        csv,
        ranked,
        counted: summary.counted,
        skipped: summary.skipped,
        failed: summary.failed,
    })
}

/// Chess.com account names are ASCII letters, digits, `_` and `-`.
///
/// Anything else is rejected before the name reaches a URL or a file name.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        anyhow::bail!("A Chess.com username is required");
    }
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        anyhow::bail!(
            "Invalid username '{}': unexpected character {:?} (allowed: A-Z, a-z, 0-9, _ and -)",
            username,
            bad
        );
    }
    Ok(())
}

/// Lower-cased `name` with everything outside `[a-z0-9_-]` dropped.
fn file_safe(name: &str) -> String {
    let safe: String = name
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe.is_empty() {
        "player".to_string()
    } else {
        safe
    }
}

fn output_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, ext))
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
