//! Opening Stats CLI
//!
//! Downloads a Chess.com player's public games and writes stacked bar charts
//! of their ten most played openings with win/loss/draw percentages.
//!
//! Usage: opening-stats [OPTIONS] [USERNAME]
//!
//! Without a username the tool asks for one on stdin.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use opening_stats::archive::{ArchiveMonth, ChessComClient, MonthRange, DEFAULT_USER_AGENT};
use opening_stats::chart::load_font;
use opening_stats::classify::GameFilter;
use opening_stats::pipeline::{
    run_analysis, validate_username, AnalysisConfig, AnalysisSummary, PerspectiveMode,
    ReportResult,
};
use opening_stats::report::{ChartOutcome, DEFAULT_TOP_N};
use opening_stats::Side;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PerspectiveArg {
    /// One chart per colour, scored for the player
    Subject,
    /// One chart over every game, scored for white
    White,
}

#[derive(Parser)]
#[command(name = "opening-stats")]
#[command(about = "Chart the openings a Chess.com player uses most and how they score")]
struct Cli {
    /// Chess.com username (prompted for when omitted)
    username: Option<String>,

    /// Directory to write charts to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of openings per chart
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// How results are scored
    #[arg(long, value_enum, default_value = "subject")]
    perspective: PerspectiveArg,

    /// Only chart games where the player had this colour (subject perspective)
    #[arg(long)]
    side: Option<Side>,

    /// First archive month to include (YYYY-MM)
    #[arg(long)]
    since: Option<ArchiveMonth>,

    /// Last archive month to include (YYYY-MM)
    #[arg(long)]
    until: Option<ArchiveMonth>,

    /// Only count games of this time class (bullet, blitz, rapid, daily)
    #[arg(long)]
    time_class: Option<String>,

    /// Count variant games (chess960, bughouse, ...) too
    #[arg(long)]
    include_variants: bool,

    /// Skip casual (unrated) games
    #[arg(long)]
    rated_only: bool,

    /// Also write each ranked table as CSV
    #[arg(long)]
    csv: bool,

    /// User-Agent header sent to the API
    #[arg(long, env = "OPENING_STATS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// TrueType font for chart text (default: search system fonts)
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let username = match cli.username {
        Some(name) => name,
        None => prompt_username()?,
    };
    let username = username.trim();
    validate_username(username)?;

    if let (Some(since), Some(until)) = (cli.since, cli.until) {
        if since > until {
            anyhow::bail!("--since {} is after --until {}", since, until);
        }
    }

    let mut config = AnalysisConfig::new(username);
    config.mode = match cli.perspective {
        PerspectiveArg::Subject => PerspectiveMode::Subject,
        PerspectiveArg::White => PerspectiveMode::White,
    };
    if let Some(side) = cli.side {
        config.sides = vec![side];
    }
    config.output_dir = cli.output_dir;
    config.top_n = cli.top_n.max(1);
    config.months = MonthRange {
        since: cli.since,
        until: cli.until,
    };
    config.filter = GameFilter {
        time_class: cli.time_class,
        include_variants: cli.include_variants,
        rated_only: cli.rated_only,
    };
    config.csv = cli.csv;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let font = match load_font(cli.font.as_deref()) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("{:#}; charts will have no text", e);
            None
        }
    };

    let client = ChessComClient::new(&cli.user_agent, Duration::from_secs(cli.timeout_secs))?;

    println!("Fetching games for {}...", username);
    let summary = run_analysis(&client, &config, font.as_ref())?;
    print_summary(&summary);

    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("your chess.com username: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read username")?;
    Ok(line.trim().to_string())
}

fn print_summary(summary: &AnalysisSummary) {
    println!(
        "Fetched {} games from {} archives",
        summary.games, summary.archives
    );

    for report in &summary.reports {
        if report.failed > 0 {
            println!(
                "  {} malformed games skipped for {}",
                report.failed, report.title
            );
        }
        println!("{}", chart_status(report));
        if let Some(csv) = &report.csv {
            println!("Table saved as {}", csv.display());
        }
    }
}

fn chart_status(report: &ReportResult) -> String {
    match &report.chart {
        ChartOutcome::Written(path) => format!(
            "Chart saved as {} ({} games, {} openings shown)",
            path.display(),
            report.counted,
            report.ranked.len()
        ),
        ChartOutcome::NoData => format!("No valid data to plot for {}.", report.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(chart: ChartOutcome) -> ReportResult {
        ReportResult {
            title: "As White".to_string(),
            chart,
            csv: None,
            ranked: Vec::new(),
            counted: 12,
            skipped: 0,
            failed: 0,
        }
    }

    #[test]
    fn test_chart_status() {
        let written = report(ChartOutcome::Written(PathBuf::from("as_white.png")));
        assert_eq!(
            chart_status(&written),
            "Chart saved as as_white.png (12 games, 0 openings shown)"
        );
        assert_eq!(
            chart_status(&report(ChartOutcome::NoData)),
            "No valid data to plot for As White."
        );
    }
}
