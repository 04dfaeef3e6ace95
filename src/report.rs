//! Percentages, ranking and report output.

use crate::chart::{render_chart, ChartStyle};
use crate::tally::{Outcomes, Tally};
use ab_glyph::FontVec;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Number of openings shown per chart unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 10;

/// Percentage view of one opening's tally.
#[derive(Debug, Clone, PartialEq)]
pub struct OpeningStats {
    pub opening: String,
    pub win_pct: f64,
    pub loss_pct: f64,
    pub draw_pct: f64,
    pub total_games: u32,
    pub success_ratio: f64,
}

impl OpeningStats {
    /// `None` when the opening has no games.
    pub fn from_outcomes(opening: &str, outcomes: &Outcomes) -> Option<Self> {
        let total = outcomes.total();
        if total == 0 {
            return None;
        }
        let pct = |n: u32| n as f64 / total as f64 * 100.0;
        Some(Self {
            opening: opening.to_string(),
            win_pct: pct(outcomes.wins),
            loss_pct: pct(outcomes.losses),
            draw_pct: pct(outcomes.draws),
            total_games: total,
            success_ratio: outcomes.success_ratio(),
        })
    }
}

/// Most played openings first, at most `top_n` of them.
///
/// Ties in game count are broken by name so the output is stable across runs.
pub fn rank_openings(tally: &Tally, top_n: usize) -> Vec<OpeningStats> {
    let mut stats: Vec<OpeningStats> = tally
        .iter()
        .filter_map(|(name, outcomes)| OpeningStats::from_outcomes(name, outcomes))
        .collect();

    stats.sort_by(|a, b| {
        b.total_games
            .cmp(&a.total_games)
            .then_with(|| a.opening.cmp(&b.opening))
    });
    stats.truncate(top_n);
    stats
}

/// Index of the opening with the highest success ratio.
///
/// On equal ratios the earlier (more played) opening wins.
pub fn best_opening(ranked: &[OpeningStats]) -> Option<usize> {
    ranked
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
            Some((_, ratio))
                if s.success_ratio.partial_cmp(&ratio) != Some(Ordering::Greater) =>
            {
                best
            }
            _ => Some((i, s.success_ratio)),
        })
        .map(|(i, _)| i)
}

/// What happened when a chart was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Written(PathBuf),
    /// Nothing to plot; no file was written
    NoData,
}

/// Render `ranked` as a stacked bar chart and save it as a PNG.
///
/// An empty slice is not an error: nothing is written and `NoData` is
/// returned.
pub fn write_chart(
    ranked: &[OpeningStats],
    title: &str,
    path: &Path,
    font: Option<&FontVec>,
) -> Result<ChartOutcome> {
    if ranked.is_empty() {
        return Ok(ChartOutcome::NoData);
    }

    let style = ChartStyle::default();
    let pixels = render_chart(ranked, best_opening(ranked), title, font, &style);
    let png_data = encode_png(&pixels, style.width, style.height)?;

    std::fs::write(path, png_data)
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;
    Ok(ChartOutcome::Written(path.to_path_buf()))
}

/// Encode an RGB8 buffer as PNG.
fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().context("Failed to write PNG header")?;
        writer
            .write_image_data(pixels)
            .context("Failed to encode chart PNG")?;
    }
    Ok(output)
}

/// Write the ranked table as CSV, one row per opening.
pub fn write_csv(ranked: &[OpeningStats], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV: {}", path.display()))?;
    writer.write_record([
        "Opening",
        "Win %",
        "Loss %",
        "Draw %",
        "Total Games",
        "Success Ratio",
    ])?;
    for s in ranked {
        writer.write_record([
            s.opening.clone(),
            format!("{:.1}", s.win_pct),
            format!("{:.1}", s.loss_pct),
            format!("{:.1}", s.draw_pct),
            s.total_games.to_string(),
            format!("{:.2}", s.success_ratio),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
