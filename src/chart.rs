//! Stacked bar chart rasterizer.
//!
//! Draws straight into an RGB8 pixel buffer: filled rectangles for the plot,
//! grid and bars, and anti-aliased TrueType text through `ab_glyph`. Text is
//! optional; without a font the chart is still drawn, just unlabelled.

use crate::report::OpeningStats;
use ab_glyph::{Font, FontVec, ScaleFont};
use anyhow::{Context, Result};
use std::path::Path;

pub type Rgb = (u8, u8, u8);

const CHANNELS: usize = 3;

/// Y axis runs to 110% so the crown above a full bar stays inside the plot.
const Y_MAX_PCT: f64 = 110.0;

/// Colours and geometry of the rendered chart.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub plot_background: Rgb,
    pub grid: Rgb,
    pub text: Rgb,
    pub win: Rgb,
    pub loss: Rgb,
    pub draw: Rgb,
    pub crown: Rgb,
    pub margin_left: usize,
    pub margin_right: usize,
    pub margin_top: usize,
    pub margin_bottom: usize,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 800,
            background: (255, 255, 255),
            plot_background: (0, 0, 0),
            grid: (128, 128, 128),
            text: (0, 0, 0),
            win: (0x80, 0x00, 0x80),
            loss: (0xFF, 0xA5, 0x00),
            draw: (0x00, 0xFF, 0x00),
            crown: (255, 215, 0),
            margin_left: 90,
            margin_right: 170,
            margin_top: 70,
            margin_bottom: 130,
        }
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────────

/// Owned RGB8 pixel buffer with bounds-checked drawing.
pub struct Canvas {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize, fill: Rgb) -> Self {
        let mut pixels = vec![0u8; width * height * CHANNELS];
        for px in pixels.chunks_exact_mut(CHANNELS) {
            px[0] = fill.0;
            px[1] = fill.1;
            px[2] = fill.2;
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * CHANNELS;
        Some((self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]))
    }

    /// Fill the half-open rectangle `[x1, x2) x [y1, y2)`, clipped to the canvas.
    pub fn fill_rect(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, color: Rgb) {
        let x2 = x2.min(self.width);
        let y2 = y2.min(self.height);
        for py in y1..y2 {
            for px in x1..x2 {
                let idx = (py * self.width + px) * CHANNELS;
                self.pixels[idx] = color.0;
                self.pixels[idx + 1] = color.1;
                self.pixels[idx + 2] = color.2;
            }
        }
    }

    /// Outline of a rectangle, one pixel wide.
    pub fn stroke_rect(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, color: Rgb) {
        self.fill_rect(x1, y1, x2, y1 + 1, color);
        self.fill_rect(x1, y2.saturating_sub(1), x2, y2, color);
        self.fill_rect(x1, y1, x1 + 1, y2, color);
        self.fill_rect(x2.saturating_sub(1), y1, x2, y2, color);
    }

    /// Alpha-blend `color` over the pixel at (x, y).
    fn blend(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * CHANNELS;
        let alpha = alpha.clamp(0.0, 1.0);
        let inv = 1.0 - alpha;
        self.pixels[idx] = (color.0 as f32 * alpha + self.pixels[idx] as f32 * inv) as u8;
        self.pixels[idx + 1] = (color.1 as f32 * alpha + self.pixels[idx + 1] as f32 * inv) as u8;
        self.pixels[idx + 2] = (color.2 as f32 * alpha + self.pixels[idx + 2] as f32 * inv) as u8;
    }

    /// Draw anti-aliased text with its top-left corner at (x, y), `size`
    /// pixels tall.
    pub fn draw_text(&mut self, font: &FontVec, text: &str, x: f32, y: f32, size: f32, fg: Rgb) {
        let (glyphs, _) = layout_line(font, text, size, ab_glyph::point(x, y));
        for outlined in glyphs.into_iter().filter_map(|g| font.outline_glyph(g)) {
            let origin = outlined.px_bounds().min;
            outlined.draw(|gx, gy, coverage| {
                let px = origin.x as i64 + gx as i64;
                let py = origin.y as i64 + gy as i64;
                if let (Ok(px), Ok(py)) = (usize::try_from(px), usize::try_from(py)) {
                    self.blend(px, py, fg, coverage);
                }
            });
        }
    }

    /// Draw text horizontally centred on `center_x`.
    pub fn draw_text_centered(
        &mut self,
        font: &FontVec,
        text: &str,
        center_x: f32,
        y: f32,
        font_height: f32,
        fg: Rgb,
    ) {
        let w = text_width(font, text, font_height);
        self.draw_text(font, text, center_x - w / 2.0, y, font_height, fg);
    }

    /// Crown marker: a solid band with three spikes, base at `base_y`.
    pub fn draw_crown(&mut self, center_x: usize, base_y: usize, width: usize, color: Rgb) {
        let band = (width / 5).max(2);
        let spike = width / 2;
        let left = center_x.saturating_sub(width / 2);
        let third = width as f64 / 3.0;

        for dx in 0..width {
            // Triangular wave with three peaks across the width
            let phase = (dx as f64 / third).fract();
            let peak = 1.0 - (phase * 2.0 - 1.0).abs();
            let top = base_y.saturating_sub(band + (peak * spike as f64) as usize);
            self.fill_rect(left + dx, top, left + dx + 1, base_y, color);
        }
    }
}

// ─── TrueType text rendering ─────────────────────────────────────────────────

/// Fonts tried, in order, when no font file is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the font at `path`, or the first usable entry of
/// [`FONT_SEARCH_PATHS`] when no path is given.
pub fn load_font(path: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = path {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        return FontVec::try_from_vec(data)
            .with_context(|| format!("Not a usable TrueType font: {}", path.display()));
    }

    FONT_SEARCH_PATHS
        .iter()
        .find_map(|candidate| {
            let data = std::fs::read(candidate).ok()?;
            // .ttc collections: the first face is the regular weight
            let font = FontVec::try_from_vec_and_index(data, 0).ok()?;
            log::info!("Chart font: {}", candidate);
            Some(font)
        })
        .with_context(|| {
            format!(
                "No chart font found (searched {})",
                FONT_SEARCH_PATHS.join(", ")
            )
        })
}

/// Position the glyphs of a single line of text whose top-left corner is
/// `origin`, applying pair kerning. Returns the glyphs and the line's width.
fn layout_line(
    font: &FontVec,
    text: &str,
    size: f32,
    origin: ab_glyph::Point,
) -> (Vec<ab_glyph::Glyph>, f32) {
    let scale = ab_glyph::PxScale::from(size);
    let metrics = font.as_scaled(scale);
    let baseline = origin.y + metrics.ascent();

    let mut glyphs = Vec::with_capacity(text.len());
    let mut pen = 0.0;
    let mut prev: Option<ab_glyph::GlyphId> = None;
    for ch in text.chars() {
        let id = metrics.glyph_id(ch);
        if let Some(prev) = prev {
            pen += metrics.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, ab_glyph::point(origin.x + pen, baseline)));
        pen += metrics.h_advance(id);
        prev = Some(id);
    }
    (glyphs, pen)
}

/// Width in pixels of `text` drawn `size` pixels tall.
pub fn text_width(font: &FontVec, text: &str, size: f32) -> f32 {
    layout_line(font, text, size, ab_glyph::point(0.0, 0.0)).1
}

/// Break `text` into at most `max_lines` lines no wider than `max_width`.
/// Words that do not fit on the last line are cut and marked with "...".
fn wrap_label(
    font: &FontVec,
    text: &str,
    max_width: f32,
    font_height: f32,
    max_lines: usize,
) -> Vec<String> {
    let fits = |s: &str| text_width(font, s, font_height) <= max_width;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fits(&candidate) || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        let rest = lines.split_off(max_lines - 1).join(" ");
        lines.push(rest);
    }
    for line in lines.iter_mut() {
        if !fits(line) {
            *line = truncate_to_width(font, line, max_width, font_height);
        }
    }
    lines
}

fn truncate_to_width(font: &FontVec, text: &str, max_width: f32, font_height: f32) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if text_width(font, &candidate, font_height) <= max_width {
            return candidate;
        }
    }
    String::new()
}

// ─── Chart ───────────────────────────────────────────────────────────────────

/// Pixel rectangle of the plot area inside the margins.
struct PlotArea {
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
}

impl PlotArea {
    fn height(&self) -> usize {
        self.bottom - self.top
    }

    /// Y pixel for a percentage value.
    fn y_for(&self, pct: f64) -> usize {
        let frac = (pct / Y_MAX_PCT).clamp(0.0, 1.0);
        self.bottom - (frac * self.height() as f64).round() as usize
    }
}

/// Render the stacked bar chart for `ranked` into an RGB8 buffer of
/// `style.width x style.height` pixels.
///
/// Each bar stacks win, loss and draw percentages bottom to top; `best`
/// gets a crown above it.
pub fn render_chart(
    ranked: &[OpeningStats],
    best: Option<usize>,
    title: &str,
    font: Option<&FontVec>,
    style: &ChartStyle,
) -> Vec<u8> {
    let width = style.width as usize;
    let height = style.height as usize;
    let mut canvas = Canvas::new(width, height, style.background);

    let plot = PlotArea {
        left: style.margin_left.min(width),
        top: style.margin_top.min(height),
        right: width.saturating_sub(style.margin_right).max(style.margin_left + 1),
        bottom: height.saturating_sub(style.margin_bottom).max(style.margin_top + 1),
    };
    canvas.fill_rect(plot.left, plot.top, plot.right, plot.bottom, style.plot_background);

    for tick in (0..=100).step_by(20) {
        let y = plot.y_for(tick as f64);
        canvas.fill_rect(plot.left, y, plot.right, y + 1, style.grid);
    }

    let n = ranked.len().max(1);
    let slot = (plot.right - plot.left) as f64 / n as f64;
    let bar_w = (slot * 0.6).max(1.0);

    for (i, stats) in ranked.iter().enumerate() {
        let center = plot.left as f64 + slot * (i as f64 + 0.5);
        let x1 = (center - bar_w / 2.0).round() as usize;
        let x2 = (center + bar_w / 2.0).round() as usize;

        let mut base = 0.0;
        for (pct, color) in [
            (stats.win_pct, style.win),
            (stats.loss_pct, style.loss),
            (stats.draw_pct, style.draw),
        ] {
            let y_bottom = plot.y_for(base);
            let y_top = plot.y_for(base + pct);
            canvas.fill_rect(x1, y_top, x2, y_bottom, color);
            base += pct;
        }

        if best == Some(i) {
            let crown_w = (bar_w * 0.5).clamp(12.0, 48.0) as usize;
            let base_y = plot.y_for(base).saturating_sub(6);
            canvas.draw_crown(center.round() as usize, base_y, crown_w, style.crown);
        }
    }

    if let Some(font) = font {
        draw_labels(&mut canvas, font, ranked, title, style, &plot, slot);
    }

    canvas.into_pixels()
}

/// Title, axes, opening names and legend.
fn draw_labels(
    canvas: &mut Canvas,
    font: &FontVec,
    ranked: &[OpeningStats],
    title: &str,
    style: &ChartStyle,
    plot: &PlotArea,
    slot: f64,
) {
    let width = style.width as f32;

    canvas.draw_text_centered(font, title, width / 2.0, 20.0, 28.0, style.text);

    for tick in (0..=100).step_by(20) {
        let label = tick.to_string();
        let y = plot.y_for(tick as f64) as f32;
        let w = text_width(font, &label, 16.0);
        canvas.draw_text(font, &label, plot.left as f32 - w - 8.0, y - 9.0, 16.0, style.text);
    }
    canvas.draw_text(font, "Percentage", 10.0, plot.top as f32 - 28.0, 18.0, style.text);

    // Opening names under each bar, shrunk to fit the slot
    for (i, stats) in ranked.iter().enumerate() {
        let center = plot.left as f32 + slot as f32 * (i as f32 + 0.5);
        let max_w = (slot as f32 - 6.0).max(10.0);
        let mut font_h = 15.0;
        let mut lines = wrap_label(font, &stats.opening, max_w, font_h, 3);
        while lines.iter().any(|l| l.ends_with("...")) && font_h > 11.0 {
            font_h -= 1.0;
            lines = wrap_label(font, &stats.opening, max_w, font_h, 3);
        }
        let mut y = plot.bottom as f32 + 8.0;
        for line in &lines {
            canvas.draw_text_centered(font, line, center, y, font_h, style.text);
            y += font_h + 2.0;
        }
        let games = format!("({} games)", stats.total_games);
        canvas.draw_text_centered(font, &games, center, y + 2.0, 12.0, style.grid);
    }

    let plot_center = (plot.left + plot.right) as f32 / 2.0;
    canvas.draw_text_centered(
        font,
        "Opening",
        plot_center,
        style.height as f32 - 32.0,
        18.0,
        style.text,
    );

    // Legend to the right of the plot: black box, gray edge, white labels
    let lx = plot.right + 15;
    let ly = plot.top;
    let entry_h = 26;
    let box_w = style.margin_right.saturating_sub(25);
    let box_h = 34 + entry_h * 3;
    canvas.fill_rect(lx, ly, lx + box_w, ly + box_h, style.plot_background);
    canvas.stroke_rect(lx, ly, lx + box_w, ly + box_h, style.grid);
    canvas.draw_text(font, "Result", lx as f32 + 10.0, ly as f32 + 6.0, 16.0, (255, 255, 255));
    for (row, (label, color)) in [("Win %", style.win), ("Loss %", style.loss), ("Draw %", style.draw)]
        .into_iter()
        .enumerate()
    {
        let y = ly + 30 + row * entry_h;
        canvas.fill_rect(lx + 10, y + 2, lx + 28, y + 18, color);
        canvas.draw_text(font, label, lx as f32 + 36.0, y as f32 + 1.0, 16.0, (255, 255, 255));
    }
}
