//! Opening Stats
//!
//! Charts which openings a Chess.com player uses most and how they score
//! with each of them.
//!
//! This library provides:
//! - `archive`: Chess.com archive listing and game download
//! - `game`: Game records and PGN tag lookup
//! - `classify`: Opening name normalisation and result scoring
//! - `tally`: Per-opening win/loss/draw counters
//! - `report`: Percentages, ranking, chart and CSV output
//! - `chart`: Stacked bar chart rasterizer
//! - `pipeline`: End-to-end analysis used by the CLI
//!
//! Binaries:
//! - `opening-stats`: Fetch a player's games and write the charts

pub mod archive;
pub mod chart;
pub mod classify;
pub mod game;
pub mod pipeline;
pub mod report;
pub mod tally;

pub use archive::{ChessComClient, GameSource};
pub use classify::{Outcome, Perspective};
pub use game::{GameRecord, Side};
pub use pipeline::{run_analysis, AnalysisConfig, PerspectiveMode};
