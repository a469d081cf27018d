use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compute transverse-profile metrics along a submarine-canyon
/// thalweg.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Directory of bathymetry grids (`.asc` or `.flt`) in a projected
    /// metric CRS.
    #[arg(short, long)]
    pub dem_dir: PathBuf,

    /// Thalweg polyline, GeoJSON.
    #[arg(long)]
    pub thalweg: PathBuf,

    /// Canyon-margin polylines, GeoJSON. Each feature needs a "side"
    /// property of "left" or "right".
    #[arg(long)]
    pub edges: PathBuf,

    /// Chainage between stations, in meters.
    #[arg(long, default_value_t = 2000.0)]
    pub station_step: f64,

    /// Distance between profile samples, in meters.
    #[arg(long, default_value_t = 200.0)]
    pub sample_step: f64,

    /// Transverse reach searched for margin crossings, in meters.
    #[arg(long, default_value_t = 20_000.0)]
    pub reach: f64,

    /// Profile extension beyond each margin, in meters.
    #[arg(long, default_value_t = 3000.0)]
    pub edge_extension: f64,

    /// Half-length of fallback profiles, in meters.
    #[arg(long, default_value_t = 8500.0)]
    pub fallback_half_width: f64,

    /// Half-width of the thalweg-point search window, in meters.
    #[arg(long, default_value_t = 2000.0)]
    pub p1_window: f64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print per-station metrics to stdout as CSV.
    Csv,

    /// Print per-station metrics to stdout as JSON.
    Json,

    /// Plot one station's profile and key-point construction to the
    /// terminal.
    Plot {
        /// Station id.
        station: usize,
    },

    /// Print per-status counts and the stations flagged for review.
    Summary,
}
