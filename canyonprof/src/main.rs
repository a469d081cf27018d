#![allow(clippy::cast_possible_truncation)]

mod input;
mod options;

use anyhow::{anyhow, Error as AnyError};
use canyon::{
    EdgeCurves, GridSet, Params, Processor, ProfileKind, ProfileRecord, ProfileStatus,
    StatusSummary, Thalweg,
};
use clap::Parser;
use options::{Cli, Command as CliCmd};
use serde::Serialize;
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    env_logger::init();
    let cli = Cli::parse();

    let grids = GridSet::new(&cli.dem_dir)?;
    let thalweg = Thalweg::new(input::read_thalweg(&cli.thalweg)?)?;
    let (left, right) = input::read_edges(&cli.edges)?;
    let edges = EdgeCurves::new(left, right);

    let params = Params {
        station_step_m: cli.station_step,
        sample_step_m: cli.sample_step,
        provisional_reach_m: cli.reach,
        edge_extension_m: cli.edge_extension,
        fallback_half_width_m: cli.fallback_half_width,
        p1_window_half_width_m: cli.p1_window,
        ..Params::default()
    };

    let records = Processor::new(&grids, &thalweg, &edges)
        .with_params(params)
        .run()?;

    match cli.cmd {
        CliCmd::Csv => print_csv(&records)?,
        CliCmd::Json => print_json(&records)?,
        CliCmd::Plot { station } => {
            let record = records
                .iter()
                .find(|record| record.station().id == station)
                .ok_or_else(|| anyhow!("no station {station}"))?;
            plot_ascii(record);
        }
        CliCmd::Summary => print_summary(&records),
    };
    Ok(())
}

/// One output row per station. Stations without metrics keep their
/// identity and status; the metric cells stay empty.
#[derive(Serialize)]
struct MetricRow {
    station: usize,
    chainage_m: f64,
    kind: &'static str,
    status: ProfileStatus,
    wmax_m: Option<f64>,
    w1_m: Option<f64>,
    w2_m: Option<f64>,
    dmax_m: Option<f64>,
    h1_m: Option<f64>,
    h2_m: Option<f64>,
    b1_deg: Option<f64>,
    b2_deg: Option<f64>,
    swmax_deg: Option<f64>,
    aspect_ratio: Option<f64>,
}

impl From<&ProfileRecord> for MetricRow {
    fn from(record: &ProfileRecord) -> Self {
        let metrics = record.metrics;
        Self {
            station: record.station().id,
            chainage_m: record.station().distance_m,
            kind: match record.profile.kind {
                ProfileKind::EdgeConstrained => "edge_constrained",
                ProfileKind::FallbackOrthogonal => "fallback_orthogonal",
            },
            status: record.status,
            wmax_m: metrics.map(|m| m.wmax_m),
            w1_m: metrics.map(|m| m.w1_m),
            w2_m: metrics.map(|m| m.w2_m),
            dmax_m: metrics.map(|m| m.dmax_m),
            h1_m: metrics.map(|m| m.h1_m),
            h2_m: metrics.map(|m| m.h2_m),
            b1_deg: metrics.map(|m| m.b1_deg),
            b2_deg: metrics.map(|m| m.b2_deg),
            swmax_deg: metrics.map(|m| m.swmax_deg),
            aspect_ratio: metrics.and_then(|m| m.aspect_ratio),
        }
    }
}

fn print_csv(records: &[ProfileRecord]) -> Result<(), AnyError> {
    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    for record in records {
        writer.serialize(MetricRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn print_json(records: &[ProfileRecord]) -> Result<(), AnyError> {
    let rows: Vec<MetricRow> = records.iter().map(MetricRow::from).collect();
    let json = serde_json::to_string(&rows)?;
    println!("{json}");
    Ok(())
}

fn plot_ascii(record: &ProfileRecord) {
    let profile = &record.profile;
    let seafloor: Vec<(f32, f32)> = profile
        .offsets_m
        .iter()
        .zip(&profile.elevations_m)
        .filter_map(|(offset, elevation)| elevation.map(|e| (*offset as f32, e as f32)))
        .collect();
    if seafloor.is_empty() {
        println!("station {}: no valid samples", record.station().id);
        return;
    }

    // Overlay the P2-P1-P3-P4 construction when it exists.
    let construction: Vec<(f32, f32)> = record
        .key_points
        .map(|kp| {
            [kp.p2, kp.p1, kp.p3, kp.p4, kp.p2]
                .iter()
                .map(|p| (p.offset_m as f32, p.elevation_m as f32))
                .collect()
        })
        .unwrap_or_default();

    let x_min = seafloor.first().map_or(0.0, |(x, _)| *x);
    let x_max = seafloor.last().map_or(0.0, |(x, _)| *x);
    let mut chart = Chart::new(300, 150, x_min, x_max);
    if construction.is_empty() {
        chart.lineplot(&Shape::Lines(&seafloor)).display();
    } else {
        chart
            .lineplot(&Shape::Lines(&seafloor))
            .lineplot(&Shape::Lines(&construction))
            .display();
    }
}

fn print_summary(records: &[ProfileRecord]) {
    let summary = StatusSummary::tally(records);
    println!("stations:         {}", summary.total());
    println!("ok:               {}", summary.ok);
    println!("no_data:          {}", summary.no_data);
    println!("missing_data:     {}", summary.missing_data);
    println!("missing_edge:     {}", summary.missing_edge);
    println!("degenerate_p4:    {}", summary.degenerate_p4);
    println!("invalid_geometry: {}", summary.invalid_geometry);

    let flagged: Vec<String> = records
        .iter()
        .filter(|record| record.status != ProfileStatus::Ok)
        .map(|record| format!("{} ({})", record.station().id, record.status))
        .collect();
    if !flagged.is_empty() {
        println!("flagged:          {}", flagged.join(", "));
    }
}
