use crate::{
    CanyonError, EdgeCurves, GridSet, KeyPointError, KeyPoints, MetricSet, Profile, ProfileRecord,
    ProfileStatus, Side, Station, Thalweg,
};
use bathydem::C;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

/// Tunable parameters of the whole pipeline. The defaults reproduce
/// the documented survey configuration; the P1 window and the arccos
/// clamp tolerance materially affect reproducibility across canyon
/// systems, so they are explicit here rather than buried as constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Params {
    /// Chainage between stations (default 2000 m).
    pub station_step_m: C,

    /// Half-chord used to estimate the local thalweg tangent
    /// (default 10 m).
    pub tangent_delta_m: C,

    /// Distance between elevation samples on the transverse line
    /// (default 200 m).
    pub sample_step_m: C,

    /// Transverse reach searched for margin crossings
    /// (default 20 000 m).
    pub provisional_reach_m: C,

    /// Extension beyond each margin for edge-constrained extents
    /// (default 3000 m).
    pub edge_extension_m: C,

    /// Half-length of fallback profiles (default 8500 m).
    pub fallback_half_width_m: C,

    /// Half-width of the P1 depth-minimum search window
    /// (default 2000 m).
    pub p1_window_half_width_m: C,

    /// Allowed floating-point overshoot of the arccos argument before
    /// a triangle is rejected (default 1e-9).
    pub cos_clamp_tolerance: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            station_step_m: 2000.0,
            tangent_delta_m: 10.0,
            sample_step_m: 200.0,
            provisional_reach_m: 20_000.0,
            edge_extension_m: 3000.0,
            fallback_half_width_m: 8500.0,
            p1_window_half_width_m: 2000.0,
            cos_clamp_tolerance: 1e-9,
        }
    }
}

/// Runs the station pipeline: sample, extract key points, compute
/// metrics, record status. All inputs are shared read-only, so
/// stations process in parallel with no cross-station state.
pub struct Processor<'a> {
    grids: &'a GridSet,
    thalweg: &'a Thalweg,
    edges: &'a EdgeCurves,
    params: Params,
}

impl<'a> Processor<'a> {
    pub fn new(grids: &'a GridSet, thalweg: &'a Thalweg, edges: &'a EdgeCurves) -> Self {
        Self {
            grids,
            thalweg,
            edges,
            params: Params::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Processes every station along the thalweg. Station failures
    /// land in their record's status; only I/O and malformed-input
    /// errors abort the batch. Records come back sorted by station id.
    pub fn run(&self) -> Result<Vec<ProfileRecord>, CanyonError> {
        let stations = self
            .thalweg
            .stations(self.params.station_step_m, self.params.tangent_delta_m);
        info!("processing {} stations", stations.len());

        let mut records = stations
            .into_par_iter()
            .map(|station| self.process_station(station))
            .collect::<Result<Vec<_>, _>>()?;
        records.sort_by_key(|record| record.station().id);
        Ok(records)
    }

    /// Processes a single station, independently of all others.
    pub fn process_station(&self, station: Station) -> Result<ProfileRecord, CanyonError> {
        let params = &self.params;

        let left = self
            .edges
            .offset_of(Side::Left, &station, params.provisional_reach_m);
        let right = self
            .edges
            .offset_of(Side::Right, &station, params.provisional_reach_m);

        let profile = Profile::builder()
            .station(station)
            .step_size(params.sample_step_m)
            .left_edge(left)
            .right_edge(right)
            .edge_extension(params.edge_extension_m)
            .fallback_half_width(params.fallback_half_width_m)
            .build(self.grids)?;

        // Fail-local: no elevation under the station itself means no
        // usable cross-section here, but the batch carries on.
        if self.grids.elevation(station.position)?.is_none() {
            debug!("station {}: no data at thalweg point", station.id);
            return Ok(ProfileRecord {
                profile,
                key_points: None,
                metrics: None,
                status: ProfileStatus::NoData,
            });
        }

        let key_points = match KeyPoints::extract(&profile, params.p1_window_half_width_m) {
            Ok(points) => points,
            Err(err) => {
                debug!("station {}: {err}", station.id);
                let status = match err {
                    KeyPointError::MissingData => ProfileStatus::MissingData,
                    KeyPointError::MissingEdge => ProfileStatus::MissingEdge,
                };
                return Ok(ProfileRecord {
                    profile,
                    key_points: None,
                    metrics: None,
                    status,
                });
            }
        };

        let metrics = match MetricSet::from_key_points(&key_points, params.cos_clamp_tolerance) {
            Ok(metrics) => metrics,
            Err(err) => {
                debug!("station {}: {err}", station.id);
                return Ok(ProfileRecord {
                    profile,
                    key_points: Some(key_points),
                    metrics: None,
                    status: ProfileStatus::InvalidGeometry,
                });
            }
        };

        let status = if key_points.p4_extrapolated {
            ProfileStatus::DegenerateP4
        } else {
            ProfileStatus::Ok
        };

        Ok(ProfileRecord {
            profile,
            key_points: Some(key_points),
            metrics: Some(metrics),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Params, Processor};
    use crate::{EdgeCurves, GridSet, ProfileStatus, StatusSummary, Thalweg};
    use approx::assert_relative_eq;
    use geo::line_string;
    use std::fmt::Write;
    use std::path::PathBuf;

    /// A straight V-shaped canyon running north: elevation depends
    /// only on x, with the axis near x = 5000 and the walls rising at
    /// 8%. The grid spans x ∈ [0, 12100], y ∈ [0, 6000].
    fn v_canyon_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("canyon_processor_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let (cols, rows, cellsize) = (121, 60, 100.0);
        let mut asc = String::new();
        writeln!(asc, "ncols {cols}").unwrap();
        writeln!(asc, "nrows {rows}").unwrap();
        writeln!(asc, "xllcorner 0.0").unwrap();
        writeln!(asc, "yllcorner 0.0").unwrap();
        writeln!(asc, "cellsize {cellsize}").unwrap();
        writeln!(asc, "NODATA_value -9999").unwrap();
        for _ in 0..rows {
            for col in 0..cols {
                let x = (col as f64 + 0.5) * cellsize;
                let elevation = -500.0 + 0.08 * (x - 5050.0).abs();
                write!(asc, "{elevation} ").unwrap();
            }
            asc.push('\n');
        }
        std::fs::write(dir.join("v_canyon.asc"), asc).unwrap();
        dir
    }

    fn edges() -> EdgeCurves {
        EdgeCurves::new(
            vec![line_string![(x: 4000.0, y: -2000.0), (x: 4000.0, y: 12_000.0)]],
            vec![line_string![(x: 6200.0, y: -2000.0), (x: 6200.0, y: 12_000.0)]],
        )
    }

    #[test]
    fn test_batch_over_straight_canyon() {
        let grids = GridSet::new(v_canyon_dir("batch")).unwrap();
        let thalweg =
            Thalweg::new(line_string![(x: 5000.0, y: 500.0), (x: 5000.0, y: 5500.0)]).unwrap();
        let edges = edges();

        let records = Processor::new(&grids, &thalweg, &edges).run().unwrap();

        assert_eq!(records.len(), 3);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.station().id, i);
            assert_eq!(record.status, ProfileStatus::Ok);

            let kp = record.key_points.unwrap();
            assert_relative_eq!(kp.p1.offset_m, 0.0);
            assert_relative_eq!(kp.p1.elevation_m, -500.0);
            assert_relative_eq!(kp.p2.offset_m, -1000.0);
            assert_relative_eq!(kp.p3.offset_m, 1200.0);

            let metrics = record.metrics.unwrap();
            assert_relative_eq!(metrics.wmax_m, 2200.0);
            // Rim is the (shallower) right margin at -404 m.
            assert_relative_eq!(metrics.dmax_m, 96.0, epsilon = 1e-9);
            assert!(metrics.swmax_deg > 0.0 && metrics.swmax_deg < 180.0);
        }

        // The canyon is translation-invariant along y, so every
        // station yields bit-identical metrics.
        let first = records[0].metrics.unwrap();
        for record in &records[1..] {
            assert_eq!(record.metrics.unwrap(), first);
        }
    }

    #[test]
    fn test_margins_on_one_side_flag_degenerate_p4() {
        let grids = GridSet::new(v_canyon_dir("one_side")).unwrap();
        let thalweg =
            Thalweg::new(line_string![(x: 5000.0, y: 500.0), (x: 5000.0, y: 5500.0)]).unwrap();
        // Both margins east of the thalweg: the profile extent never
        // crosses offset 0, so the P1-P4 vertical is extrapolated.
        let edges = EdgeCurves::new(
            vec![line_string![(x: 8400.0, y: -2000.0), (x: 8400.0, y: 12_000.0)]],
            vec![line_string![(x: 9000.0, y: -2000.0), (x: 9000.0, y: 12_000.0)]],
        );

        let records = Processor::new(&grids, &thalweg, &edges).run().unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.status, ProfileStatus::DegenerateP4);

            // Reduced confidence, but key points and metrics are still
            // reported in full.
            let kp = record.key_points.unwrap();
            assert!(kp.p4_extrapolated);
            assert_relative_eq!(kp.p4.offset_m, 0.0);

            let metrics = record.metrics.unwrap();
            assert_relative_eq!(metrics.wmax_m, 600.0);
            assert!(metrics.dmax_m > 0.0);
        }
    }

    #[test]
    fn test_no_data_stations_do_not_abort() {
        let grids = GridSet::new(v_canyon_dir("nodata")).unwrap();
        // Thalweg runs off the north end of the grid.
        let thalweg =
            Thalweg::new(line_string![(x: 5000.0, y: 500.0), (x: 5000.0, y: 9500.0)]).unwrap();
        let edges = edges();

        let records = Processor::new(&grids, &thalweg, &edges).run().unwrap();
        assert_eq!(records.len(), 5);

        let summary = StatusSummary::tally(&records);
        assert_eq!(summary.ok, 3);
        assert_eq!(summary.no_data, 2);
        assert_eq!(summary.total(), 5);

        for record in &records {
            if record.status == ProfileStatus::NoData {
                assert!(record.metrics.is_none());
                assert!(record.key_points.is_none());
            }
        }
    }

    #[test]
    fn test_default_params() {
        let params = Params::default();
        assert_relative_eq!(params.station_step_m, 2000.0);
        assert_relative_eq!(params.sample_step_m, 200.0);
        assert_relative_eq!(params.fallback_half_width_m, 8500.0);
    }
}
