use crate::{edges::EdgeOffset, CanyonError, GridSet, Station};
use bathydem::C;
use log::debug;

/// How a profile's transverse extent was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// Extent anchored to both canyon margins, extended a fixed
    /// distance beyond each.
    EdgeConstrained,

    /// Fixed-length orthogonal extent used when a margin does not
    /// cross the transverse line. Kept for coverage but flagged for
    /// expert review.
    FallbackOrthogonal,
}

/// Elevation samples along the transverse line at one station.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub station: Station,

    pub kind: ProfileKind,

    /// Signed horizontal offsets from the thalweg, strictly
    /// increasing; negative offsets lie on the left bank.
    pub offsets_m: Vec<C>,

    /// Elevation at each offset. `None` marks no-data so indices stay
    /// aligned with `offsets_m`.
    pub elevations_m: Vec<Option<f64>>,

    /// The margins resolved onto the transverse axis, when available.
    pub left_edge: Option<EdgeOffset>,
    pub right_edge: Option<EdgeOffset>,
}

impl Profile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            station: None,
            step_size_m: None,
            left_edge: None,
            right_edge: None,
            edge_extension_m: 3000.0,
            fallback_half_width_m: 8500.0,
        }
    }

    /// Elevation at the station's own location (offset 0), if sampled
    /// and valid.
    pub fn origin_elevation(&self) -> Option<f64> {
        self.offsets_m
            .iter()
            .position(|&offset| offset == 0.0)
            .and_then(|i| self.elevations_m[i])
    }

    /// Highest valid elevation in the profile.
    pub fn max_elevation(&self) -> Option<f64> {
        self.elevations_m
            .iter()
            .flatten()
            .copied()
            .fold(None, |max, e| Some(max.map_or(e, |m| f64::max(m, e))))
    }

    /// Index of the sample nearest `offset_m`, or `None` when the
    /// offset falls outside the sampled extent.
    pub fn nearest_sample(&self, offset_m: C) -> Option<usize> {
        let (first, last) = (self.offsets_m.first()?, self.offsets_m.last()?);
        if offset_m < *first || offset_m > *last {
            return None;
        }
        self.offsets_m
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (*a - offset_m).abs();
                let db = (*b - offset_m).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
    }
}

pub struct ProfileBuilder {
    station: Option<Station>,

    /// Distance between samples along the transverse line.
    step_size_m: Option<C>,

    left_edge: Option<EdgeOffset>,
    right_edge: Option<EdgeOffset>,

    /// Reach beyond each margin for edge-constrained extents.
    edge_extension_m: C,

    /// Half-length of the fixed fallback extent.
    fallback_half_width_m: C,
}

impl ProfileBuilder {
    pub fn station(mut self, station: Station) -> Self {
        self.station = Some(station);
        self
    }

    pub fn step_size(mut self, meters: C) -> Self {
        self.step_size_m = Some(meters);
        self
    }

    pub fn left_edge(mut self, edge: Option<EdgeOffset>) -> Self {
        self.left_edge = edge;
        self
    }

    pub fn right_edge(mut self, edge: Option<EdgeOffset>) -> Self {
        self.right_edge = edge;
        self
    }

    pub fn edge_extension(mut self, meters: C) -> Self {
        self.edge_extension_m = meters;
        self
    }

    pub fn fallback_half_width(mut self, meters: C) -> Self {
        self.fallback_half_width_m = meters;
        self
    }

    pub fn build(&self, grids: &GridSet) -> Result<Profile, CanyonError> {
        let (Some(station), Some(step_size_m)) = (self.station, self.step_size_m) else {
            return Err(CanyonError::Builder);
        };
        if step_size_m <= 0.0 || self.fallback_half_width_m <= 0.0 || self.edge_extension_m < 0.0 {
            return Err(CanyonError::Builder);
        }

        let (kind, lo, hi) = match (self.left_edge, self.right_edge) {
            (Some(left), Some(right)) if left.intersected && right.intersected => {
                let near = left.offset_m.min(right.offset_m) - self.edge_extension_m;
                let far = left.offset_m.max(right.offset_m) + self.edge_extension_m;
                (ProfileKind::EdgeConstrained, near, far)
            }
            _ => (
                ProfileKind::FallbackOrthogonal,
                -self.fallback_half_width_m,
                self.fallback_half_width_m,
            ),
        };

        // Sample at integer multiples of the step so offset 0 (the
        // station itself) is always on the sampling comb.
        #[allow(clippy::cast_possible_truncation)]
        let k_lo = (lo / step_size_m).ceil() as i64;
        #[allow(clippy::cast_possible_truncation)]
        let k_hi = (hi / step_size_m).floor() as i64;

        #[allow(clippy::cast_sign_loss)]
        let samples = (k_hi - k_lo + 1).max(0) as usize;
        let mut offsets_m = Vec::with_capacity(samples);
        let mut elevations_m = Vec::with_capacity(samples);
        for k in k_lo..=k_hi {
            #[allow(clippy::cast_precision_loss)]
            let offset = k as C * step_size_m;
            offsets_m.push(offset);
            elevations_m.push(grids.elevation(station.offset_point(offset))?);
        }

        debug!(
            "profile {}; kind: {kind:?}, samples: {}, extent: [{lo}, {hi}] m",
            station.id,
            offsets_m.len(),
        );

        Ok(Profile {
            station,
            kind,
            offsets_m,
            elevations_m,
            left_edge: self.left_edge,
            right_edge: self.right_edge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Profile, ProfileKind};
    use crate::{edges::EdgeOffset, GridSet, Station};
    use approx::assert_relative_eq;
    use geo::geometry::Coord;
    use std::fmt::Write;
    use std::path::PathBuf;

    /// Writes a V-shaped canyon running north-south: elevation depends
    /// only on x, with the axis at x = 5000.
    fn v_canyon_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("canyon_profile_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let (cols, rows, cellsize) = (101, 3, 100.0);
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
                let elevation = -500.0 + 0.05 * (x - 5000.0).abs();
                write!(asc, "{elevation} ").unwrap();
            }
            asc.push('\n');
        }
        std::fs::write(dir.join("v_canyon.asc"), asc).unwrap();
        dir
    }

    fn station() -> Station {
        Station {
            id: 7,
            distance_m: 14_000.0,
            position: Coord { x: 5000.0, y: 150.0 },
            tangent: Coord { x: 0.0, y: 1.0 },
        }
    }

    fn edge(offset_m: f64) -> Option<EdgeOffset> {
        Some(EdgeOffset {
            offset_m,
            intersected: true,
        })
    }

    #[test]
    fn test_edge_constrained_extent() {
        let grids = GridSet::new(v_canyon_dir("constrained")).unwrap();
        let profile = Profile::builder()
            .station(station())
            .step_size(200.0)
            .left_edge(edge(-300.0))
            .right_edge(edge(250.0))
            .edge_extension(3000.0)
            .build(&grids)
            .unwrap();

        assert_eq!(profile.kind, ProfileKind::EdgeConstrained);
        // Extent [-3300, 3250] snapped to the 200 m comb.
        assert_relative_eq!(*profile.offsets_m.first().unwrap(), -3200.0);
        assert_relative_eq!(*profile.offsets_m.last().unwrap(), 3200.0);
        assert_eq!(profile.offsets_m.len(), 33);

        // Offsets are strictly increasing and aligned with samples.
        assert_eq!(profile.offsets_m.len(), profile.elevations_m.len());
        for pair in profile.offsets_m.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_fallback_extent_and_coverage_gaps() {
        let grids = GridSet::new(v_canyon_dir("fallback")).unwrap();
        let profile = Profile::builder()
            .station(station())
            .step_size(200.0)
            .build(&grids)
            .unwrap();

        assert_eq!(profile.kind, ProfileKind::FallbackOrthogonal);
        assert_relative_eq!(*profile.offsets_m.first().unwrap(), -8400.0);
        assert_relative_eq!(*profile.offsets_m.last().unwrap(), 8400.0);

        // The grid only spans x ∈ [0, 10100]: samples beyond it are
        // kept as no-data, not dropped.
        assert_eq!(profile.elevations_m.first().unwrap(), &None);
        assert!(profile.origin_elevation().is_some());
        assert_relative_eq!(profile.origin_elevation().unwrap(), -497.5);
    }

    #[test]
    fn test_missing_params() {
        let grids = GridSet::new(v_canyon_dir("params")).unwrap();
        assert!(Profile::builder().station(station()).build(&grids).is_err());
    }

    #[test]
    fn test_nearest_sample() {
        let profile = Profile {
            station: station(),
            kind: ProfileKind::FallbackOrthogonal,
            offsets_m: vec![-200.0, 0.0, 200.0, 400.0],
            elevations_m: vec![Some(-1.0), Some(-2.0), Some(-3.0), Some(-4.0)],
            left_edge: None,
            right_edge: None,
        };
        assert_eq!(profile.nearest_sample(90.0), Some(1));
        assert_eq!(profile.nearest_sample(110.0), Some(2));
        assert_eq!(profile.nearest_sample(400.0), Some(3));
        assert_eq!(profile.nearest_sample(401.0), None);
        assert_eq!(profile.nearest_sample(-201.0), None);
    }
}
