use crate::Station;
use bathydem::C;
use geo::{
    algorithm::line_intersection::{line_intersection, LineIntersection},
    geometry::{Line, LineString},
};

/// Which canyon margin a curve describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A margin resolved onto a station's transverse axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOffset {
    /// Signed offset on the transverse axis (negative = left bank).
    pub offset_m: C,

    /// Whether the margin actually crosses the transverse line.
    /// Projected (non-crossing) offsets still locate P2/P3, but the
    /// profile extent falls back to its fixed length.
    pub intersected: bool,
}

/// The expert-digitized left and right canyon-margin polylines.
pub struct EdgeCurves {
    left: Vec<LineString<C>>,
    right: Vec<LineString<C>>,
}

impl EdgeCurves {
    pub fn new(left: Vec<LineString<C>>, right: Vec<LineString<C>>) -> Self {
        Self { left, right }
    }

    /// Resolves one margin to a signed offset on `station`'s
    /// transverse axis, searching within ±`reach_m`.
    ///
    /// Intersections of the margin with the transverse line win; with
    /// several crossings the one nearest the thalweg is used. When the
    /// margin does not cross, the vertex nearest the transverse line
    /// (smallest along-tangent distance) is projected instead.
    pub fn offset_of(&self, side: Side, station: &Station, reach_m: C) -> Option<EdgeOffset> {
        let curves = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };

        let transverse = Line::new(
            station.offset_point(-reach_m),
            station.offset_point(reach_m),
        );

        let mut nearest_crossing: Option<C> = None;
        for segment in curves.iter().flat_map(LineString::lines) {
            let crossings = match line_intersection(transverse, segment) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => vec![intersection],
                Some(LineIntersection::Collinear { intersection }) => {
                    vec![intersection.start, intersection.end]
                }
                None => vec![],
            };
            for crossing in crossings {
                let offset = station.offset_of(crossing);
                if nearest_crossing.is_none_or(|best| offset.abs() < best.abs()) {
                    nearest_crossing = Some(offset);
                }
            }
        }
        if let Some(offset_m) = nearest_crossing {
            return Some(EdgeOffset {
                offset_m,
                intersected: true,
            });
        }

        // No crossing: project the vertex closest to the transverse
        // line. The sampled-extent check downstream rejects offsets
        // that land outside the profile.
        let mut best: Option<(C, C)> = None;
        for vertex in curves.iter().flat_map(|line| line.0.iter()) {
            let offset = station.offset_of(*vertex);
            if offset.abs() > reach_m {
                continue;
            }
            let advance = station.advance_of(*vertex).abs();
            if best.is_none_or(|(best_advance, _)| advance < best_advance) {
                best = Some((advance, offset));
            }
        }
        best.map(|(_, offset_m)| EdgeOffset {
            offset_m,
            intersected: false,
        })
    }
}
