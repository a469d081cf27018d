use crate::{
    math::{direction_at, point_at},
    CanyonError,
};
use bathydem::C;
use geo::{geometry::{Coord, LineString}, EuclideanLength};
use log::debug;

/// One sampling position along the thalweg. Identifies a single
/// transverse profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub id: usize,

    /// Chainage: arc-length distance from the thalweg head, meters.
    pub distance_m: C,

    /// Position in the projected CRS.
    pub position: Coord<C>,

    /// Local unit tangent of the thalweg, pointing downstream.
    pub tangent: Coord<C>,
}

impl Station {
    /// Unit normal of the transverse axis. Points to the right of the
    /// downstream direction, so negative offsets lie on the left bank
    /// and positive offsets on the right.
    pub fn normal(&self) -> Coord<C> {
        Coord {
            x: self.tangent.y,
            y: -self.tangent.x,
        }
    }

    /// Returns the map position at signed `offset_m` along the
    /// transverse axis.
    pub fn offset_point(&self, offset_m: C) -> Coord<C> {
        let n = self.normal();
        Coord {
            x: self.position.x + n.x * offset_m,
            y: self.position.y + n.y * offset_m,
        }
    }

    /// Signed transverse offset of an arbitrary map point.
    pub fn offset_of(&self, coord: Coord<C>) -> C {
        let n = self.normal();
        (coord.x - self.position.x) * n.x + (coord.y - self.position.y) * n.y
    }

    /// Along-tangent component of an arbitrary map point, i.e. its
    /// distance from the transverse line.
    pub fn advance_of(&self, coord: Coord<C>) -> C {
        (coord.x - self.position.x) * self.tangent.x + (coord.y - self.position.y) * self.tangent.y
    }
}

/// The line of maximum depth along the canyon, as a polyline in a
/// projected metric CRS.
pub struct Thalweg {
    line: LineString<C>,
    length_m: C,
}

impl Thalweg {
    pub fn new(line: LineString<C>) -> Result<Self, CanyonError> {
        let length_m = line.euclidean_length();
        if line.0.len() < 2 || length_m <= 0.0 {
            return Err(CanyonError::EmptyThalweg);
        }
        Ok(Self { line, length_m })
    }

    pub fn length_m(&self) -> C {
        self.length_m
    }

    /// Point at chainage `distance_m`, clamped to the polyline ends.
    pub fn point_at(&self, distance_m: C) -> Coord<C> {
        // Unwrap is fine; construction requires at least two vertices.
        point_at(&self.line, distance_m).unwrap()
    }

    /// Stations every `step_m` of chainage starting at 0, with the
    /// local tangent estimated over ±`tangent_delta_m`. Positions with
    /// a degenerate tangent are skipped; their ids are still consumed
    /// so station ids stay stable under parameter changes.
    pub fn stations(&self, step_m: C, tangent_delta_m: C) -> Vec<Station> {
        let mut stations = Vec::new();
        let mut id = 0;
        let mut distance_m = 0.0;
        while distance_m < self.length_m {
            match direction_at(&self.line, distance_m, tangent_delta_m, self.length_m) {
                Some(tangent) => stations.push(Station {
                    id,
                    distance_m,
                    position: self.point_at(distance_m),
                    tangent,
                }),
                None => debug!("degenerate tangent at station {id}, chainage {distance_m} m"),
            }
            id += 1;
            distance_m += step_m;
        }
        stations
    }
}
