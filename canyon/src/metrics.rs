//! Bührig-type transverse metrics, solved with the law of cosines.
//!
//! The triangles at P1 are scalene in general: the profile is not
//! assumed orthogonal or bilaterally symmetric, so no right angle is
//! available and the Pythagorean shortcut would be wrong. Each
//! sidewall angle comes from the three side lengths alone.

use crate::{math::law_of_cosines_angle, KeyPoints};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("key points coincide; triangle side collapsed")]
    DegenerateTriangle,

    #[error("side lengths do not form a triangle")]
    InvalidTriangle,
}

/// The canonical metric triple plus its decomposition, one per
/// profile. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSet {
    /// Maximum width: horizontal distance between the margins.
    pub wmax_m: f64,

    /// Horizontal split of Wmax at P4, left and right.
    pub w1_m: f64,
    pub w2_m: f64,

    /// Maximum incision depth: vertical distance P1 to P4.
    pub dmax_m: f64,

    /// Chord lengths P1-P2 and P1-P3 in the profile plane.
    pub h1_m: f64,
    pub h2_m: f64,

    /// Sidewall angles at P1 for the left and right triangles,
    /// degrees.
    pub b1_deg: f64,
    pub b2_deg: f64,

    /// Maximum sidewall steepness: the larger of B1 and B2.
    pub swmax_deg: f64,

    /// Wmax / Dmax. `None` when Dmax is zero.
    pub aspect_ratio: Option<f64>,
}

impl MetricSet {
    /// Computes all metrics from the four key points. Pure: identical
    /// inputs yield bit-identical output.
    ///
    /// `cos_clamp_tolerance` bounds how far the arccos argument may
    /// overshoot [-1, 1] from floating-point noise before the triangle
    /// is rejected as invalid.
    pub fn from_key_points(
        points: &KeyPoints,
        cos_clamp_tolerance: f64,
    ) -> Result<Self, GeometryError> {
        let KeyPoints { p1, p2, p3, p4, .. } = points;

        let dmax_m = (p4.elevation_m - p1.elevation_m).abs();
        let wmax_m = (p3.offset_m - p2.offset_m).abs();
        let w1_m = (p4.offset_m - p2.offset_m).abs();
        let w2_m = (p3.offset_m - p4.offset_m).abs();
        let h1_m = (p1.offset_m - p2.offset_m).hypot(p1.elevation_m - p2.elevation_m);
        let h2_m = (p1.offset_m - p3.offset_m).hypot(p1.elevation_m - p3.elevation_m);

        if dmax_m <= 0.0 || h1_m <= 0.0 || h2_m <= 0.0 {
            return Err(GeometryError::DegenerateTriangle);
        }

        let b1_deg = law_of_cosines_angle(dmax_m, h1_m, w1_m, cos_clamp_tolerance)
            .ok_or(GeometryError::InvalidTriangle)?
            .to_degrees();
        let b2_deg = law_of_cosines_angle(dmax_m, h2_m, w2_m, cos_clamp_tolerance)
            .ok_or(GeometryError::InvalidTriangle)?
            .to_degrees();

        let swmax_deg = b1_deg.max(b2_deg);
        let aspect_ratio = (dmax_m > 0.0).then(|| wmax_m / dmax_m);

        Ok(Self {
            wmax_m,
            w1_m,
            w2_m,
            dmax_m,
            h1_m,
            h2_m,
            b1_deg,
            b2_deg,
            swmax_deg,
            aspect_ratio,
        })
    }
}
