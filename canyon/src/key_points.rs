//! The four key points of the Bührig profile construction.
//!
//! P1 is the thalweg (deepest) point, P2/P3 the left/right canyon
//! margins, and P4 the derived intersection of the vertical line
//! through P1 with the horizontal rim line at the higher of the two
//! margin elevations. All four live in the profile-local
//! (offset, elevation) plane; no bilateral symmetry is assumed.

use crate::Profile;
use bathydem::C;
use serde::Serialize;
use thiserror::Error;

/// A point in the profile-local plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyPoint {
    /// Signed horizontal offset from the thalweg, meters.
    pub offset_m: C,

    /// Elevation in meters (negative below datum).
    pub elevation_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyPoints {
    /// Thalweg point: offset 0, deepest valid sample within the
    /// search window.
    pub p1: KeyPoint,

    /// Left margin sample.
    pub p2: KeyPoint,

    /// Right margin sample.
    pub p3: KeyPoint,

    /// Rim intersection above P1. Derived, never sampled.
    pub p4: KeyPoint,

    /// P4's elevation lies above every sampled elevation, i.e. the
    /// construction extrapolates beyond the observed profile.
    pub p4_extrapolated: bool,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPointError {
    #[error("no valid elevation in the thalweg search window")]
    MissingData,

    #[error("margin offset unresolved or outside the sampled extent")]
    MissingEdge,
}

impl KeyPoints {
    /// Derives P1–P4 from a sampled profile.
    ///
    /// P1 searches within ±`window_half_width_m` of offset 0; ties on
    /// the minimum elevation resolve to the sample nearest the
    /// thalweg. P2/P3 take the sample nearest each margin's projected
    /// offset and must land inside the sampled extent on a valid
    /// sample.
    pub fn extract(profile: &Profile, window_half_width_m: C) -> Result<Self, KeyPointError> {
        let p1 = {
            let mut best: Option<(f64, C)> = None;
            for (&offset, elevation) in profile.offsets_m.iter().zip(&profile.elevations_m) {
                if offset.abs() > window_half_width_m {
                    continue;
                }
                let Some(elevation) = *elevation else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((e, o)) => elevation < e || (elevation == e && offset.abs() < o.abs()),
                };
                if better {
                    best = Some((elevation, offset));
                }
            }
            let (elevation_m, _) = best.ok_or(KeyPointError::MissingData)?;
            // P1 sits at the thalweg-relative origin by construction.
            KeyPoint {
                offset_m: 0.0,
                elevation_m,
            }
        };

        let margin_point = |edge: Option<crate::edges::EdgeOffset>| {
            let edge = edge.ok_or(KeyPointError::MissingEdge)?;
            let index = profile
                .nearest_sample(edge.offset_m)
                .ok_or(KeyPointError::MissingEdge)?;
            let elevation_m = profile.elevations_m[index].ok_or(KeyPointError::MissingEdge)?;
            Ok(KeyPoint {
                offset_m: profile.offsets_m[index],
                elevation_m,
            })
        };
        let p2 = margin_point(profile.left_edge)?;
        let p3 = margin_point(profile.right_edge)?;

        // P4 always exists algebraically. Flag it when the vertical
        // through P1 was never physically sampled (both margins on one
        // side of the thalweg) or the rim elevation exceeds every
        // observed sample; the metrics stay valid but confidence drops.
        let rim_elevation = p2.elevation_m.max(p3.elevation_m);
        let p4 = KeyPoint {
            offset_m: p1.offset_m,
            elevation_m: rim_elevation,
        };
        let p4_extrapolated = profile.nearest_sample(p1.offset_m).is_none()
            || profile
                .max_elevation()
                .is_none_or(|max| rim_elevation > max);

        Ok(Self {
            p1,
            p2,
            p3,
            p4,
            p4_extrapolated,
        })
    }
}
