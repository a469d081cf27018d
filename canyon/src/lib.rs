//! Transverse-profile morphometrics for submarine canyons.
//!
//! The pipeline walks stations along a canyon thalweg, samples a
//! bathymetric transverse profile at each, extracts the four key
//! points of the profile construction, and solves the sidewall
//! triangles for width, depth, and steepness metrics. Stations are
//! independent; failures stay local to their record.

mod edges;
mod error;
mod grid_set;
mod key_points;
mod math;
mod metrics;
mod processor;
mod profile;
mod record;
mod thalweg;

pub use edges::{EdgeCurves, EdgeOffset, Side};
pub use error::CanyonError;
pub use grid_set::GridSet;
pub use key_points::{KeyPoint, KeyPointError, KeyPoints};
pub use math::law_of_cosines_angle;
pub use metrics::{GeometryError, MetricSet};
pub use processor::{Params, Processor};
pub use profile::{Profile, ProfileBuilder, ProfileKind};
pub use record::{ProfileRecord, ProfileStatus, StatusSummary};
pub use thalweg::{Station, Thalweg};

pub use bathydem;
pub use geo;
