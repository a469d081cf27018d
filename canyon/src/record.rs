use crate::{KeyPoints, MetricSet, Profile, Station};
use serde::Serialize;
use std::fmt;

/// Per-station outcome. Failures are local: a non-`Ok` status never
/// aborts the batch, and no metric is substituted with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Ok,

    /// The raster has no valid elevation at the station itself.
    NoData,

    /// The P1 search window holds only no-data samples.
    MissingData,

    /// A margin could not be resolved inside the sampled extent.
    MissingEdge,

    /// P4 extrapolates beyond the sampled profile; metrics are still
    /// reported, with reduced geomorphological confidence.
    DegenerateP4,

    /// The key points form a degenerate or numerically invalid
    /// triangle.
    InvalidGeometry,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoData => "no_data",
            Self::MissingData => "missing_data",
            Self::MissingEdge => "missing_edge",
            Self::DegenerateP4 => "degenerate_p4",
            Self::InvalidGeometry => "invalid_geometry",
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived for one station. Created once, never mutated
/// after metric computation.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub profile: Profile,
    pub key_points: Option<KeyPoints>,
    pub metrics: Option<MetricSet>,
    pub status: ProfileStatus,
}

impl ProfileRecord {
    pub fn station(&self) -> &Station {
        &self.profile.station
    }
}

/// Per-status counts across a batch, for targeting expert review.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub ok: usize,
    pub no_data: usize,
    pub missing_data: usize,
    pub missing_edge: usize,
    pub degenerate_p4: usize,
    pub invalid_geometry: usize,
}

impl StatusSummary {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a ProfileRecord>) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status {
                ProfileStatus::Ok => summary.ok += 1,
                ProfileStatus::NoData => summary.no_data += 1,
                ProfileStatus::MissingData => summary.missing_data += 1,
                ProfileStatus::MissingEdge => summary.missing_edge += 1,
                ProfileStatus::DegenerateP4 => summary.degenerate_p4 += 1,
                ProfileStatus::InvalidGeometry => summary.invalid_geometry += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.ok
            + self.no_data
            + self.missing_data
            + self.missing_edge
            + self.degenerate_p4
            + self.invalid_geometry
    }
}

#[cfg(test)]
mod tests {
    use super::{ProfileStatus, StatusSummary};

    #[test]
    fn test_status_names() {
        assert_eq!(ProfileStatus::Ok.to_string(), "ok");
        assert_eq!(ProfileStatus::DegenerateP4.to_string(), "degenerate_p4");
    }

    #[test]
    fn test_empty_tally() {
        let records: Vec<super::ProfileRecord> = Vec::new();
        let summary = StatusSummary::tally(&records);
        assert_eq!(summary, StatusSummary::default());
        assert_eq!(summary.total(), 0);
    }
}
