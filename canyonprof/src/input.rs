//! GeoJSON readers for the thalweg and margin polylines.
//!
//! Only what the survey inputs actually use is supported: `LineString`
//! and `MultiLineString` geometries, bare or wrapped in features.
//! Coordinates are taken as x/y in the same projected CRS as the DEM;
//! any z values are ignored.

use anyhow::{anyhow, Context, Error as AnyError};
use canyon::geo::geometry::{Coord, LineString};
use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};

#[derive(Deserialize)]
#[serde(untagged)]
enum GeoJson {
    Collection(FeatureCollection),
    Single(Geometry),
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: serde_json::Map<String, serde_json::Value>,
    geometry: Geometry,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
}

impl Geometry {
    fn into_lines(self) -> Result<Vec<LineString<f64>>, AnyError> {
        let parts = match self {
            Self::LineString { coordinates } => vec![coordinates],
            Self::MultiLineString { coordinates } => coordinates,
        };
        parts
            .into_iter()
            .map(|part| {
                part.into_iter()
                    .map(|position| match position[..] {
                        [x, y, ..] => Ok(Coord { x, y }),
                        _ => Err(anyhow!("position with fewer than 2 ordinates")),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(LineString::new)
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<GeoJson, AnyError> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

/// Reads the thalweg polyline: the first line string in the file.
pub fn read_thalweg(path: &Path) -> Result<LineString<f64>, AnyError> {
    let lines = match read(path)? {
        GeoJson::Single(geometry) => geometry.into_lines()?,
        GeoJson::Collection(collection) => collection
            .features
            .into_iter()
            .map(|feature| feature.geometry.into_lines())
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect(),
    };
    lines
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no line string in {}", path.display()))
}

/// Reads the margin polylines, split by each feature's "side" property
/// into (left, right).
pub fn read_edges(path: &Path) -> Result<(Vec<LineString<f64>>, Vec<LineString<f64>>), AnyError> {
    let GeoJson::Collection(collection) = read(path)? else {
        return Err(anyhow!(
            "{} must be a FeatureCollection with \"side\" properties",
            path.display()
        ));
    };

    let mut left = Vec::new();
    let mut right = Vec::new();
    for feature in collection.features {
        let side = feature
            .properties
            .get("side")
            .and_then(serde_json::Value::as_str);
        let bank = match side {
            Some("left") => &mut left,
            Some("right") => &mut right,
            _ => return Err(anyhow!("margin feature without a left/right \"side\"")),
        };
        bank.extend(feature.geometry.into_lines()?);
    }
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::{read_edges, read_thalweg};
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("canyonprof_input_{}_{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_bare_line_string_thalweg() {
        let path = write_temp(
            "bare.json",
            r#"{"type": "LineString", "coordinates": [[0.0, 1.0], [100.0, 2.0, 7.5]]}"#,
        );
        let line = read_thalweg(&path).unwrap();
        assert_eq!(line.0.len(), 2);
        assert_eq!(line.0[1].x, 100.0);
        assert_eq!(line.0[1].y, 2.0);
    }

    #[test]
    fn test_feature_collection_thalweg() {
        let path = write_temp(
            "fc.json",
            r#"{
              "type": "FeatureCollection",
              "features": [{
                "type": "Feature",
                "properties": {"name": "axis"},
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1], [2, 0]]}
              }]
            }"#,
        );
        assert_eq!(read_thalweg(&path).unwrap().0.len(), 3);
    }

    #[test]
    fn test_edges_split_by_side() {
        let path = write_temp(
            "edges.json",
            r#"{
              "type": "FeatureCollection",
              "features": [
                {
                  "type": "Feature",
                  "properties": {"side": "left"},
                  "geometry": {"type": "LineString", "coordinates": [[0, 0], [0, 1]]}
                },
                {
                  "type": "Feature",
                  "properties": {"side": "right"},
                  "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[5, 0], [5, 1]], [[6, 1], [6, 2]]]
                  }
                }
              ]
            }"#,
        );
        let (left, right) = read_edges(&path).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn test_edges_without_side_fail() {
        let path = write_temp(
            "unsided.json",
            r#"{
              "type": "FeatureCollection",
              "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [0, 1]]}
              }]
            }"#,
        );
        assert!(read_edges(&path).is_err());
    }
}
