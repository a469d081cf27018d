//! DEM grid file aggregator.

use crate::CanyonError;
use bathydem::{Grid, GridHeader, C};
use dashmap::{mapref::entry::Entry, DashMap};
use geo::geometry::Coord;
use log::debug;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// A directory of DEM grid files treated as one elevation surface.
///
/// Headers are scanned up front so coverage questions are cheap;
/// sample data is loaded on first hit. `.asc` grids are parsed into
/// memory, `.flt` grids are memory mapped. Queries take `&self`, so a
/// `GridSet` can be shared across worker threads.
#[derive(Debug)]
pub struct GridSet {
    /// Header and path of every grid found in the directory.
    members: Vec<(GridHeader, PathBuf)>,

    /// Grids which have been loaded on demand.
    grids: DashMap<PathBuf, Arc<Grid>>,
}

impl GridSet {
    pub fn new<P: AsRef<Path>>(grid_dir: P) -> Result<Self, CanyonError> {
        let mut members = Vec::new();

        for entry in std::fs::read_dir(&grid_dir)? {
            let path = entry?.path();
            match path.extension().and_then(std::ffi::OsStr::to_str) {
                Some("asc") => members.push((GridHeader::from_asc(&path)?, path)),
                Some("flt") => members.push((GridHeader::from_hdr(path.with_extension("hdr"))?, path)),
                _ => {}
            }
        }

        if members.is_empty() {
            return Err(CanyonError::Path(grid_dir.as_ref().to_owned()));
        }

        Ok(Self {
            members,
            grids: DashMap::new(),
        })
    }

    /// Returns the elevation at `coord`, or `None` when no grid covers
    /// it or the covering cell is no-data.
    pub fn elevation(&self, coord: Coord<C>) -> Result<Option<f64>, CanyonError> {
        match self.get(coord)? {
            Some(grid) => Ok(grid.get(coord)),
            None => Ok(None),
        }
    }

    /// Returns the grid covering `coord`, if any, loading it from disk
    /// on first use.
    pub fn get(&self, coord: Coord<C>) -> Result<Option<Arc<Grid>>, CanyonError> {
        let Some((_, path)) = self
            .members
            .iter()
            .find(|(header, _)| header.contains(coord))
        else {
            return Ok(None);
        };

        if let Entry::Vacant(e) = self.grids.entry(path.clone()) {
            debug!("loading {path:?}");
            let grid = match path.extension().and_then(std::ffi::OsStr::to_str) {
                Some("flt") => Grid::memmap_flt(path)?,
                _ => Grid::load_asc(path)?,
            };
            e.insert(Arc::new(grid));
        }

        Ok(self.grids.get(path).as_deref().cloned())
    }
}
