//! Bathymetric DEM grids in ESRI interchange formats.
//!
//! Two on-disk layouts are supported:
//!
//! 1. ESRI ASCII grid (`.asc`): a text header followed by row-major
//!    samples, northernmost row first. Always parsed into memory.
//! 2. ESRI float grid (`.flt` with `.hdr` sidecar): raw 32-bit float
//!    samples in the byte order named by the sidecar. Memory mapped.
//!
//! Grids are assumed to already be in a projected metric CRS (e.g.
//! UTM), so all lookups are planar point queries in meters.
//!
//! # References
//!
//! 1. [ESRI ASCII raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/esri-ascii-raster-format.htm)
//! 1. [ESRI float raster format](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/float-to-raster-function.htm)

mod error;

pub use crate::error::DemError;
use byteorder::{BigEndian as BE, LittleEndian as LE, ReadBytesExt};
use geo::geometry::Coord;
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    mem::size_of,
    path::Path,
};

/// Base floating point type used for all coordinates.
///
/// Samples themselves are stored as `f32`, which is what both grid
/// formats provide; coordinates stay `f64` so UTM eastings/northings
/// don't lose meters to rounding.
pub type C = f64;

/// Byte order of `.flt` sample data, from the `byteorder` sidecar
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    LsbFirst,
    MsbFirst,
}

/// A single elevation grid.
#[derive(Debug)]
pub struct Grid {
    header: GridHeader,
    samples: SampleStore,
}

#[derive(Debug)]
enum SampleStore {
    InMem(Box<[f32]>),
    MemMap(Mmap, SampleOrder),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> f32 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw, order) => {
                let start = index * size_of::<f32>();
                let end = start + size_of::<f32>();
                let mut bytes = &raw.as_ref()[start..end];
                match order {
                    SampleOrder::LsbFirst => bytes.read_f32::<LE>().unwrap(),
                    SampleOrder::MsbFirst => bytes.read_f32::<BE>().unwrap(),
                }
            }
        }
    }
}

impl Grid {
    /// Returns a Grid parsed from an ESRI ASCII (`.asc`) file.
    pub fn load_asc<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let mk_err = || DemError::Header(path.as_ref().to_owned());
        let text = std::fs::read_to_string(&path)?;

        let mut fields = HeaderFields::default();
        let mut tokens = text.split_whitespace().peekable();
        while let Some(tok) = tokens.peek() {
            if tok.chars().next().is_some_and(char::is_alphabetic) {
                let key = tokens.next().ok_or_else(mk_err)?.to_ascii_lowercase();
                let val = tokens.next().ok_or_else(mk_err)?;
                fields.set(&key, val).map_err(|()| mk_err())?;
            } else {
                break;
            }
        }
        let header = fields.finish().ok_or_else(mk_err)?;

        let mut samples = Vec::with_capacity(header.cols * header.rows);
        for tok in tokens {
            samples.push(tok.parse::<f32>().map_err(|_| mk_err())?);
        }
        if samples.len() != header.cols * header.rows {
            return Err(DemError::GridLen(
                samples.len() as u64,
                path.as_ref().to_owned(),
            ));
        }

        Ok(Self {
            header,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Grid using the memory-mapped `.flt` file as sample
    /// storage. Expects a `.hdr` sidecar next to `path`.
    pub fn memmap_flt<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let header = GridHeader::from_hdr(path.as_ref().with_extension("hdr"))?;

        let expected_len = (header.cols * header.rows * size_of::<f32>()) as u64;
        let actual_len = path.as_ref().metadata().map(|m| m.len())?;
        if actual_len != expected_len {
            return Err(DemError::GridLen(actual_len, path.as_ref().to_owned()));
        }

        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self {
            samples: SampleStore::MemMap(mmap, header.sample_order),
            header,
        })
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// Returns the elevation at the given projected coordinates, or
    /// `None` if `coord` falls outside this grid or on a no-data cell.
    pub fn get(&self, coord: Coord<C>) -> Option<f64> {
        let (idx_x, idx_y) = self.header.coord_to_xy(coord);
        #[allow(clippy::cast_possible_wrap)]
        if 0 <= idx_x
            && idx_x < self.header.cols as isize
            && 0 <= idx_y
            && idx_y < self.header.rows as isize
        {
            #[allow(clippy::cast_sign_loss)]
            let idx_1d = self
                .header
                .xy_to_linear_index((idx_x as usize, idx_y as usize));
            let sample = self.samples.get_unchecked(idx_1d);
            if sample == self.header.nodata || sample.is_nan() {
                None
            } else {
                Some(f64::from(sample))
            }
        } else {
            None
        }
    }
}

/// Grid geometry and no-data metadata, parseable without touching
/// sample data.
#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    /// Number of sample columns.
    cols: usize,

    /// Number of sample rows.
    rows: usize,

    /// Lower-left corner of the southwest-most cell.
    ll_corner: Coord<C>,

    /// Cell edge length in CRS units (meters).
    cellsize: C,

    /// Sentinel marking missing samples.
    nodata: f32,

    /// Byte order of `.flt` sample data.
    sample_order: SampleOrder,
}

impl GridHeader {
    /// Parses an ESRI `.hdr` sidecar file.
    pub fn from_hdr<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let mk_err = || DemError::Header(path.as_ref().to_owned());
        let text = std::fs::read_to_string(&path)?;
        let mut fields = HeaderFields::default();
        let mut tokens = text.split_whitespace();
        while let Some(key) = tokens.next() {
            let val = tokens.next().ok_or_else(mk_err)?;
            fields
                .set(&key.to_ascii_lowercase(), val)
                .map_err(|()| mk_err())?;
        }
        fields.finish().ok_or_else(mk_err)
    }

    /// Parses just the header block of an ESRI ASCII (`.asc`) file,
    /// without reading sample data.
    pub fn from_asc<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let mk_err = || DemError::Header(path.as_ref().to_owned());
        let reader = BufReader::new(File::open(&path)?);
        let mut fields = HeaderFields::default();
        for line in reader.lines() {
            let line = line?;
            let mut tokens = line.split_whitespace();
            let Some(key) = tokens.next() else { continue };
            if !key.chars().next().is_some_and(char::is_alphabetic) {
                break;
            }
            let val = tokens.next().ok_or_else(mk_err)?;
            fields
                .set(&key.to_ascii_lowercase(), val)
                .map_err(|()| mk_err())?;
        }
        fields.finish().ok_or_else(mk_err)
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cellsize(&self) -> C {
        self.cellsize
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    /// Returns the (southwest, northeast) outer corners of the grid.
    pub fn bounds(&self) -> (Coord<C>, Coord<C>) {
        #[allow(clippy::cast_precision_loss)]
        let ne = Coord {
            x: self.ll_corner.x + self.cols as C * self.cellsize,
            y: self.ll_corner.y + self.rows as C * self.cellsize,
        };
        (self.ll_corner, ne)
    }

    /// Whether `coord` falls within this grid's footprint.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        let (sw, ne) = self.bounds();
        sw.x <= coord.x && coord.x < ne.x && sw.y <= coord.y && coord.y < ne.y
    }
}

/// Private API.
impl GridHeader {
    /// Returns (column, row-from-south) indices for `coord`. May be
    /// out of range; callers bounds-check.
    fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        #[allow(clippy::cast_possible_truncation)]
        let x = ((coord.x - self.ll_corner.x) / self.cellsize).floor() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((coord.y - self.ll_corner.y) / self.cellsize).floor() as isize;
        (x, y)
    }

    /// Maps (column, row-from-south) to an index into the row-major,
    /// north-first sample layout.
    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.cols * (self.rows - y - 1) + x
    }
}

/// Accumulates `key value` header pairs from either format. Unknown
/// keys are ignored; ESRI writers emit extras like `nbits`.
#[derive(Default)]
struct HeaderFields {
    cols: Option<usize>,
    rows: Option<usize>,
    // (value, cell-center variant)
    xll: Option<(C, bool)>,
    yll: Option<(C, bool)>,
    cellsize: Option<C>,
    nodata: Option<f32>,
    sample_order: Option<SampleOrder>,
}

impl HeaderFields {
    fn set(&mut self, key: &str, val: &str) -> Result<(), ()> {
        match key {
            "ncols" => self.cols = Some(val.parse().map_err(|_| ())?),
            "nrows" => self.rows = Some(val.parse().map_err(|_| ())?),
            "xllcorner" => self.xll = Some((val.parse().map_err(|_| ())?, false)),
            "yllcorner" => self.yll = Some((val.parse().map_err(|_| ())?, false)),
            "xllcenter" => self.xll = Some((val.parse().map_err(|_| ())?, true)),
            "yllcenter" => self.yll = Some((val.parse().map_err(|_| ())?, true)),
            "cellsize" => self.cellsize = Some(val.parse().map_err(|_| ())?),
            "nodata_value" => self.nodata = Some(val.parse().map_err(|_| ())?),
            "byteorder" => {
                self.sample_order = Some(match val.to_ascii_uppercase().as_str() {
                    "LSBFIRST" => SampleOrder::LsbFirst,
                    "MSBFIRST" => SampleOrder::MsbFirst,
                    _ => return Err(()),
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Option<GridHeader> {
        let cellsize = self.cellsize?;
        let (x, x_center) = self.xll?;
        let (y, y_center) = self.yll?;
        let half = cellsize / 2.0;
        let ll_corner = Coord {
            x: if x_center { x - half } else { x },
            y: if y_center { y - half } else { y },
        };
        Some(GridHeader {
            cols: self.cols?,
            rows: self.rows?,
            ll_corner,
            cellsize,
            nodata: self.nodata.unwrap_or(-9999.0),
            sample_order: self.sample_order.unwrap_or(SampleOrder::LsbFirst),
        })
    }
}

#[cfg(test)]
mod ascii_grid {
    use super::{Coord, DemError, Grid};
    use std::path::PathBuf;

    fn temp_asc(name: &str, contents: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("bathydem_{}_{name}.asc", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    // 3x2 grid, 100 m cells, SW corner at (500000, 6200000).
    // Rows are north-first, so -10 is the NW-most sample.
    const SMALL: &str = "\
ncols         3
nrows         2
xllcorner     500000.0
yllcorner     6200000.0
cellsize      100.0
NODATA_value  -9999
-10 -20 -30
-40 -9999 -60
";

    #[test]
    fn test_load_and_get() {
        let grid = Grid::load_asc(temp_asc("small", SMALL)).unwrap();

        // Cell centers of the southern row.
        assert_eq!(
            grid.get(Coord {
                x: 500_050.0,
                y: 6_200_050.0
            }),
            Some(-40.0)
        );
        assert_eq!(
            grid.get(Coord {
                x: 500_250.0,
                y: 6_200_050.0
            }),
            Some(-60.0)
        );
        // Northern row.
        assert_eq!(
            grid.get(Coord {
                x: 500_050.0,
                y: 6_200_150.0
            }),
            Some(-10.0)
        );
    }

    #[test]
    fn test_nodata_returns_none() {
        let grid = Grid::load_asc(temp_asc("nodata", SMALL)).unwrap();
        assert_eq!(
            grid.get(Coord {
                x: 500_150.0,
                y: 6_200_050.0
            }),
            None
        );
    }

    #[test]
    fn test_out_of_bounds_returns_none() {
        let grid = Grid::load_asc(temp_asc("oob", SMALL)).unwrap();
        // A smidge west, east, south, and north of the footprint.
        for (x, y) in [
            (499_999.0, 6_200_050.0),
            (500_301.0, 6_200_050.0),
            (500_050.0, 6_199_999.0),
            (500_050.0, 6_200_201.0),
        ] {
            assert_eq!(grid.get(Coord { x, y }), None);
        }
    }

    #[test]
    fn test_cell_center_header_variant() {
        let centered = SMALL
            .replace("xllcorner     500000.0", "xllcenter     500050.0")
            .replace("yllcorner     6200000.0", "yllcenter     6200050.0");
        let grid = Grid::load_asc(temp_asc("centered", &centered)).unwrap();
        let (sw, ne) = grid.header().bounds();
        assert_eq!(
            sw,
            Coord {
                x: 500_000.0,
                y: 6_200_000.0
            }
        );
        assert_eq!(
            ne,
            Coord {
                x: 500_300.0,
                y: 6_200_200.0
            }
        );
    }

    #[test]
    fn test_header_only_parse() {
        use super::GridHeader;
        let path = temp_asc("hdronly", SMALL);
        let header = GridHeader::from_asc(&path).unwrap();
        assert_eq!(header, *Grid::load_asc(&path).unwrap().header());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let truncated = SMALL.rsplit_once('\n').unwrap().0.rsplit_once('\n').unwrap().0;
        let err = Grid::load_asc(temp_asc("short", truncated)).unwrap_err();
        assert!(matches!(err, DemError::GridLen(3, _)));
    }
}
