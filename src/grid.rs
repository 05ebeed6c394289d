// Design concepts:
// -----------------
// The master grid is a regular square raster. Every per-cell property is
// stored in a flat row-major Vec and addressed through idx(row, col), so
// nothing downstream ever does its own 2-D arithmetic. Cells outside the
// watershed carry CellKind::NoData and are skipped by every sweep.

/// Depths and snow water equivalents below this value (m) are round-off
/// and get clamped to zero rather than treated as instability.
pub const TOLERANCE: f64 = 1.0e-9;

/// Gravitational acceleration (m/s2).
pub const GRAVITY: f64 = 9.81;

/// Density of water (kg/m3).
pub const DENSITY_WATER: f64 = 1000.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellKind {
    #[default]
    NoData,
    /// Cell is in the domain, overland flow only.
    Overland,
    /// Cell is in the domain and carries a channel segment.
    Channel,
}

impl CellKind {
    pub fn in_domain(&self) -> bool {
        *self != CellKind::NoData
    }
}

/// The master grid: geometry, domain mask, and the static per-cell
/// classification rasters (elevation, ground slope, land use, soil type).
#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub nrows: usize,
    pub ncols: usize,
    pub cell_size: f64, //side length w of a square cell (m)
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub nodata: f64, //nodata marker carried through to output grids

    pub mask: Vec<CellKind>,
    pub elevation: Vec<f64>, //ground surface elevation (m)
    pub slope: Vec<f64>,     //ground slope (dimensionless)
    pub land_use: Vec<usize>, //index into the land use table
    pub soil: Vec<usize>,     //index into the soil table
}

impl Grid {
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.ncols + col
    }

    pub fn n_cells(&self) -> usize {
        self.nrows * self.ncols
    }

    /// Plan area of one cell (m2).
    pub fn cell_area(&self) -> f64 {
        self.cell_size * self.cell_size
    }

    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.nrows && (col as usize) < self.ncols
    }

    pub fn is_in_domain(&self, row: usize, col: usize) -> bool {
        self.mask[self.idx(row, col)].in_domain()
    }

    pub fn is_channel_cell(&self, row: usize, col: usize) -> bool {
        self.mask[self.idx(row, col)] == CellKind::Channel
    }

    /// Iterate the (row, col) pairs of all in-domain cells in row-major order.
    pub fn domain_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nrows).flat_map(move |r| {
            (0..self.ncols).filter_map(move |c| {
                if self.is_in_domain(r, c) {
                    Some((r, c))
                } else {
                    None
                }
            })
        })
    }
}
