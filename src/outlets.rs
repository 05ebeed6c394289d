// An outlet drains the last node of its link (and the overland portion of
// its cell) across the domain boundary. The boundary condition option
// decides how the outgoing depth is found: normal depth from Manning with
// the outlet-cell ground slope, or a depth driven by a time series.

use crate::forcing::TimeSeries;

#[derive(Debug, Clone)]
pub enum BoundaryDepth {
    /// dbcopt = 0: normal depth from Manning and the outlet ground slope.
    NormalDepth,
    /// dbcopt = 1: water depth at the boundary follows a time series (m).
    SpecifiedDepth(TimeSeries),
}

impl Default for BoundaryDepth {
    fn default() -> Self {
        BoundaryDepth::NormalDepth
    }
}

#[derive(Debug, Clone, Default)]
pub struct Outlet {
    pub name: String,
    pub row: usize,
    pub col: usize,
    pub slope: f64, //ground slope at the outlet (dimensionless)
    pub depth: BoundaryDepth,
}

impl Outlet {
    pub fn depth_is_specified(&self) -> bool {
        matches!(self.depth, BoundaryDepth::SpecifiedDepth(_))
    }
}
