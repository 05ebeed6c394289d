pub use timeseries::{SeriesCursor, TimeSeries};

pub mod timeseries;

/// A rain or snow gage: a point location and its intensity series.
/// Values are converted to m/s (of water or SWE) at load time.
#[derive(Debug, Clone, Default)]
pub struct Gage {
    pub name: String,
    pub x: f64, //easting of the gage (map units)
    pub y: f64, //northing of the gage (map units)
    pub series: TimeSeries,
}

/// Where precipitation comes from: point gages assigned to cells by
/// nearest distance, or a sequence of gridded intensity files read every
/// `freq_hours` hours.
#[derive(Debug, Clone)]
pub enum PrecipInput {
    Gages(Vec<Gage>),
    Grids { root: String, freq_hours: f64 },
}

impl Default for PrecipInput {
    fn default() -> Self {
        PrecipInput::Gages(Vec::new())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlowTarget {
    OverlandCell { row: usize, col: usize },
    ChannelNode { link: usize, node: usize },
}

/// An external water injection (or withdrawal, when negative), m3/s.
#[derive(Debug, Clone)]
pub struct FlowSource {
    pub name: String,
    pub target: FlowTarget,
    pub series: TimeSeries,
}

/// How a solids load series is specified.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadMode {
    /// Values are kg/day; converted to g/s when applied.
    MassPerDay,
    /// Values are concentrations (g/m3) carried by the co-located flow
    /// source; a negative flow draws at the local concentration instead.
    Concentration,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoadTarget {
    OverlandCell { row: usize, col: usize },
    /// Load spread uniformly over every in-domain cell, weighted by the
    /// overland surface area of each cell.
    OverlandDistributed,
    ChannelNode { link: usize, node: usize },
}

/// A point or distributed solids load for one solids class.
#[derive(Debug, Clone)]
pub struct SolidsLoad {
    pub name: String,
    pub class: usize, //solids class index (0-based)
    pub target: LoadTarget,
    pub mode: LoadMode,
    pub series: TimeSeries,
}

/// Specified boundary concentration at an outlet, per solids class (g/m3).
/// Only consulted when the outlet's boundary option is specified-depth.
#[derive(Debug, Clone)]
pub struct BoundaryConcentration {
    pub outlet: usize,
    pub class: usize,
    pub series: TimeSeries,
}

/// All forcing series of a run. Built at configuration time, read-only
/// afterwards; the position pointers live in `ForcingCursors`.
#[derive(Debug, Clone, Default)]
pub struct Forcings {
    pub precip: PrecipInput,
    pub snow_gages: Vec<Gage>,
    pub air_temp: Option<TimeSeries>, //degrees C, domain-wide
    pub flows: Vec<FlowSource>,
    pub loads: Vec<SolidsLoad>,
    pub boundary_concs: Vec<BoundaryConcentration>,
}

/// Position pointers for every forcing series, advanced once per step.
#[derive(Debug, Clone, Default)]
pub struct ForcingCursors {
    pub rain: Vec<SeriesCursor>,
    pub snow: Vec<SeriesCursor>,
    pub air_temp: SeriesCursor,
    pub flows: Vec<SeriesCursor>,
    pub loads: Vec<SeriesCursor>,
    pub boundary_concs: Vec<SeriesCursor>,
    pub outlet_depths: Vec<SeriesCursor>,
}

/// Interpolated forcing values for the current step.
#[derive(Debug, Clone, Default)]
pub struct ForcingValues {
    pub rain_by_gage: Vec<f64>,     //m/s per rain gage
    pub rain_grid: Vec<f64>,        //m/s per cell (gridded precip only)
    pub snow_by_gage: Vec<f64>,     //m/s (SWE) per snow gage
    pub air_temp: f64,              //degrees C
    pub flow: Vec<f64>,             //m3/s per flow source
    pub load: Vec<f64>,             //series units per solids load
    pub boundary_conc: Vec<f64>,    //g/m3 per boundary condition entry
    pub outlet_depth: Vec<f64>,     //m per outlet (specified-depth outlets)
}

impl Forcings {
    /// Build cursors positioned at the simulation start time.
    pub fn start_cursors(&self, simtime: f64, n_outlets: usize) -> ForcingCursors {
        let rain = match &self.precip {
            PrecipInput::Gages(gages) => {
                gages.iter().map(|g| g.series.start_cursor(simtime)).collect()
            }
            PrecipInput::Grids { .. } => Vec::new(),
        };
        ForcingCursors {
            rain,
            snow: self
                .snow_gages
                .iter()
                .map(|g| g.series.start_cursor(simtime))
                .collect(),
            air_temp: self
                .air_temp
                .as_ref()
                .map(|ts| ts.start_cursor(simtime))
                .unwrap_or_default(),
            flows: self
                .flows
                .iter()
                .map(|f| f.series.start_cursor(simtime))
                .collect(),
            loads: self
                .loads
                .iter()
                .map(|l| l.series.start_cursor(simtime))
                .collect(),
            boundary_concs: self
                .boundary_concs
                .iter()
                .map(|b| b.series.start_cursor(simtime))
                .collect(),
            outlet_depths: vec![SeriesCursor::default(); n_outlets],
        }
    }
}
