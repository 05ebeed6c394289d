// Design concepts:
// -----------------
// The Model owns everything that is fixed for a run: the grid, the channel
// network and geometry, the classification tables, the solids catalog, the
// outlets, the forcing series and the option switches. All of it is built
// by the deck reader and read-only once configure() has passed.
//
// Everything that changes during a run lives in RunState. Each phase of a
// time step reads previous-step state and writes the staged *_new buffers
// (or phase-local flux arrays); buffers are swapped at the end of the
// step, so no phase ever observes a partial update from the same step.

use std::collections::HashMap;
use uuid::Uuid;

use crate::forcing::{ForcingCursors, ForcingValues, Forcings, PrecipInput};
use crate::grid::Grid;
use crate::hydrology::channel::ChannelGeometry;
use crate::hydrology::{channel, floodplain, infiltration, interception, overland};
use crate::ledger::{Ledger, MassBalanceTotals};
use crate::outlets::{BoundaryDepth, Outlet};
use crate::solids::class::SolidsCatalog;
use crate::solids::stack::{SedimentLayer, SedimentStack};
use crate::solids::transport;
use crate::topology::{ChannelNetwork, Direction, N_SOURCES, SRC_BOUNDARY};

/// One land use class referenced by the land use raster.
#[derive(Debug, Clone, Default)]
pub struct LandUseClass {
    pub name: String,
    pub manning_n: f64,
    pub interception_depth: f64, //storage satisfied before rain reaches the ground (m)
    pub depression_storage: f64, //ponded depth that does not contribute to flow (m)
    pub erosion_coeff: f64,      //excess-shear erosion yield coefficient ay (kg/m2)
    pub usle_c: f64,
    pub usle_p: f64,
}

/// One soil type referenced by the soil raster.
#[derive(Debug, Clone, Default)]
pub struct SoilType {
    pub name: String,
    pub kh: f64,                //saturated hydraulic conductivity (m/s)
    pub capillary_suction: f64, //Green-Ampt capillary suction head (m)
    pub moisture_deficit: f64,  //saturation minus initial moisture content
    pub erosion_exponent: f64,  //excess-shear exponent mexp
    pub usle_k: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SnowOption {
    #[default]
    None,
    /// Gross rainfall falls as SWE whenever air temperature <= 0 C.
    RainPartition,
    /// Gross SWE comes from dedicated snow gage series.
    Gages,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum MeltOption {
    #[default]
    None,
    /// Degree-day snowmelt; ddf in m of SWE per degree C per second.
    DegreeDay { ddf: f64 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OverlandErosionMode {
    /// Erosion limited by a transport capacity (modified Kilinc-Richardson).
    #[default]
    Capacity,
    /// Excess-shear erosion.
    ExcessShear,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ChannelErosionMode {
    /// Capacity-limited erosion against total shear.
    #[default]
    Capacity,
    /// Capacity-limited erosion against the grain fraction of shear.
    CapacityGrain,
    /// Excess-shear erosion against the grain fraction of shear.
    ExcessShear,
}

impl ChannelErosionMode {
    pub fn partitions_grain_shear(&self) -> bool {
        !matches!(self, ChannelErosionMode::Capacity)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DepositionOption {
    /// Settling only when shear stress is at or below tcd.
    #[default]
    BelowCritical,
    /// Settling regardless of shear stress.
    Always,
}

/// Process scale factors applied to gross fluxes.
#[derive(Clone, Copy, Debug)]
pub struct ScaleFactors {
    pub adv_ov: f64,
    pub adv_ch: f64,
    pub dsp_ov: f64,
    pub dsp_ch: f64,
    pub ers_ov: f64,
    pub ers_ch: f64,
    pub dep_ov: f64,
    pub dep_ch: f64,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        ScaleFactors {
            adv_ov: 1.0,
            adv_ch: 1.0,
            dsp_ov: 1.0,
            dsp_ch: 1.0,
            ers_ov: 1.0,
            ers_ch: 1.0,
            dep_ov: 1.0,
            dep_ch: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub simulate_solids: bool,
    pub infiltration: bool,
    pub transmission_loss: bool,
    pub snow: SnowOption,
    pub melt: MeltOption,
    pub overland_erosion: OverlandErosionMode,
    pub channel_erosion: ChannelErosionMode,
    pub deposition: DepositionOption,
    pub scale: ScaleFactors,
}

/// One time step window: step length in seconds, applied until simtime
/// (hours) reaches `until_hours`.
#[derive(Clone, Copy, Debug)]
pub struct DtWindow {
    pub dt_seconds: f64,
    pub until_hours: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimeControl {
    pub tstart: f64, //hours
    pub tend: f64,   //hours
    pub dt_windows: Vec<DtWindow>,
}

impl TimeControl {
    pub fn dt_at(&self, simtime: f64) -> f64 {
        for w in &self.dt_windows {
            if simtime < w.until_hours {
                return w.dt_seconds;
            }
        }
        self.dt_windows.last().map(|w| w.dt_seconds).unwrap_or(0.0)
    }
}

/// Uniform initial conditions (m).
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialConditions {
    pub h_overland: f64,
    pub h_channel: f64,
    pub swe: f64,
}

/// Initial overland bed setup: one soil layer under every in-domain cell.
#[derive(Debug, Clone, Default)]
pub struct OverlandBed {
    pub thickness: f64,
    pub porosity: f64,
    pub gsd: Vec<f64>, //grain size distribution fractions per class
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SedUnits {
    /// Report concentrations in g/m3.
    #[default]
    Concentration,
    /// Report group mass discharge in MT/day.
    MassPerDay,
}

#[derive(Debug, Clone, Default)]
pub struct ReportStation {
    pub name: String,
    pub row: usize,
    pub col: usize,
    pub units: SedUnits,
}

#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub echo_file: Option<String>,
    pub water_export: Option<String>,
    pub sed_export_root: Option<String>,
    pub end_grid_root: Option<String>,
}

/// One overland flow path between two adjacent in-domain cells, listed
/// once for the whole grid (east and south neighbors of every cell).
#[derive(Clone, Copy, Debug)]
pub struct OverlandInterface {
    pub from: usize, //flat cell index
    pub to: usize,
    pub dir: Direction, //direction from `from` to `to` (East or South)
}

#[derive(Clone, Default, Debug)]
pub struct Model {
    pub id: Uuid,
    pub name: String,

    pub grid: Grid,
    pub net: ChannelNetwork,
    pub geometry: Vec<Vec<ChannelGeometry>>,
    pub land_uses: Vec<LandUseClass>,
    pub soils: Vec<SoilType>,
    pub catalog: SolidsCatalog,
    pub outlets: Vec<Outlet>,
    pub forcings: Forcings,
    pub options: RunOptions,
    pub time: TimeControl,
    pub initial: InitialConditions,
    pub overland_bed: OverlandBed,
    pub channel_gsd: Vec<f64>,

    pub stations: Vec<ReportStation>,
    pub report_dt_hours: f64,
    pub output: OutputConfig,

    //Derived at configure()
    pub cell_rain_gage: Vec<usize>,
    pub cell_snow_gage: Vec<usize>,
    pub overland_interfaces: Vec<OverlandInterface>,
    pub outlet_of_link: Vec<Option<usize>>,
    pub outlet_of_cell: Vec<Option<usize>>,

    pub state: Option<RunState>,
}

//=======================================================================
// Run state
//=======================================================================

#[derive(Debug, Clone, Default)]
pub struct OverlandWater {
    pub h: Vec<f64>,
    pub h_new: Vec<f64>,
    pub swe: Vec<f64>,
    pub swe_new: Vec<f64>,
    pub interception_remaining: Vec<f64>,
    pub interception_debit: Vec<f64>, //depth debited this step (m)
    pub infiltration_cum: Vec<f64>,   //cumulative Green-Ampt depth F (m)
    pub infiltration_rate: Vec<f64>,  //m/s, this step
    pub gross_rain: Vec<f64>,         //m/s
    pub net_rain: Vec<f64>,           //m/s
    pub gross_swe: Vec<f64>,          //m/s
    pub net_swe: Vec<f64>,            //m/s
    pub melt_rate: Vec<f64>,          //m/s
    pub dq_in: Vec<[f64; N_SOURCES]>, //m3/s per source
    pub dq_out: Vec<[f64; N_SOURCES]>,
    pub sf: Vec<[f64; 9]>, //friction slope components per direction code
}

#[derive(Debug, Clone, Default)]
pub struct ChannelWater {
    pub h: Vec<Vec<f64>>,
    pub h_new: Vec<Vec<f64>>,
    pub transloss_rate: Vec<Vec<f64>>, //m/s over the bed area
    pub transloss_cum: Vec<Vec<f64>>,  //cumulative depth (m)
    pub dq_in: Vec<Vec<[f64; N_SOURCES]>>,
    pub dq_out: Vec<Vec<[f64; N_SOURCES]>>,
    pub sf: Vec<Vec<f64>>, //friction slope at the node's downstream interface
    /// Floodplain transfer rate (m3/s); positive moves water from the
    /// overland part of the cell into the channel.
    pub fp_rate: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct SolidsState {
    /// Water column concentrations, [class 0..=n][cell] (g/m3); slot 0 is
    /// the total over classes.
    pub cov: Vec<Vec<f64>>,
    pub cov_new: Vec<Vec<f64>>,
    pub cch: Vec<Vec<Vec<f64>>>,
    pub cch_new: Vec<Vec<Vec<f64>>>,

    pub stack_ov: Vec<SedimentStack>,
    pub stack_ch: Vec<Vec<SedimentStack>>,

    pub taumax_ov: Vec<f64>,
    pub taumax_time_ov: Vec<f64>,
    pub taumax_ch: Vec<Vec<f64>>,
    pub taumax_time_ch: Vec<Vec<f64>>,

    //Per-step flux workspaces (g/s), [class][cell or link/node][source]
    pub adv_ov_in: Vec<Vec<[f64; N_SOURCES]>>,
    pub adv_ov_out: Vec<Vec<[f64; N_SOURCES]>>,
    pub dsp_ov_in: Vec<Vec<[f64; N_SOURCES]>>,
    pub dsp_ov_out: Vec<Vec<[f64; N_SOURCES]>>,
    pub ers_ov: Vec<Vec<f64>>,
    pub dep_ov: Vec<Vec<f64>>,

    pub adv_ch_in: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub adv_ch_out: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub dsp_ch_in: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub dsp_ch_out: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub ers_ch: Vec<Vec<Vec<f64>>>,
    pub dep_ch: Vec<Vec<Vec<f64>>>,
}

/// Buffered report rows, flushed to CSV files after the run.
#[derive(Debug, Clone, Default)]
pub struct ReportBuffers {
    pub times: Vec<f64>,
    /// Per time, per station: (Q_overland, Q_channel, Q_total) (m3/s).
    pub water: Vec<Vec<(f64, f64, f64)>>,
    /// Per group (0 = all), per time, per station: value in station units.
    pub solids: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub simtime: f64, //hours
    pub dt: f64,      //seconds
    pub step: u64,

    pub cursors: ForcingCursors,
    pub forcing: ForcingValues,
    pub next_precip_grid_time: f64,
    pub precip_grid_index: usize,

    pub ov: OverlandWater,
    pub ch: ChannelWater,
    pub sed: SolidsState,
    pub ledger: Ledger,

    pub reports: ReportBuffers,
    pub next_report_time: f64,
}

impl RunState {
    pub fn new(model: &Model) -> RunState {
        let n_cells = model.grid.n_cells();
        let nodes = &model.net.nodes_per_link;
        let n_classes = model.catalog.n_classes();

        let cell_vec = || vec![0.0f64; n_cells];
        let cell_src = || vec![[0.0f64; N_SOURCES]; n_cells];
        let node_vec = || -> Vec<Vec<f64>> { nodes.iter().map(|&n| vec![0.0; n]).collect() };
        let node_src = || -> Vec<Vec<[f64; N_SOURCES]>> {
            nodes.iter().map(|&n| vec![[0.0; N_SOURCES]; n]).collect()
        };

        let mut ov = OverlandWater {
            h: cell_vec(),
            h_new: cell_vec(),
            swe: cell_vec(),
            swe_new: cell_vec(),
            interception_remaining: cell_vec(),
            interception_debit: cell_vec(),
            infiltration_cum: cell_vec(),
            infiltration_rate: cell_vec(),
            gross_rain: cell_vec(),
            net_rain: cell_vec(),
            gross_swe: cell_vec(),
            net_swe: cell_vec(),
            melt_rate: cell_vec(),
            dq_in: cell_src(),
            dq_out: cell_src(),
            sf: vec![[0.0; 9]; n_cells],
        };
        let mut ch = ChannelWater {
            h: node_vec(),
            h_new: node_vec(),
            transloss_rate: node_vec(),
            transloss_cum: node_vec(),
            dq_in: node_src(),
            dq_out: node_src(),
            sf: node_vec(),
            fp_rate: node_vec(),
        };

        //Initial depths, SWE and interception storage
        for (r, c) in model.grid.domain_cells() {
            let i = model.grid.idx(r, c);
            ov.h[i] = model.initial.h_overland;
            ov.swe[i] = model.initial.swe;
            ov.interception_remaining[i] =
                model.land_uses[model.grid.land_use[i]].interception_depth;
        }
        for (l, n) in model.net.nodes() {
            ch.h[l][n] = model.initial.h_channel;
        }

        //Sediment stacks: one soil layer overland, one bed layer per node
        let mut stack_ov = Vec::with_capacity(n_cells);
        for i in 0..n_cells {
            if model.grid.mask[i].in_domain() && model.options.simulate_solids {
                let area = overland_surface_area(model, i);
                let mut layer = SedimentLayer::new(
                    model.overland_bed.thickness * area,
                    area,
                    model.overland_bed.porosity,
                    n_classes,
                );
                layer.fill_from_fractions(&model.overland_bed.gsd, &model.catalog);
                stack_ov.push(SedimentStack::single_layer(layer));
            } else {
                stack_ov.push(SedimentStack::default());
            }
        }
        let mut stack_ch: Vec<Vec<SedimentStack>> = Vec::with_capacity(model.net.nlinks);
        for l in 0..model.net.nlinks {
            let mut link_stacks = Vec::with_capacity(model.net.nodes_per_link[l]);
            for n in 0..model.net.nodes_per_link[l] {
                if model.options.simulate_solids {
                    let geom = &model.geometry[l][n];
                    let bed_area = geom.bottom_width * model.net.length[l][n];
                    let mut layer = SedimentLayer::new(
                        geom.bed_thickness * bed_area,
                        bed_area,
                        geom.bed_porosity,
                        n_classes,
                    );
                    layer.fill_from_fractions(&model.channel_gsd, &model.catalog);
                    link_stacks.push(SedimentStack::single_layer(layer));
                } else {
                    link_stacks.push(SedimentStack::default());
                }
            }
            stack_ch.push(link_stacks);
        }

        let sed = SolidsState {
            cov: vec![cell_vec(); n_classes + 1],
            cov_new: vec![cell_vec(); n_classes + 1],
            cch: vec![node_vec(); n_classes + 1],
            cch_new: vec![node_vec(); n_classes + 1],
            stack_ov,
            stack_ch,
            taumax_ov: cell_vec(),
            taumax_time_ov: cell_vec(),
            taumax_ch: node_vec(),
            taumax_time_ch: node_vec(),
            adv_ov_in: vec![cell_src(); n_classes + 1],
            adv_ov_out: vec![cell_src(); n_classes + 1],
            dsp_ov_in: vec![cell_src(); n_classes + 1],
            dsp_ov_out: vec![cell_src(); n_classes + 1],
            ers_ov: vec![cell_vec(); n_classes + 1],
            dep_ov: vec![cell_vec(); n_classes + 1],
            adv_ch_in: vec![node_src(); n_classes + 1],
            adv_ch_out: vec![node_src(); n_classes + 1],
            dsp_ch_in: vec![node_src(); n_classes + 1],
            dsp_ch_out: vec![node_src(); n_classes + 1],
            ers_ch: vec![node_vec(); n_classes + 1],
            dep_ch: vec![node_vec(); n_classes + 1],
        };

        let tstart = model.time.tstart;
        let n_groups = model.catalog.n_groups;
        RunState {
            simtime: tstart,
            dt: model.time.dt_at(tstart),
            step: 0,
            cursors: model.forcings.start_cursors(tstart, model.outlets.len()),
            forcing: ForcingValues {
                rain_by_gage: vec![0.0; rain_gage_count(&model.forcings)],
                rain_grid: cell_vec(),
                snow_by_gage: vec![0.0; model.forcings.snow_gages.len()],
                air_temp: 0.0,
                flow: vec![0.0; model.forcings.flows.len()],
                load: vec![0.0; model.forcings.loads.len()],
                boundary_conc: vec![0.0; model.forcings.boundary_concs.len()],
                outlet_depth: vec![0.0; model.outlets.len()],
            },
            next_precip_grid_time: tstart,
            precip_grid_index: 0,
            ov,
            ch,
            sed,
            ledger: Ledger::sized(n_cells, nodes, n_classes, model.outlets.len()),
            reports: ReportBuffers {
                times: Vec::new(),
                water: Vec::new(),
                solids: vec![Vec::new(); n_groups + 1],
            },
            next_report_time: tstart,
        }
    }

    /// End-of-step swap of the staged buffers.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.ov.h, &mut self.ov.h_new);
        std::mem::swap(&mut self.ov.swe, &mut self.ov.swe_new);
        std::mem::swap(&mut self.ch.h, &mut self.ch.h_new);
        std::mem::swap(&mut self.sed.cov, &mut self.sed.cov_new);
        std::mem::swap(&mut self.sed.cch, &mut self.sed.cch_new);
    }
}

fn rain_gage_count(forcings: &Forcings) -> usize {
    match &forcings.precip {
        PrecipInput::Gages(g) => g.len(),
        PrecipInput::Grids { .. } => 0,
    }
}

/// Surface area of the overland portion of a cell (m2): the full cell
/// area minus the top-width area of any channel segment in the cell.
pub fn overland_surface_area(model: &Model, cell: usize) -> f64 {
    let w2 = model.grid.cell_area();
    match model.net.link_node_of_cell.get(cell).and_then(|x| *x) {
        Some((l, n)) => w2 - channel_surface_area(model, l, n),
        None => w2,
    }
}

/// Plan area of the channel segment in its cell (m2).
pub fn channel_surface_area(model: &Model, link: usize, node: usize) -> f64 {
    model.geometry[link][node].top_width * model.net.length[link][node]
}

//=======================================================================
// Model
//=======================================================================

impl Model {
    pub fn new() -> Model {
        Model {
            id: Uuid::new_v4(),
            report_dt_hours: 1.0,
            ..Default::default()
        }
    }

    /// Validate the assembled model and build the derived lookup tables.
    /// Must be called once before run().
    pub fn configure(&mut self) -> Result<(), String> {
        let grid = &self.grid;
        if grid.nrows == 0 || grid.ncols == 0 {
            return Err("Grid has zero size".to_string());
        }
        if self.time.tend <= self.time.tstart {
            return Err("Simulation end time must be after the start time".to_string());
        }
        if self.time.dt_windows.is_empty() || self.time.dt_at(self.time.tstart) <= 0.0 {
            return Err("No positive time step is defined".to_string());
        }

        //Classification rasters must reference real table entries
        for (r, c) in grid.domain_cells() {
            let i = grid.idx(r, c);
            if grid.land_use[i] >= self.land_uses.len() {
                return Err(format!(
                    "Land use id at row {} col {} is outside the land use table",
                    r, c
                ));
            }
            if grid.soil[i] >= self.soils.len() {
                return Err(format!(
                    "Soil id at row {} col {} is outside the soil table",
                    r, c
                ));
            }
        }

        //Channel geometry checks
        let w2 = grid.cell_area();
        for (l, n) in self.net.nodes() {
            let geom = &self.geometry[l][n];
            if geom.top_width < geom.bottom_width {
                return Err(format!(
                    "Channel top width {} < bottom width {} at link {} node {}",
                    geom.top_width,
                    geom.bottom_width,
                    l + 1,
                    n + 1
                ));
            }
            let asurf = geom.top_width * self.net.length[l][n];
            if asurf > 0.9 * w2 {
                return Err(format!(
                    "Channel surface area {:.3} m2 exceeds 90% of the cell area at link {} node {}",
                    asurf,
                    l + 1,
                    n + 1
                ));
            }
        }

        //Outlets: each must sit on the last node of a link, and no link
        //may carry two outlets.
        self.outlet_of_link = vec![None; self.net.nlinks];
        self.outlet_of_cell = vec![None; grid.n_cells()];
        for (o, outlet) in self.outlets.iter().enumerate() {
            if !grid.in_bounds(outlet.row as i64, outlet.col as i64)
                || !grid.is_in_domain(outlet.row, outlet.col)
            {
                return Err(format!(
                    "Outlet {} at row {} col {} is outside the domain",
                    o + 1,
                    outlet.row,
                    outlet.col
                ));
            }
            let i = grid.idx(outlet.row, outlet.col);
            self.outlet_of_cell[i] = Some(o);
            if let Some((l, n)) = self.net.link_node_of_cell[i] {
                if !self.net.is_last_node(l, n) {
                    return Err(format!(
                        "Outlet {} is bound to link {} node {} which is not the last node of its link",
                        o + 1,
                        l + 1,
                        n + 1
                    ));
                }
                if self.outlet_of_link[l].is_some() {
                    return Err(format!("Link {} carries more than one outlet", l + 1));
                }
                self.outlet_of_link[l] = Some(o);
            }
        }

        //Every link that ends at the domain boundary must drain an outlet,
        //otherwise water leaving its last node has nowhere to go.
        for l in 0..self.net.nlinks {
            if self.net.down_branch_count(l) == 0 && self.outlet_of_link[l].is_none() {
                return Err(format!(
                    "Link {} ends at the domain boundary but no outlet is defined there",
                    l + 1
                ));
            }
        }

        //Solids configuration
        if self.options.simulate_solids {
            let n = self.catalog.n_classes();
            if n == 0 {
                return Err(
                    "Solids transport is enabled but no solids classes are defined".to_string()
                );
            }
            if self.overland_bed.gsd.len() != n
                || (self.net.nlinks > 0 && self.channel_gsd.len() != n)
            {
                return Err(
                    "Grain size distributions must list one fraction per solids class".to_string()
                );
            }
        }

        //Stations must be in the domain
        for s in &self.stations {
            if !grid.in_bounds(s.row as i64, s.col as i64) || !grid.is_in_domain(s.row, s.col) {
                return Err(format!(
                    "Report station '{}' at row {} col {} is outside the domain",
                    s.name, s.row, s.col
                ));
            }
        }

        //Nearest-gage assignment for rain and snow
        match &self.forcings.precip {
            PrecipInput::Gages(gages) => {
                if gages.is_empty() {
                    return Err("No rain gages are defined".to_string());
                }
                self.cell_rain_gage = assign_nearest_gage(grid, gages);
            }
            PrecipInput::Grids { .. } => {
                self.cell_rain_gage = vec![0; grid.n_cells()];
            }
        }
        self.cell_snow_gage = if self.options.snow == SnowOption::Gages {
            if self.forcings.snow_gages.is_empty() {
                return Err("Snow gage option is enabled but no snow gages are defined".to_string());
            }
            assign_nearest_gage(grid, &self.forcings.snow_gages)
        } else {
            vec![0; grid.n_cells()]
        };

        //Overland interfaces: east and south neighbor of every in-domain
        //cell, listed once each.
        self.overland_interfaces.clear();
        for (r, c) in grid.domain_cells() {
            let from = grid.idx(r, c);
            for dir in [Direction::East, Direction::South] {
                let (dr, dc) = dir.offset();
                let (nr, nc) = (r as i64 + dr, c as i64 + dc);
                if grid.in_bounds(nr, nc) && grid.is_in_domain(nr as usize, nc as usize) {
                    self.overland_interfaces.push(OverlandInterface {
                        from,
                        to: grid.idx(nr as usize, nc as usize),
                        dir,
                    });
                }
            }
        }

        Ok(())
    }

    /// Run all time steps. The final run state is retained on the model
    /// for report and output generation.
    pub fn run(&mut self) -> Result<(), String> {
        let mut state = RunState::new(self);

        while state.simtime < self.time.tend - 1.0e-12 {
            self.run_timestep(&mut state)?;
        }

        self.state = Some(state);
        Ok(())
    }

    pub fn run_timestep(&self, state: &mut RunState) -> Result<(), String> {
        state.dt = self.time.dt_at(state.simtime);

        //1. Forcing interpolators
        self.advance_forcings(state)?;

        //2. Infiltration and channel transmission loss
        if self.options.infiltration {
            infiltration::infiltration_phase(self, state);
        }
        if self.options.transmission_loss {
            infiltration::transmission_loss_phase(self, state);
        }

        //3. Interception debit
        interception::interception_phase(self, state);

        //4. Overland flow and depth update
        overland::route(self, state);
        overland::update_depths(self, state)?;

        //5. Channel flow and depth update
        channel::route(self, state);
        channel::update_depths(self, state)?;

        //6. Floodplain exchange
        floodplain::exchange(self, state)?;

        //7. Solids transport
        if self.options.simulate_solids {
            transport::solids_phase(self, state)?;
        }

        //8. Ledger, envelopes, reporting
        self.update_ledger(state);
        self.capture_reports(state);

        state.swap_buffers();
        state.simtime += state.dt / 3600.0;
        state.step += 1;
        Ok(())
    }

    /// Phase 1: advance every forcing cursor to simtime, interpolate, and
    /// spread gage values onto the per-cell gross rate fields.
    fn advance_forcings(&self, state: &mut RunState) -> Result<(), String> {
        let simtime = state.simtime;

        match &self.forcings.precip {
            PrecipInput::Gages(gages) => {
                for (g, gage) in gages.iter().enumerate() {
                    state.forcing.rain_by_gage[g] =
                        gage.series.value_at(&mut state.cursors.rain[g], simtime);
                }
            }
            PrecipInput::Grids { root, freq_hours } => {
                if simtime >= state.next_precip_grid_time - 1.0e-12 {
                    let path = format!("{}{}.asc", root, state.precip_grid_index);
                    let raster = crate::io::ascii_grid::read_grid(&path)?;
                    crate::io::ascii_grid::check_header(&raster, &self.grid, &path)?;
                    state.forcing.rain_grid = raster.values;
                    state.precip_grid_index += 1;
                    state.next_precip_grid_time += freq_hours;
                }
            }
        }

        for (g, gage) in self.forcings.snow_gages.iter().enumerate() {
            state.forcing.snow_by_gage[g] =
                gage.series.value_at(&mut state.cursors.snow[g], simtime);
        }
        if let Some(ts) = &self.forcings.air_temp {
            state.forcing.air_temp = ts.value_at(&mut state.cursors.air_temp, simtime);
        }
        for (k, source) in self.forcings.flows.iter().enumerate() {
            state.forcing.flow[k] = source.series.value_at(&mut state.cursors.flows[k], simtime);
        }
        for (k, load) in self.forcings.loads.iter().enumerate() {
            state.forcing.load[k] = load.series.value_at(&mut state.cursors.loads[k], simtime);
        }
        for (k, bc) in self.forcings.boundary_concs.iter().enumerate() {
            state.forcing.boundary_conc[k] =
                bc.series.value_at(&mut state.cursors.boundary_concs[k], simtime);
        }
        for (o, outlet) in self.outlets.iter().enumerate() {
            if let BoundaryDepth::SpecifiedDepth(ts) = &outlet.depth {
                state.forcing.outlet_depth[o] =
                    ts.value_at(&mut state.cursors.outlet_depths[o], simtime);
            }
        }

        //Spread gross rain/SWE rates over the grid and compute snowmelt
        let air_temp = state.forcing.air_temp;
        for (r, c) in self.grid.domain_cells() {
            let i = self.grid.idx(r, c);
            let mut rain = match &self.forcings.precip {
                PrecipInput::Gages(_) => state.forcing.rain_by_gage[self.cell_rain_gage[i]],
                PrecipInput::Grids { .. } => state.forcing.rain_grid[i],
            };
            let mut swe_rate = 0.0;
            match self.options.snow {
                SnowOption::None => {}
                SnowOption::RainPartition => {
                    if air_temp <= 0.0 {
                        swe_rate = rain;
                        rain = 0.0;
                    }
                }
                SnowOption::Gages => {
                    swe_rate = state.forcing.snow_by_gage[self.cell_snow_gage[i]];
                }
            }
            state.ov.gross_rain[i] = rain;
            state.ov.gross_swe[i] = swe_rate;

            state.ov.melt_rate[i] = match self.options.melt {
                MeltOption::None => 0.0,
                MeltOption::DegreeDay { ddf } => {
                    let potential = ddf * air_temp.max(0.0);
                    potential.min(state.ov.swe[i] / state.dt)
                }
            };
        }

        Ok(())
    }

    /// Phase 8: fold the step's reconciled rates and fluxes into the
    /// cumulative ledgers and envelopes.
    fn update_ledger(&self, state: &mut RunState) {
        let dt = state.dt;
        let w2 = self.grid.cell_area();
        let ledger = &mut state.ledger;

        for (r, c) in self.grid.domain_cells() {
            let i = self.grid.idx(r, c);
            let aov = overland_surface_area(self, i);

            ledger.gross_rain_depth[i] += state.ov.gross_rain[i] * dt;
            ledger.gross_rain_vol[i] += state.ov.gross_rain[i] * w2 * dt;
            ledger.net_rain_vol[i] += state.ov.net_rain[i] * aov * dt;
            ledger.min_rain_intensity = ledger.min_rain_intensity.min(state.ov.gross_rain[i]);
            ledger.max_rain_intensity = ledger.max_rain_intensity.max(state.ov.gross_rain[i]);

            if self.options.snow != SnowOption::None {
                ledger.gross_swe_depth[i] += state.ov.gross_swe[i] * dt;
                ledger.gross_swe_vol[i] += state.ov.gross_swe[i] * w2 * dt;
                ledger.net_swe_vol[i] += state.ov.net_swe[i] * aov * dt;
                ledger.min_swe_intensity = ledger.min_swe_intensity.min(state.ov.gross_swe[i]);
                ledger.max_swe_intensity = ledger.max_swe_intensity.max(state.ov.gross_swe[i]);
            }
            if self.options.melt != MeltOption::None {
                ledger.swemelt_depth[i] += state.ov.melt_rate[i] * dt;
                ledger.swemelt_vol[i] += state.ov.melt_rate[i] * aov * dt;
                ledger.min_swemelt_depth = ledger.min_swemelt_depth.min(ledger.swemelt_depth[i]);
                ledger.max_swemelt_depth = ledger.max_swemelt_depth.max(ledger.swemelt_depth[i]);
            }

            ledger.interception_vol[i] += state.ov.interception_debit[i] * aov;

            if self.options.infiltration {
                ledger.infiltration_depth[i] += state.ov.infiltration_rate[i] * dt;
                ledger.infiltration_vol[i] += state.ov.infiltration_rate[i] * aov * dt;
                ledger.min_infilt_depth = ledger.min_infilt_depth.min(ledger.infiltration_depth[i]);
                ledger.max_infilt_depth = ledger.max_infilt_depth.max(ledger.infiltration_depth[i]);
            }

            for k in 0..N_SOURCES {
                ledger.dqov_in_vol[i][k] += state.ov.dq_in[i][k] * dt;
                ledger.dqov_out_vol[i][k] += state.ov.dq_out[i][k] * dt;
            }
            ledger.peak_overland_depth = ledger.peak_overland_depth.max(state.ov.h_new[i]);

            if self.options.simulate_solids {
                for s in 0..=self.catalog.n_classes() {
                    for k in 0..N_SOURCES {
                        ledger.adv_ov_in_mass[s][i][k] += state.sed.adv_ov_in[s][i][k] * dt / 1000.0;
                        ledger.adv_ov_out_mass[s][i][k] +=
                            state.sed.adv_ov_out[s][i][k] * dt / 1000.0;
                        ledger.dsp_ov_in_mass[s][i][k] += state.sed.dsp_ov_in[s][i][k] * dt / 1000.0;
                        ledger.dsp_ov_out_mass[s][i][k] +=
                            state.sed.dsp_ov_out[s][i][k] * dt / 1000.0;
                    }
                    ledger.ers_ov_in_mass[s][i] += state.sed.ers_ov[s][i] * dt / 1000.0;
                    ledger.dep_ov_out_mass[s][i] += state.sed.dep_ov[s][i] * dt / 1000.0;
                }
            }
        }

        for (l, n) in self.net.nodes() {
            for k in 0..N_SOURCES {
                ledger.dqch_in_vol[l][n][k] += state.ch.dq_in[l][n][k] * dt;
                ledger.dqch_out_vol[l][n][k] += state.ch.dq_out[l][n][k] * dt;
            }
            if self.options.transmission_loss {
                let bed_area = self.geometry[l][n].bottom_width * self.net.length[l][n];
                ledger.transloss_vol[l][n] += state.ch.transloss_rate[l][n] * bed_area * dt;
            }
            ledger.peak_channel_depth = ledger.peak_channel_depth.max(state.ch.h_new[l][n]);

            if self.options.simulate_solids {
                for s in 0..=self.catalog.n_classes() {
                    for k in 0..N_SOURCES {
                        ledger.adv_ch_in_mass[s][l][n][k] +=
                            state.sed.adv_ch_in[s][l][n][k] * dt / 1000.0;
                        ledger.adv_ch_out_mass[s][l][n][k] +=
                            state.sed.adv_ch_out[s][l][n][k] * dt / 1000.0;
                        ledger.dsp_ch_in_mass[s][l][n][k] +=
                            state.sed.dsp_ch_in[s][l][n][k] * dt / 1000.0;
                        ledger.dsp_ch_out_mass[s][l][n][k] +=
                            state.sed.dsp_ch_out[s][l][n][k] * dt / 1000.0;
                    }
                    ledger.ers_ch_in_mass[s][l][n] += state.sed.ers_ch[s][l][n] * dt / 1000.0;
                    ledger.dep_ch_out_mass[s][l][n] += state.sed.dep_ch[s][l][n] * dt / 1000.0;
                }
            }
        }

        //Per-outlet flow and boundary solids totals
        for (o, outlet) in self.outlets.iter().enumerate() {
            let i = self.grid.idx(outlet.row, outlet.col);
            ledger.outlet_flow_out_vol_ov[o] += state.ov.dq_out[i][SRC_BOUNDARY] * dt;
            if let Some((l, n)) = self.net.link_node_of_cell[i] {
                ledger.outlet_flow_out_vol_ch[o] += state.ch.dq_out[l][n][SRC_BOUNDARY] * dt;
                ledger.outlet_flow_in_vol_ch[o] += state.ch.dq_in[l][n][SRC_BOUNDARY] * dt;
                if self.options.simulate_solids {
                    for s in 0..=self.catalog.n_classes() {
                        let out = (state.sed.adv_ch_out[s][l][n][SRC_BOUNDARY]
                            + state.sed.dsp_ch_out[s][l][n][SRC_BOUNDARY])
                            * dt
                            / 1000.0;
                        let inn = (state.sed.adv_ch_in[s][l][n][SRC_BOUNDARY]
                            + state.sed.dsp_ch_in[s][l][n][SRC_BOUNDARY])
                            * dt
                            / 1000.0;
                        ledger.outlet_sed_out_mass[s][o + 1] += out;
                        ledger.outlet_sed_out_mass[s][0] += out;
                        ledger.outlet_sed_in_mass[s][o + 1] += inn;
                        ledger.outlet_sed_in_mass[s][0] += inn;
                    }
                }
            }
            if self.options.simulate_solids {
                //overland boundary solids at the outlet cell
                for s in 0..=self.catalog.n_classes() {
                    let out = (state.sed.adv_ov_out[s][i][SRC_BOUNDARY]
                        + state.sed.dsp_ov_out[s][i][SRC_BOUNDARY])
                        * dt
                        / 1000.0;
                    ledger.outlet_sed_out_mass[s][o + 1] += out;
                    ledger.outlet_sed_out_mass[s][0] += out;
                }
            }
        }

        //External flow volumes
        for (k, source) in self.forcings.flows.iter().enumerate() {
            let q = state.forcing.flow[k] * dt;
            match source.target {
                crate::forcing::FlowTarget::OverlandCell { row, col } => {
                    let i = self.grid.idx(row, col);
                    state.ledger.external_flow_vol[i] += q;
                }
                crate::forcing::FlowTarget::ChannelNode { link, node } => {
                    state.ledger.external_flow_vol_ch[link][node] += q;
                }
            }
        }

        //External load masses (kg); loads carry their own sign
        if self.options.simulate_solids {
            for (k, load) in self.forcings.loads.iter().enumerate() {
                let rate = transport::load_rate_g_per_s(self, state, k, load);
                let mass = rate * dt / 1000.0;
                if mass >= 0.0 {
                    state.ledger.load_in_mass[load.class] += mass;
                    state.ledger.load_in_mass[0] += mass;
                } else {
                    state.ledger.load_out_mass[load.class] -= mass;
                    state.ledger.load_out_mass[0] -= mass;
                }
            }
        }
    }

    /// Phase 8 reporting hook: buffer one row per report interval.
    fn capture_reports(&self, state: &mut RunState) {
        if self.stations.is_empty() {
            return;
        }
        if state.simtime < state.next_report_time - 1.0e-12 {
            return;
        }
        state.next_report_time = state.simtime + self.report_dt_hours;
        state.reports.times.push(state.simtime);

        let mut water_row = Vec::with_capacity(self.stations.len());
        for st in &self.stations {
            let i = self.grid.idx(st.row, st.col);
            let mut qov = state.ov.dq_out[i][SRC_BOUNDARY];
            for d in Direction::AXIAL {
                qov += state.ov.dq_out[i][d.code()];
            }
            qov *= self.options.scale.adv_ov;
            let mut qch = 0.0;
            if let Some((l, n)) = self.net.link_node_of_cell[i] {
                qch += state.ch.dq_out[l][n][SRC_BOUNDARY];
                for d in Direction::ALL {
                    qch += state.ch.dq_out[l][n][d.code()];
                }
                qch *= self.options.scale.adv_ch;
            }
            water_row.push((qov, qch, qov + qch));
        }

        if self.options.simulate_solids {
            for group in 0..=self.catalog.n_groups {
                let mut row = Vec::with_capacity(self.stations.len());
                for (si, st) in self.stations.iter().enumerate() {
                    let i = self.grid.idx(st.row, st.col);
                    let mut value = 0.0;
                    for s in 1..=self.catalog.n_classes() {
                        if group != 0 && self.catalog.class(s).group != group {
                            continue;
                        }
                        match st.units {
                            SedUnits::Concentration => {
                                value += match self.net.link_node_of_cell[i] {
                                    Some((l, n)) => state.sed.cch[s][l][n],
                                    None => state.sed.cov[s][i],
                                };
                            }
                            SedUnits::MassPerDay => {
                                let (qov, qch, _) = water_row[si];
                                let conc_ov = state.sed.cov[s][i];
                                let conc_ch = self.net.link_node_of_cell[i]
                                    .map(|(l, n)| state.sed.cch[s][l][n])
                                    .unwrap_or(0.0);
                                //g/s to metric tons per day
                                value += (qov * conc_ov + qch * conc_ch) * 86400.0 / 1.0e6;
                            }
                        }
                    }
                    row.push(value);
                }
                state.reports.solids[group].push(row);
            }
        }
        state.reports.water.push(water_row);
    }

    /// End-of-run totals: sweep the ledger and the final state.
    pub fn compute_mass_balance(&self, state: &RunState) -> MassBalanceTotals {
        let mut totals = MassBalanceTotals::default();
        let n_classes = self.catalog.n_classes();
        totals.sed_initial_mass = vec![0.0; n_classes + 1];
        totals.sed_in_mass = vec![0.0; n_classes + 1];
        totals.sed_out_mass = vec![0.0; n_classes + 1];
        totals.sed_final_mass = vec![0.0; n_classes + 1];
        totals.sed_closure_error = vec![0.0; n_classes + 1];

        let mut net_swe_vol = 0.0;
        let mut initial_swe_vol = 0.0;
        for (r, c) in self.grid.domain_cells() {
            let i = self.grid.idx(r, c);
            let aov = overland_surface_area(self, i);
            totals.gross_rain_vol += state.ledger.gross_rain_vol[i];
            totals.net_rain_vol += state.ledger.net_rain_vol[i];
            totals.gross_swe_vol += state.ledger.gross_swe_vol[i];
            net_swe_vol += state.ledger.net_swe_vol[i];
            totals.interception_vol += state.ledger.interception_vol[i];
            totals.infiltration_vol += state.ledger.infiltration_vol[i];
            totals.swemelt_vol += state.ledger.swemelt_vol[i];
            totals.external_flow_vol += state.ledger.external_flow_vol[i];
            totals.final_water_vol += state.ov.h[i] * aov;
            totals.final_swe_vol += state.ov.swe[i] * aov;
            totals.initial_water_vol += self.initial.h_overland * aov;
            initial_swe_vol += self.initial.swe * aov;
        }
        for (l, n) in self.net.nodes() {
            let geom = &self.geometry[l][n];
            totals.transloss_vol += state.ledger.transloss_vol[l][n];
            totals.external_flow_vol += state.ledger.external_flow_vol_ch[l][n];
            totals.final_water_vol +=
                geom.cross_section_area(state.ch.h[l][n]) * self.net.length[l][n];
            totals.initial_water_vol +=
                geom.cross_section_area(self.initial.h_channel) * self.net.length[l][n];
        }
        for o in 0..self.outlets.len() {
            totals.outlet_flow_vol += state.ledger.outlet_flow_out_vol_ov[o]
                + state.ledger.outlet_flow_out_vol_ch[o]
                - state.ledger.outlet_flow_in_vol_ch[o];
        }

        let water_in = totals.net_rain_vol
            + net_swe_vol
            + totals.external_flow_vol
            + totals.initial_water_vol
            + initial_swe_vol;
        let water_out = totals.final_water_vol
            + totals.final_swe_vol
            + totals.infiltration_vol
            + totals.transloss_vol
            + totals.outlet_flow_vol;
        totals.water_closure_error = if water_in.abs() > 0.0 {
            (water_in - water_out) / water_in
        } else {
            0.0
        };

        if self.options.simulate_solids {
            for s in 1..=n_classes {
                for (r, c) in self.grid.domain_cells() {
                    let i = self.grid.idx(r, c);
                    let aov = overland_surface_area(self, i);
                    totals.sed_final_mass[s] += state.sed.cov[s][i] * state.ov.h[i] * aov / 1000.0;
                    totals.sed_final_mass[s] += state.sed.stack_ov[i].total_mass(s) / 1000.0;
                    totals.sed_initial_mass[s] += initial_bed_mass(self, i, s) / 1000.0;
                }
                for (l, n) in self.net.nodes() {
                    let geom = &self.geometry[l][n];
                    let vol = geom.cross_section_area(state.ch.h[l][n]) * self.net.length[l][n];
                    totals.sed_final_mass[s] += state.sed.cch[s][l][n] * vol / 1000.0;
                    totals.sed_final_mass[s] += state.sed.stack_ch[l][n].total_mass(s) / 1000.0;
                    totals.sed_initial_mass[s] += initial_channel_bed_mass(self, l, n, s) / 1000.0;
                }

                totals.sed_in_mass[s] =
                    state.ledger.load_in_mass[s] + state.ledger.outlet_sed_in_mass[s][0];
                totals.sed_out_mass[s] =
                    state.ledger.load_out_mass[s] + state.ledger.outlet_sed_out_mass[s][0];

                let reference = totals.sed_initial_mass[s] + totals.sed_in_mass[s];
                totals.sed_closure_error[s] = if reference > 0.0 {
                    (reference - totals.sed_out_mass[s] - totals.sed_final_mass[s]) / reference
                } else {
                    0.0
                };

                totals.sed_initial_mass[0] += totals.sed_initial_mass[s];
                totals.sed_in_mass[0] += totals.sed_in_mass[s];
                totals.sed_out_mass[0] += totals.sed_out_mass[s];
                totals.sed_final_mass[0] += totals.sed_final_mass[s];
            }
            let reference = totals.sed_initial_mass[0] + totals.sed_in_mass[0];
            totals.sed_closure_error[0] = if reference > 0.0 {
                (reference - totals.sed_out_mass[0] - totals.sed_final_mass[0]) / reference
            } else {
                0.0
            };
        }

        totals
    }

    /// Plain-text mass balance report.
    pub fn generate_mass_balance_report(&self) -> String {
        use std::fmt::Write as FmtWrite;
        let state = match &self.state {
            Some(s) => s,
            None => return "No simulation has been run.".to_string(),
        };
        let totals = self.compute_mass_balance(state);
        let mut out = String::new();
        writeln!(&mut out, "=== Freshet Mass Balance ===").ok();
        writeln!(&mut out, "Run: {}", self.id).ok();
        writeln!(&mut out, "Gross rainfall volume (m3):    {:.6e}", totals.gross_rain_vol).ok();
        writeln!(&mut out, "Net rainfall volume (m3):      {:.6e}", totals.net_rain_vol).ok();
        writeln!(&mut out, "Gross snowfall volume (m3):    {:.6e}", totals.gross_swe_vol).ok();
        writeln!(&mut out, "Interception volume (m3):      {:.6e}", totals.interception_vol).ok();
        writeln!(&mut out, "Infiltration volume (m3):      {:.6e}", totals.infiltration_vol).ok();
        writeln!(&mut out, "Snowmelt volume (m3):          {:.6e}", totals.swemelt_vol).ok();
        writeln!(&mut out, "Transmission loss (m3):        {:.6e}", totals.transloss_vol).ok();
        writeln!(&mut out, "External inflow volume (m3):   {:.6e}", totals.external_flow_vol).ok();
        writeln!(&mut out, "Outlet outflow volume (m3):    {:.6e}", totals.outlet_flow_vol).ok();
        writeln!(&mut out, "Initial water in storage (m3): {:.6e}", totals.initial_water_vol).ok();
        writeln!(&mut out, "Final water in storage (m3):   {:.6e}", totals.final_water_vol).ok();
        writeln!(&mut out, "Final snowpack (as swe) (m3):  {:.6e}", totals.final_swe_vol).ok();
        writeln!(&mut out, "Water balance closure error:   {:.6e}", totals.water_closure_error).ok();
        writeln!(&mut out, "Peak overland depth (m):       {:.6}", state.ledger.peak_overland_depth)
            .ok();
        writeln!(&mut out, "Peak channel depth (m):        {:.6}", state.ledger.peak_channel_depth)
            .ok();

        if self.options.simulate_solids {
            writeln!(&mut out).ok();
            writeln!(&mut out, "--- Solids (kg) ---").ok();
            for s in 1..=self.catalog.n_classes() {
                writeln!(
                    &mut out,
                    "{}: initial {:.6e}  in {:.6e}  out {:.6e}  final {:.6e}  closure {:.3e}",
                    self.catalog.class(s).name,
                    totals.sed_initial_mass[s],
                    totals.sed_in_mass[s],
                    totals.sed_out_mass[s],
                    totals.sed_final_mass[s],
                    totals.sed_closure_error[s]
                )
                .ok();
            }
        }
        out
    }

    /// Mass balance totals as pretty-printed JSON.
    pub fn mass_balance_json(&self) -> Result<String, String> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| "No simulation has been run".to_string())?;
        let totals = self.compute_mass_balance(state);
        serde_json::to_string_pretty(&totals)
            .map_err(|e| format!("Could not serialize the mass balance: {}", e))
    }

    /// Flat cell index of a node's containing cell.
    pub fn cell_of_node(&self, link: usize, node: usize) -> usize {
        let (r, c) = self.net.anchors[link][node];
        self.grid.idx(r, c)
    }
}

fn initial_bed_mass(model: &Model, cell: usize, class: usize) -> f64 {
    if !model.grid.mask[cell].in_domain() || !model.options.simulate_solids {
        return 0.0;
    }
    let area = overland_surface_area(model, cell);
    let volume = model.overland_bed.thickness * area;
    let density = model
        .catalog
        .class(class)
        .bulk_density(model.overland_bed.porosity)
        * 1000.0;
    model.overland_bed.gsd[class - 1] * density * volume
}

fn initial_channel_bed_mass(model: &Model, link: usize, node: usize, class: usize) -> f64 {
    if !model.options.simulate_solids {
        return 0.0;
    }
    let geom = &model.geometry[link][node];
    let bed_area = geom.bottom_width * model.net.length[link][node];
    let volume = geom.bed_thickness * bed_area;
    let density = model.catalog.class(class).bulk_density(geom.bed_porosity) * 1000.0;
    model.channel_gsd[class - 1] * density * volume
}

fn assign_nearest_gage(grid: &Grid, gages: &[crate::forcing::Gage]) -> Vec<usize> {
    let mut assignment = vec![0usize; grid.n_cells()];
    if gages.is_empty() {
        return assignment;
    }
    for (r, c) in grid.domain_cells() {
        let x = grid.xllcorner + (c as f64 + 0.5) * grid.cell_size;
        let y = grid.yllcorner + ((grid.nrows - 1 - r) as f64 + 0.5) * grid.cell_size;
        let mut best = 0usize;
        let mut best_d2 = f64::INFINITY;
        for (g, gage) in gages.iter().enumerate() {
            let d2 = (gage.x - x).powi(2) + (gage.y - y).powi(2);
            if d2 < best_d2 {
                best_d2 = d2;
                best = g;
            }
        }
        assignment[grid.idx(r, c)] = best;
    }
    assignment
}

/// Map 1-based (link, node) pairs from the deck onto internal indices.
pub fn node_index_map(net: &ChannelNetwork) -> HashMap<(usize, usize), (usize, usize)> {
    let mut map = HashMap::new();
    for (l, n) in net.nodes() {
        map.insert((l + 1, n + 1), (l, n));
    }
    map
}
