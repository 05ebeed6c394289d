// Reads the master input deck (INI format) and assembles a Model. All
// unit conversions and scale factors are applied here, at load time:
// rain and snow intensities arrive in mm/hr and leave as m/s, the
// degree-day factor arrives in mm per degree C per day, and every raster
// referenced by the deck must agree with the master grid header.
//
// Deck rows, columns, link numbers and node numbers are 1-based; they
// are converted to the crate's 0-based indexing as they are read.

use std::path::{Path, PathBuf};

use crate::forcing::{
    BoundaryConcentration, FlowSource, FlowTarget, Forcings, Gage, LoadMode, LoadTarget,
    PrecipInput, SolidsLoad, TimeSeries,
};
use crate::grid::{CellKind, Grid};
use crate::hydrology::channel::ChannelGeometry;
use crate::io::ascii_grid;
use crate::io::csv_io;
use crate::io::ini_parser::{IniDocument, IniSection};
use crate::model::{
    ChannelErosionMode, DepositionOption, DtWindow, InitialConditions, LandUseClass, MeltOption,
    Model, OutputConfig, OverlandBed, OverlandErosionMode, ReportStation, RunOptions, SedUnits,
    SnowOption, SoilType, TimeControl,
};
use crate::outlets::{BoundaryDepth, Outlet};
use crate::solids::class::{Cohesion, SolidsCatalog, SolidsClass};
use crate::topology::{builder, length, ChannelNetwork};

/// mm/hr to m/s.
const MM_PER_HR_TO_M_PER_S: f64 = 1.0 / 3.6e6;

/// Capability switches whose implementations are intentionally absent.
/// Enabling any of them is a fatal configuration error, not a silent
/// no-op.
const UNIMPLEMENTED_CAPABILITIES: [&str; 4] = [
    "solids_yield",
    "reinitialize",
    "dispersion_supply_scaling",
    "end_grids_water",
];

#[derive(Default)]
pub struct DeckIO {
    working_directory: Option<PathBuf>,
}

impl DeckIO {
    pub fn new() -> DeckIO {
        DeckIO {
            ..Default::default()
        }
    }

    /// Parse a master deck from a file. Relative paths inside the deck
    /// resolve against the deck file's directory.
    pub fn read_model_file(&self, path: &str) -> Result<Model, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read deck '{}': {}", path, e))?;
        let dir = Path::new(path)
            .parent()
            .map(|p| p.to_path_buf())
            .filter(|p| !p.as_os_str().is_empty());
        let reader = DeckIO {
            working_directory: dir,
        };
        reader.read_model_string(content.as_str())
    }

    pub fn read_model_string(&self, content: &str) -> Result<Model, String> {
        let doc = IniDocument::parse(content)?;
        self.build_model(&doc)
    }

    fn build_model(&self, doc: &IniDocument) -> Result<Model, String> {
        let mut model = Model::new();

        if let Some(head) = doc.section("freshet") {
            if let Some(name) = head.value("name") {
                model.name = name.to_string();
            }
        }

        model.time = self.read_time(doc)?;
        model.grid = self.read_grid(doc)?;
        self.read_topology(doc, &mut model)?;
        model.land_uses = self.read_land_uses(doc)?;
        model.soils = self.read_soils(doc)?;
        model.options = self.read_options(doc, &mut model)?;
        self.read_solids(doc, &mut model)?;
        self.read_outlets(doc, &mut model)?;
        model.forcings = self.read_forcings(doc, &model)?;
        self.read_output(doc, &mut model)?;

        Ok(model)
    }

    //------------------------------------------------------------------
    // [time]
    //------------------------------------------------------------------
    fn read_time(&self, doc: &IniDocument) -> Result<TimeControl, String> {
        let section = require_section(doc, "time")?;
        let tstart = prop_f64(section, "tstart")?;
        let tend = prop_f64(section, "tend")?;

        //dt windows: "seconds:until_hours" pairs, comma separated
        let raw = require_prop(section, "dt")?;
        let mut dt_windows = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (dt_str, until_str) = part
                .split_once(':')
                .ok_or_else(|| format!("Bad dt window '{}': expected seconds:until_hours", part))?;
            let dt_seconds: f64 = dt_str
                .trim()
                .parse()
                .map_err(|_| format!("Bad dt value '{}'", dt_str))?;
            let until_hours: f64 = until_str
                .trim()
                .parse()
                .map_err(|_| format!("Bad dt window end '{}'", until_str))?;
            dt_windows.push(DtWindow {
                dt_seconds,
                until_hours,
            });
        }
        if dt_windows.is_empty() {
            return Err("Section [time] defines no dt windows".to_string());
        }

        Ok(TimeControl {
            tstart,
            tend,
            dt_windows,
        })
    }

    //------------------------------------------------------------------
    // [grid]
    //------------------------------------------------------------------
    fn read_grid(&self, doc: &IniDocument) -> Result<Grid, String> {
        let section = require_section(doc, "grid")?;

        let mask_path = self.resolve(require_prop(section, "mask")?);
        let mask_raster = ascii_grid::read_grid(&mask_path)?;

        let mut grid = Grid {
            nrows: mask_raster.nrows,
            ncols: mask_raster.ncols,
            cell_size: mask_raster.cellsize,
            xllcorner: mask_raster.xllcorner,
            yllcorner: mask_raster.yllcorner,
            nodata: mask_raster.nodata,
            mask: vec![CellKind::NoData; mask_raster.nrows * mask_raster.ncols],
            elevation: vec![0.0; mask_raster.nrows * mask_raster.ncols],
            slope: vec![0.0; mask_raster.nrows * mask_raster.ncols],
            land_use: vec![0; mask_raster.nrows * mask_raster.ncols],
            soil: vec![0; mask_raster.nrows * mask_raster.ncols],
        };
        for (i, &v) in mask_raster.values.iter().enumerate() {
            if v != grid.nodata && v >= 0.5 {
                grid.mask[i] = CellKind::Overland;
            }
        }

        let elevation = self.read_matching_raster(section, "elevation", &grid)?;
        grid.elevation = elevation.values;
        let slope = self.read_matching_raster(section, "slope", &grid)?;
        grid.slope = slope
            .values
            .iter()
            .map(|&v| if v == slope.nodata { 0.0 } else { v })
            .collect();

        let landuse = self.read_matching_raster(section, "landuse", &grid)?;
        let soil = self.read_matching_raster(section, "soil", &grid)?;
        for i in 0..grid.n_cells() {
            if grid.mask[i].in_domain() {
                let lu = landuse.values[i];
                let so = soil.values[i];
                if lu == landuse.nodata || lu < 0.5 || so == soil.nodata || so < 0.5 {
                    return Err(format!(
                        "Cell {} is in the domain but has no land use or soil id",
                        i
                    ));
                }
                grid.land_use[i] = lu.round() as usize - 1;
                grid.soil[i] = so.round() as usize - 1;
            }
        }

        Ok(grid)
    }

    fn read_matching_raster(
        &self,
        section: &IniSection,
        key: &str,
        grid: &Grid,
    ) -> Result<ascii_grid::Raster, String> {
        let path = self.resolve(require_prop(section, key)?);
        let raster = ascii_grid::read_grid(&path)?;
        ascii_grid::check_header(&raster, grid, &path)?;
        Ok(raster)
    }

    //------------------------------------------------------------------
    // [grid] link/node + [channels] / [link.N]
    //------------------------------------------------------------------
    fn read_topology(&self, doc: &IniDocument, model: &mut Model) -> Result<(), String> {
        let section = require_section(doc, "grid")?;
        let link_key = section.value("link");
        let node_key = section.value("node");

        match (link_key, node_key) {
            (None, None) => {
                //overland-only model
                model.net = ChannelNetwork {
                    link_node_of_cell: vec![None; model.grid.n_cells()],
                    ..Default::default()
                };
                return Ok(());
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(
                    "Section [grid] must define both 'link' and 'node' rasters or neither"
                        .to_string(),
                );
            }
            _ => {}
        }

        let link_raster = self.read_matching_raster(section, "link", &model.grid)?;
        let node_raster = self.read_matching_raster(section, "node", &model.grid)?;
        let mut net = builder::build_network(&mut model.grid, &link_raster.values, &node_raster.values)?;

        //channel geometry: network-wide defaults with per-link overrides
        let channels = require_section(doc, "channels")?;
        let defaults = read_geometry(channels, None)?;
        let mut geometry: Vec<Vec<ChannelGeometry>> = Vec::with_capacity(net.nlinks);
        for l in 0..net.nlinks {
            let per_link = doc.section(&format!("link.{}", l + 1));
            let geom = match per_link {
                Some(s) => read_geometry(s, Some(&defaults))?,
                None => defaults.clone(),
            };
            geometry.push(vec![geom; net.nodes_per_link[l]]);
        }

        let sinuosity: Vec<Vec<f64>> = geometry
            .iter()
            .map(|link| link.iter().map(|g| g.sinuosity).collect())
            .collect();
        length::compute_channel_lengths(&mut net, &model.grid, &sinuosity)?;

        model.channel_gsd = prop_f64_list(channels, "gsd").unwrap_or_default();
        model.net = net;
        model.geometry = geometry;
        Ok(())
    }

    //------------------------------------------------------------------
    // [landuse.N] / [soil.N]
    //------------------------------------------------------------------
    fn read_land_uses(&self, doc: &IniDocument) -> Result<Vec<LandUseClass>, String> {
        let sections = doc.numbered_sections("landuse")?;
        if sections.is_empty() {
            return Err("No [landuse.N] sections are defined".to_string());
        }
        let mut out = Vec::with_capacity(sections.len());
        for s in sections {
            out.push(LandUseClass {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                manning_n: prop_f64(s, "manning_n")?,
                interception_depth: prop_f64_or(s, "interception", 0.0)?,
                depression_storage: prop_f64_or(s, "depression", 0.0)?,
                erosion_coeff: prop_f64_or(s, "erosion_coeff", 0.0)?,
                usle_c: prop_f64_or(s, "usle_c", 1.0)?,
                usle_p: prop_f64_or(s, "usle_p", 1.0)?,
            });
        }
        Ok(out)
    }

    fn read_soils(&self, doc: &IniDocument) -> Result<Vec<SoilType>, String> {
        let sections = doc.numbered_sections("soil")?;
        if sections.is_empty() {
            return Err("No [soil.N] sections are defined".to_string());
        }
        let mut out = Vec::with_capacity(sections.len());
        for s in sections {
            out.push(SoilType {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                kh: prop_f64(s, "kh")?,
                capillary_suction: prop_f64_or(s, "capillary_suction", 0.0)?,
                moisture_deficit: prop_f64_or(s, "moisture_deficit", 0.0)?,
                erosion_exponent: prop_f64_or(s, "erosion_exponent", 1.0)?,
                usle_k: prop_f64_or(s, "usle_k", 0.0)?,
            });
        }
        Ok(out)
    }

    //------------------------------------------------------------------
    // [options]
    //------------------------------------------------------------------
    fn read_options(&self, doc: &IniDocument, model: &mut Model) -> Result<RunOptions, String> {
        let section = match doc.section("options") {
            Some(s) => s,
            None => return Ok(RunOptions::default()),
        };

        //refuse the capabilities whose bodies are intentionally absent
        for capability in UNIMPLEMENTED_CAPABILITIES {
            if prop_bool_or(section, capability, false)? {
                return Err(format!(
                    "The '{}' capability is not implemented; disable it in [options] (line {})",
                    capability,
                    section.get(capability).map(|p| p.line_number).unwrap_or(0)
                ));
            }
        }

        let mut options = RunOptions {
            simulate_solids: prop_bool_or(section, "solids", false)?,
            infiltration: prop_bool_or(section, "infiltration", false)?,
            transmission_loss: prop_bool_or(section, "transmission_loss", false)?,
            ..Default::default()
        };

        options.snow = match section.value("snow").unwrap_or("none") {
            "none" => SnowOption::None,
            "partition" => SnowOption::RainPartition,
            "gages" => SnowOption::Gages,
            other => return Err(format!("Unknown snow option '{}'", other)),
        };
        options.melt = match section.value("melt_ddf") {
            //mm per degree C per day to m per degree C per second
            Some(v) => MeltOption::DegreeDay {
                ddf: parse_f64(v, "melt_ddf")? / 1000.0 / 86400.0,
            },
            None => MeltOption::None,
        };
        options.overland_erosion = match section.value("overland_erosion").unwrap_or("capacity") {
            "capacity" => OverlandErosionMode::Capacity,
            "shear" => OverlandErosionMode::ExcessShear,
            other => return Err(format!("Unknown overland erosion option '{}'", other)),
        };
        options.channel_erosion = match section.value("channel_erosion").unwrap_or("capacity") {
            "capacity" => ChannelErosionMode::Capacity,
            "capacity_grain" => ChannelErosionMode::CapacityGrain,
            "shear" => ChannelErosionMode::ExcessShear,
            other => return Err(format!("Unknown channel erosion option '{}'", other)),
        };
        options.deposition = match section.value("deposition").unwrap_or("below_critical") {
            "below_critical" => DepositionOption::BelowCritical,
            "always" => DepositionOption::Always,
            other => return Err(format!("Unknown deposition option '{}'", other)),
        };

        options.scale.adv_ov = prop_f64_or(section, "adv_ov_scale", 1.0)?;
        options.scale.adv_ch = prop_f64_or(section, "adv_ch_scale", 1.0)?;
        options.scale.dsp_ov = prop_f64_or(section, "dsp_ov_scale", 1.0)?;
        options.scale.dsp_ch = prop_f64_or(section, "dsp_ch_scale", 1.0)?;
        options.scale.ers_ov = prop_f64_or(section, "ers_ov_scale", 1.0)?;
        options.scale.ers_ch = prop_f64_or(section, "ers_ch_scale", 1.0)?;
        options.scale.dep_ov = prop_f64_or(section, "dep_ov_scale", 1.0)?;
        options.scale.dep_ch = prop_f64_or(section, "dep_ch_scale", 1.0)?;

        model.initial = InitialConditions {
            h_overland: prop_f64_or(section, "h_overland0", 0.0)?,
            h_channel: prop_f64_or(section, "h_channel0", 0.0)?,
            swe: prop_f64_or(section, "swe0", 0.0)?,
        };
        model.overland_bed = OverlandBed {
            thickness: prop_f64_or(section, "soil_thickness", 0.0)?,
            porosity: prop_f64_or(section, "soil_porosity", 0.4)?,
            gsd: prop_f64_list(section, "soil_gsd").unwrap_or_default(),
        };

        Ok(options)
    }

    //------------------------------------------------------------------
    // [solids.N]
    //------------------------------------------------------------------
    fn read_solids(&self, doc: &IniDocument, model: &mut Model) -> Result<(), String> {
        let sections = doc.numbered_sections("solids")?;
        let mut classes = Vec::with_capacity(sections.len());
        for s in sections {
            let ds = prop_f64(s, "diameter")?;
            let specific_gravity = prop_f64_or(s, "specific_gravity", 2.65)?;
            let settling_velocity = match s.value("settling_velocity") {
                Some(v) => parse_f64(v, "settling_velocity")?,
                None => SolidsClass::stokes_settling_velocity(ds, specific_gravity),
            };
            classes.push(SolidsClass {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                ds,
                specific_gravity,
                settling_velocity,
                tce: prop_f64_or(s, "tce", f64::INFINITY)?,
                tcd: prop_f64_or(s, "tcd", 0.0)?,
                z_age: prop_f64_or(s, "z_age", 1.0)?,
                cohesion: if prop_bool_or(s, "cohesive", false)? {
                    Cohesion::Cohesive
                } else {
                    Cohesion::NonCohesive
                },
                group: prop_usize_or(s, "group", 1)?,
            });
        }
        model.catalog = SolidsCatalog::new(classes);
        Ok(())
    }

    //------------------------------------------------------------------
    // [outlet.N]
    //------------------------------------------------------------------
    fn read_outlets(&self, doc: &IniDocument, model: &mut Model) -> Result<(), String> {
        let sections = doc.numbered_sections("outlet")?;
        for s in sections {
            let (row, col) = one_based_cell(s)?;
            let slope = match s.value("slope") {
                Some(v) => parse_f64(v, "slope")?,
                None => {
                    if model.grid.in_bounds(row as i64, col as i64) {
                        model.grid.slope[model.grid.idx(row, col)]
                    } else {
                        0.0
                    }
                }
            };
            let depth = match self.load_series(s, "depth_series", "depth_file", 1.0)? {
                Some(ts) => BoundaryDepth::SpecifiedDepth(ts),
                None => BoundaryDepth::NormalDepth,
            };
            model.outlets.push(Outlet {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                row,
                col,
                slope,
                depth,
            });
        }
        Ok(())
    }

    //------------------------------------------------------------------
    // forcing sections
    //------------------------------------------------------------------
    fn read_forcings(&self, doc: &IniDocument, model: &Model) -> Result<Forcings, String> {
        let mut forcings = Forcings::default();

        //precipitation: gages or a grid sequence
        if let Some(s) = doc.section("raingrid") {
            forcings.precip = PrecipInput::Grids {
                root: self.resolve(require_prop(s, "root")?),
                freq_hours: prop_f64(s, "freq")?,
            };
        } else {
            let mut gages = Vec::new();
            for s in doc.numbered_sections("rain")? {
                gages.push(self.read_gage(s, MM_PER_HR_TO_M_PER_S)?);
            }
            forcings.precip = PrecipInput::Gages(gages);
        }

        for s in doc.numbered_sections("snow")? {
            forcings.snow_gages.push(self.read_gage(s, MM_PER_HR_TO_M_PER_S)?);
        }

        if let Some(s) = doc.section("airtemp") {
            forcings.air_temp = self.load_series(s, "series", "file", 1.0)?;
            if forcings.air_temp.is_none() {
                return Err("Section [airtemp] defines no series".to_string());
            }
        }

        for s in doc.numbered_sections("flow")? {
            let target = self.read_flow_target(s, model)?;
            let series = self
                .load_series(s, "series", "file", 1.0)?
                .ok_or_else(|| format!("Section [{}] defines no series", s.name))?;
            forcings.flows.push(FlowSource {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                target,
                series,
            });
        }

        for s in doc.numbered_sections("load")? {
            let class = prop_usize(s, "class")?;
            if class == 0 || class > model.catalog.n_classes() {
                return Err(format!(
                    "Section [{}]: solids class {} is not defined",
                    s.name, class
                ));
            }
            let target = if prop_bool_or(s, "distributed", false)? {
                LoadTarget::OverlandDistributed
            } else {
                match self.read_flow_target(s, model)? {
                    FlowTarget::OverlandCell { row, col } => LoadTarget::OverlandCell { row, col },
                    FlowTarget::ChannelNode { link, node } => {
                        LoadTarget::ChannelNode { link, node }
                    }
                }
            };
            let mode = match s.value("mode").unwrap_or("mass") {
                "mass" => LoadMode::MassPerDay,
                "concentration" => LoadMode::Concentration,
                other => return Err(format!("Unknown load mode '{}'", other)),
            };
            let series = self
                .load_series(s, "series", "file", 1.0)?
                .ok_or_else(|| format!("Section [{}] defines no series", s.name))?;
            forcings.loads.push(SolidsLoad {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                class,
                target,
                mode,
                series,
            });
        }

        for s in doc.numbered_sections("boundary")? {
            let outlet = prop_usize(s, "outlet")?;
            if outlet == 0 || outlet > model.outlets.len() {
                return Err(format!(
                    "Section [{}]: outlet {} is not defined",
                    s.name, outlet
                ));
            }
            let class = prop_usize(s, "class")?;
            if class == 0 || class > model.catalog.n_classes() {
                return Err(format!(
                    "Section [{}]: solids class {} is not defined",
                    s.name, class
                ));
            }
            let series = self
                .load_series(s, "series", "file", 1.0)?
                .ok_or_else(|| format!("Section [{}] defines no series", s.name))?;
            forcings.boundary_concs.push(BoundaryConcentration {
                outlet: outlet - 1,
                class,
                series,
            });
        }

        Ok(forcings)
    }

    fn read_gage(&self, section: &IniSection, scale: f64) -> Result<Gage, String> {
        let series = self
            .load_series(section, "series", "file", scale)?
            .ok_or_else(|| format!("Section [{}] defines no series", section.name))?;
        Ok(Gage {
            name: section.value("name").unwrap_or(&section.name).to_string(),
            x: prop_f64_or(section, "x", 0.0)?,
            y: prop_f64_or(section, "y", 0.0)?,
            series,
        })
    }

    fn read_flow_target(
        &self,
        section: &IniSection,
        model: &Model,
    ) -> Result<FlowTarget, String> {
        if let Some(cell) = section.value("cell") {
            let (row, col) = parse_pair(cell, "cell")?;
            if row == 0 || col == 0 {
                return Err(format!("Section [{}]: cell indices count from 1", section.name));
            }
            let (row, col) = (row - 1, col - 1);
            if !model.grid.in_bounds(row as i64, col as i64)
                || !model.grid.is_in_domain(row, col)
            {
                return Err(format!(
                    "Section [{}]: cell {},{} is outside the domain",
                    section.name,
                    row + 1,
                    col + 1
                ));
            }
            return Ok(FlowTarget::OverlandCell { row, col });
        }
        if let Some(node) = section.value("node") {
            let (link, node) = parse_pair(node, "node")?;
            if link == 0
                || node == 0
                || link > model.net.nlinks
                || node > model.net.nodes_per_link[link - 1]
            {
                return Err(format!(
                    "Section [{}]: link {} node {} is not in the channel network",
                    section.name, link, node
                ));
            }
            return Ok(FlowTarget::ChannelNode {
                link: link - 1,
                node: node - 1,
            });
        }
        Err(format!(
            "Section [{}] must name a 'cell = row,col' or a 'node = link,node' target",
            section.name
        ))
    }

    //------------------------------------------------------------------
    // [output] / [report.N]
    //------------------------------------------------------------------
    fn read_output(&self, doc: &IniDocument, model: &mut Model) -> Result<(), String> {
        if let Some(s) = doc.section("output") {
            model.output = OutputConfig {
                echo_file: s.value("echo").map(|v| self.resolve(v)),
                water_export: s.value("water_export").map(|v| self.resolve(v)),
                sed_export_root: s.value("sed_export_root").map(|v| self.resolve(v)),
                end_grid_root: s.value("end_grid_root").map(|v| self.resolve(v)),
            };
            model.report_dt_hours = prop_f64_or(s, "report_dt", 1.0)?;
        }

        for s in doc.numbered_sections("report")? {
            let (row, col) = one_based_cell(s)?;
            model.stations.push(ReportStation {
                name: s.value("name").unwrap_or(&s.name).to_string(),
                row,
                col,
                units: match s.value("units").unwrap_or("gm3") {
                    "gm3" => SedUnits::Concentration,
                    "mtday" => SedUnits::MassPerDay,
                    other => return Err(format!("Unknown report units '{}'", other)),
                },
            });
        }
        Ok(())
    }

    //------------------------------------------------------------------
    // series loading
    //------------------------------------------------------------------

    /// Load a time series from an inline `t:v, t:v, ...` list or from a
    /// CSV file reference, applying the unit conversion factor once.
    fn load_series(
        &self,
        section: &IniSection,
        inline_key: &str,
        file_key: &str,
        scale: f64,
    ) -> Result<Option<TimeSeries>, String> {
        if let Some(raw) = section.value(inline_key) {
            let mut ts = TimeSeries::new(section.value("name").unwrap_or(&section.name));
            for part in raw.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let (t_str, v_str) = part.split_once(':').ok_or_else(|| {
                    format!(
                        "Section [{}] line {}: bad breakpoint '{}', expected hours:value",
                        section.name,
                        section.get(inline_key).map(|p| p.line_number).unwrap_or(0),
                        part
                    )
                })?;
                let t: f64 = t_str
                    .trim()
                    .parse()
                    .map_err(|_| format!("Bad breakpoint time '{}'", t_str))?;
                let v: f64 = v_str
                    .trim()
                    .parse()
                    .map_err(|_| format!("Bad breakpoint value '{}'", v_str))?;
                ts.push(t, v);
            }
            ts.validate()?;
            ts.scale_values(scale);
            return Ok(Some(ts));
        }

        if let Some(file) = section.value(file_key) {
            let path = self.resolve(file);
            let mut ts = match section.value("column") {
                Some(column) => {
                    csv_io::read_series_column(&path, column).map_err(String::from)?
                }
                None => {
                    let mut all = csv_io::read_series(&path).map_err(String::from)?;
                    if all.is_empty() {
                        return Err(format!("'{}' contains no data columns", path));
                    }
                    all.remove(0)
                }
            };
            ts.scale_values(scale);
            return Ok(Some(ts));
        }

        Ok(None)
    }

    fn resolve(&self, path: &str) -> String {
        match &self.working_directory {
            Some(dir) if Path::new(path).is_relative() => {
                dir.join(path).to_string_lossy().to_string()
            }
            _ => path.to_string(),
        }
    }
}

//----------------------------------------------------------------------
// channel geometry parsing
//----------------------------------------------------------------------

fn read_geometry(
    section: &IniSection,
    defaults: Option<&ChannelGeometry>,
) -> Result<ChannelGeometry, String> {
    let base = defaults.cloned().unwrap_or_default();
    let get = |key: &str, fallback: f64| -> Result<f64, String> {
        match section.value(key) {
            Some(v) => parse_f64(v, key),
            None => {
                if defaults.is_none() {
                    Err(format!(
                        "Section [{}] is missing required key '{}'",
                        section.name, key
                    ))
                } else {
                    Ok(fallback)
                }
            }
        }
    };

    Ok(ChannelGeometry {
        bottom_width: get("bottom_width", base.bottom_width)?,
        bank_height: get("bank_height", base.bank_height)?,
        side_slope: get("side_slope", base.side_slope)?,
        manning_n: get("manning_n", base.manning_n)?,
        sinuosity: prop_f64_or(section, "sinuosity", if defaults.is_none() { 1.0 } else { base.sinuosity })?,
        erosion_coeff: prop_f64_or(section, "erosion_coeff", base.erosion_coeff)?,
        erosion_exponent: prop_f64_or(
            section,
            "erosion_exponent",
            if defaults.is_none() { 1.0 } else { base.erosion_exponent },
        )?,
        kh_bed: prop_f64_or(section, "kh_bed", base.kh_bed)?,
        capillary_suction_bed: prop_f64_or(section, "capillary_suction_bed", base.capillary_suction_bed)?,
        moisture_deficit_bed: prop_f64_or(section, "moisture_deficit_bed", base.moisture_deficit_bed)?,
        bed_porosity: prop_f64_or(section, "bed_porosity", if defaults.is_none() { 0.4 } else { base.bed_porosity })?,
        bed_thickness: prop_f64_or(section, "bed_thickness", base.bed_thickness)?,
        ..Default::default()
    }
    .finish())
}

//----------------------------------------------------------------------
// property helpers
//----------------------------------------------------------------------

fn require_section<'a>(doc: &'a IniDocument, name: &str) -> Result<&'a IniSection, String> {
    doc.section(name)
        .ok_or_else(|| format!("The deck is missing its [{}] section", name))
}

fn require_prop<'a>(section: &'a IniSection, key: &str) -> Result<&'a str, String> {
    section.value(key).ok_or_else(|| {
        format!(
            "Section [{}] (line {}) is missing required key '{}'",
            section.name, section.line_number, key
        )
    })
}

fn parse_f64(value: &str, key: &str) -> Result<f64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Bad numeric value '{}' for '{}'", value, key))
}

fn prop_f64(section: &IniSection, key: &str) -> Result<f64, String> {
    parse_f64(require_prop(section, key)?, key)
}

fn prop_f64_or(section: &IniSection, key: &str, fallback: f64) -> Result<f64, String> {
    match section.value(key) {
        Some(v) => parse_f64(v, key),
        None => Ok(fallback),
    }
}

fn prop_usize(section: &IniSection, key: &str) -> Result<usize, String> {
    require_prop(section, key)?
        .trim()
        .parse()
        .map_err(|_| format!("Bad integer value for '{}' in [{}]", key, section.name))
}

fn prop_usize_or(section: &IniSection, key: &str, fallback: usize) -> Result<usize, String> {
    match section.value(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| format!("Bad integer value '{}' for '{}'", v, key)),
        None => Ok(fallback),
    }
}

fn prop_bool_or(section: &IniSection, key: &str, fallback: bool) -> Result<bool, String> {
    match section.value(key) {
        Some(v) => match v.trim() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(format!("Bad boolean value '{}' for '{}'", other, key)),
        },
        None => Ok(fallback),
    }
}

fn prop_f64_list(section: &IniSection, key: &str) -> Option<Vec<f64>> {
    section.value(key).map(|raw| {
        raw.split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect()
    })
}

/// Read a 1-based (row, col) pair from a section and convert to 0-based.
fn one_based_cell(section: &IniSection) -> Result<(usize, usize), String> {
    let row = prop_usize(section, "row")?;
    let col = prop_usize(section, "col")?;
    if row == 0 || col == 0 {
        return Err(format!(
            "Section [{}]: row and col count from 1",
            section.name
        ));
    }
    Ok((row - 1, col - 1))
}

fn parse_pair(value: &str, key: &str) -> Result<(usize, usize), String> {
    let (a, b) = value
        .split_once(',')
        .ok_or_else(|| format!("Bad '{}' value '{}': expected two comma-separated integers", key, value))?;
    let a = a
        .trim()
        .parse()
        .map_err(|_| format!("Bad '{}' value '{}'", key, value))?;
    let b = b
        .trim()
        .parse()
        .map_err(|_| format!("Bad '{}' value '{}'", key, value))?;
    Ok((a, b))
}
