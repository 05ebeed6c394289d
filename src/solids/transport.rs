// Phase 7 driver: assemble every outflux, reconcile against supply,
// mirror influxes, then update water-column and bed concentrations by
// mass accounting. The two-pass schedule guarantees that what an
// upstream reservoir sends is exactly what its neighbor receives.

use crate::forcing::{FlowTarget, LoadMode, LoadTarget, SolidsLoad};
use crate::model::{overland_surface_area, Model, RunState};
use crate::solids::{advection, deposition, dispersion, erosion};
use crate::topology::N_SOURCES;

pub fn solids_phase(model: &Model, state: &mut RunState) -> Result<(), String> {
    reset_fluxes(model, state);

    //gross outfluxes
    deposition::deposition_phase(model, state);
    advection::assemble_outflux_overland(model, state);
    advection::assemble_outflux_channel(model, state);
    dispersion::assemble_overland(model, state);
    dispersion::assemble_channel(model, state);

    //supply rule: advection, floodplain, boundary, loads and deposition
    //downscale together against the water column
    advection::supply_scale_water_column(model, state);

    //erosion sees the reconciled outfluxes and limits against the bed
    erosion::erosion_overland(model, state);
    erosion::erosion_channel(model, state);

    //influxes mirror the reconciled outfluxes
    advection::apply_influxes(model, state);
    dispersion::apply_influxes(model, state);

    update_concentrations(model, state);
    Ok(())
}

fn reset_fluxes(model: &Model, state: &mut RunState) {
    for s in 0..=model.catalog.n_classes() {
        for i in 0..model.grid.n_cells() {
            state.sed.adv_ov_in[s][i] = [0.0; N_SOURCES];
            state.sed.adv_ov_out[s][i] = [0.0; N_SOURCES];
            state.sed.dsp_ov_in[s][i] = [0.0; N_SOURCES];
            state.sed.dsp_ov_out[s][i] = [0.0; N_SOURCES];
            state.sed.ers_ov[s][i] = 0.0;
            state.sed.dep_ov[s][i] = 0.0;
        }
        for (l, n) in model.net.nodes() {
            state.sed.adv_ch_in[s][l][n] = [0.0; N_SOURCES];
            state.sed.adv_ch_out[s][l][n] = [0.0; N_SOURCES];
            state.sed.dsp_ch_in[s][l][n] = [0.0; N_SOURCES];
            state.sed.dsp_ch_out[s][l][n] = [0.0; N_SOURCES];
            state.sed.ers_ch[s][l][n] = 0.0;
            state.sed.dep_ch[s][l][n] = 0.0;
        }
    }
}

/// Mass accounting over the step: new concentration = (old mass + influx
/// mass - outflux mass) / new volume, with bed exchange applied to the
/// sediment stacks. A column that dries up settles its residual mass
/// onto the bed so no mass is created or destroyed.
fn update_concentrations(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    let n_classes = model.catalog.n_classes();

    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let area = overland_surface_area(model, i);
        let vol_old = state.ov.h[i] * area;
        let vol_new = state.ov.h_new[i] * area;

        let mut eroded = vec![0.0; n_classes + 1];
        let mut deposited = vec![0.0; n_classes + 1];
        let mut total_conc = 0.0;

        for s in 1..=n_classes {
            let mut mass_in = state.sed.ers_ov[s][i] * dt;
            let mut mass_out = state.sed.dep_ov[s][i] * dt;
            for k in 0..N_SOURCES {
                mass_in += (state.sed.adv_ov_in[s][i][k] + state.sed.dsp_ov_in[s][i][k]) * dt;
                mass_out += (state.sed.adv_ov_out[s][i][k] + state.sed.dsp_ov_out[s][i][k]) * dt;
            }
            let mut mass = state.sed.cov[s][i] * vol_old + mass_in - mass_out;
            if mass < 0.0 {
                mass = 0.0;
            }

            eroded[s] = state.sed.ers_ov[s][i] * dt;
            deposited[s] = state.sed.dep_ov[s][i] * dt;

            let conc = if vol_new > 0.0 {
                mass / vol_new
            } else {
                //the column dried up: the remaining mass settles out
                deposited[s] += mass;
                0.0
            };
            state.sed.cov_new[s][i] = conc;
            total_conc += conc;
        }
        state.sed.cov_new[0][i] = total_conc;
        state.sed.stack_ov[i].apply_exchange(&eroded, &deposited, &model.catalog);
    }

    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let length = model.net.length[l][n];
        let vol_old = geom.cross_section_area(state.ch.h[l][n]) * length;
        let vol_new = geom.cross_section_area(state.ch.h_new[l][n]) * length;

        let mut eroded = vec![0.0; n_classes + 1];
        let mut deposited = vec![0.0; n_classes + 1];
        let mut total_conc = 0.0;

        for s in 1..=n_classes {
            let mut mass_in = state.sed.ers_ch[s][l][n] * dt;
            let mut mass_out = state.sed.dep_ch[s][l][n] * dt;
            for k in 0..N_SOURCES {
                mass_in +=
                    (state.sed.adv_ch_in[s][l][n][k] + state.sed.dsp_ch_in[s][l][n][k]) * dt;
                mass_out +=
                    (state.sed.adv_ch_out[s][l][n][k] + state.sed.dsp_ch_out[s][l][n][k]) * dt;
            }
            let mut mass = state.sed.cch[s][l][n] * vol_old + mass_in - mass_out;
            if mass < 0.0 {
                mass = 0.0;
            }

            eroded[s] = state.sed.ers_ch[s][l][n] * dt;
            deposited[s] = state.sed.dep_ch[s][l][n] * dt;

            let conc = if vol_new > 0.0 {
                mass / vol_new
            } else {
                deposited[s] += mass;
                0.0
            };
            state.sed.cch_new[s][l][n] = conc;
            total_conc += conc;
        }
        state.sed.cch_new[0][l][n] = total_conc;
        state.sed.stack_ch[l][n].apply_exchange(&eroded, &deposited, &model.catalog);
    }
}

/// Current load rate in g/s (negative for a sink). Mass-per-day loads
/// convert with 1000/86400; concentration loads ride the net external
/// flow at their target, drawing at the local concentration when the
/// flow is a withdrawal.
pub fn load_rate_g_per_s(model: &Model, state: &RunState, k: usize, load: &SolidsLoad) -> f64 {
    let value = state.forcing.load[k];
    match load.mode {
        LoadMode::MassPerDay => value * 1000.0 / 86400.0,
        LoadMode::Concentration => {
            let q = net_external_flow(model, state, load.target);
            if q >= 0.0 {
                q * value
            } else {
                q * local_concentration(model, state, load.target, load.class)
            }
        }
    }
}

fn net_external_flow(model: &Model, state: &RunState, target: LoadTarget) -> f64 {
    let mut q = 0.0;
    for (k, source) in model.forcings.flows.iter().enumerate() {
        let matches = match (source.target, target) {
            (
                FlowTarget::OverlandCell { row: fr, col: fc },
                LoadTarget::OverlandCell { row, col },
            ) => fr == row && fc == col,
            (
                FlowTarget::ChannelNode { link: fl, node: fn_ },
                LoadTarget::ChannelNode { link, node },
            ) => fl == link && fn_ == node,
            _ => false,
        };
        if matches {
            q += state.forcing.flow[k];
        }
    }
    q
}

fn local_concentration(model: &Model, state: &RunState, target: LoadTarget, class: usize) -> f64 {
    match target {
        LoadTarget::OverlandCell { row, col } => state.sed.cov[class][model.grid.idx(row, col)],
        LoadTarget::ChannelNode { link, node } => state.sed.cch[class][link][node],
        LoadTarget::OverlandDistributed => 0.0,
    }
}

/// Interpolated boundary concentration (g/m3) for one outlet and class;
/// zero when no series is defined.
pub fn boundary_concentration(model: &Model, state: &RunState, outlet: usize, class: usize) -> f64 {
    for (k, bc) in model.forcings.boundary_concs.iter().enumerate() {
        if bc.outlet == outlet && bc.class == class {
            return state.forcing.boundary_conc[k];
        }
    }
    0.0
}
