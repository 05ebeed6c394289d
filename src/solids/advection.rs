// Advective solids fluxes, assembled in two passes so the outflux
// written on one side of an interface is exactly the influx applied on
// the other side after the supply rule has run.
//
// Pass 1 builds every gross outflux (directional flows, boundary
// outflow, negative point loads, floodplain transfer out of the donor)
// and downscales them together with deposition when their sum would
// overdraw the water column. Pass 2 mirrors the reconciled outfluxes
// onto the receiving sides and adds the influxes that have no mirror:
// positive point loads, boundary inflow and erosion.

use crate::forcing::LoadTarget;
use crate::model::{overland_surface_area, Model, RunState};
use crate::solids::transport;
use crate::topology::{Direction, N_SOURCES, SRC_BOUNDARY, SRC_FLOODPLAIN, SRC_POINT};

/// Pass 1a: gross advective outfluxes for every overland cell.
pub fn assemble_outflux_overland(model: &Model, state: &mut RunState) {
    let scale = model.options.scale.adv_ov;
    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        for s in 1..=model.catalog.n_classes() {
            let conc = state.sed.cov[s][i];
            let out = &mut state.sed.adv_ov_out[s][i];
            for d in Direction::AXIAL {
                out[d.code()] = state.ov.dq_out[i][d.code()] * scale * conc;
            }
            out[SRC_BOUNDARY] = state.ov.dq_out[i][SRC_BOUNDARY] * scale * conc;
        }
    }

    //floodplain transfer out of the overland donor
    for (l, n) in model.net.nodes() {
        let rate = state.ch.fp_rate[l][n];
        if rate > 0.0 {
            let i = model.cell_of_node(l, n);
            for s in 1..=model.catalog.n_classes() {
                state.sed.adv_ov_out[s][i][SRC_FLOODPLAIN] = rate * state.sed.cov[s][i];
            }
        }
    }

    //point loads: a negative load is an outflux from its cell
    for (k, load) in model.forcings.loads.iter().enumerate() {
        let rate = transport::load_rate_g_per_s(model, state, k, load);
        if rate >= 0.0 {
            continue;
        }
        if let LoadTarget::OverlandCell { row, col } = load.target {
            let i = model.grid.idx(row, col);
            state.sed.adv_ov_out[load.class][i][SRC_POINT] += -rate;
        }
    }
}

/// Pass 1b: gross advective outfluxes for every channel node.
pub fn assemble_outflux_channel(model: &Model, state: &mut RunState) {
    let scale = model.options.scale.adv_ch;
    for (l, n) in model.net.nodes() {
        for s in 1..=model.catalog.n_classes() {
            let conc = state.sed.cch[s][l][n];
            let out = &mut state.sed.adv_ch_out[s][l][n];
            for d in Direction::ALL {
                out[d.code()] = state.ch.dq_out[l][n][d.code()] * scale * conc;
            }
            out[SRC_BOUNDARY] = state.ch.dq_out[l][n][SRC_BOUNDARY] * scale * conc;

            //floodplain transfer out of a flooding channel
            if state.ch.fp_rate[l][n] < 0.0 {
                out[SRC_FLOODPLAIN] = -state.ch.fp_rate[l][n] * conc;
            }
        }
    }

    for (k, load) in model.forcings.loads.iter().enumerate() {
        let rate = transport::load_rate_g_per_s(model, state, k, load);
        if rate >= 0.0 {
            continue;
        }
        if let LoadTarget::ChannelNode { link, node } = load.target {
            state.sed.adv_ch_out[load.class][link][node][SRC_POINT] += -rate;
        }
    }
}

/// Supply-limiting reconciliation against the water column: when the sum
/// of every outgoing potential (advection in all directions, floodplain
/// transfer, boundary outflow, negative loads, deposition) would exceed
/// the mass present, every outflux is scaled down by the same factor so
/// the reservoir cannot go negative.
pub fn supply_scale_water_column(model: &Model, state: &mut RunState) {
    let dt = state.dt;

    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let volume = state.ov.h[i] * overland_surface_area(model, i);
        for s in 1..=model.catalog.n_classes() {
            let mut potential = state.sed.dep_ov[s][i] * dt;
            for k in 0..N_SOURCES {
                potential += state.sed.adv_ov_out[s][i][k] * dt;
            }
            if potential <= 0.0 {
                continue;
            }
            let available = (state.sed.cov[s][i] * volume).max(0.0);
            if potential > available {
                let factor = available / potential;
                for k in 0..N_SOURCES {
                    state.sed.adv_ov_out[s][i][k] *= factor;
                }
                state.sed.dep_ov[s][i] *= factor;
            }
        }
    }

    for (l, n) in model.net.nodes() {
        let volume =
            model.geometry[l][n].cross_section_area(state.ch.h[l][n]) * model.net.length[l][n];
        for s in 1..=model.catalog.n_classes() {
            let mut potential = state.sed.dep_ch[s][l][n] * dt;
            for k in 0..N_SOURCES {
                potential += state.sed.adv_ch_out[s][l][n][k] * dt;
            }
            if potential <= 0.0 {
                continue;
            }
            let available = (state.sed.cch[s][l][n] * volume).max(0.0);
            if potential > available {
                let factor = available / potential;
                for k in 0..N_SOURCES {
                    state.sed.adv_ch_out[s][l][n][k] *= factor;
                }
                state.sed.dep_ch[s][l][n] *= factor;
            }
        }
    }
}

/// Pass 2: apply influxes. Directional and floodplain influxes mirror
/// the reconciled outfluxes of the sending side; point loads, boundary
/// inflow and erosion are added directly.
pub fn apply_influxes(model: &Model, state: &mut RunState) {
    let n_classes = model.catalog.n_classes();

    //overland interfaces: the influx seen on one side is the (possibly
    //scaled) outflux the other side produced
    for iface in &model.overland_interfaces {
        let k_from = iface.dir.code();
        let k_to = iface.dir.opposite().code();
        for s in 1..=n_classes {
            state.sed.adv_ov_in[s][iface.to][k_to] = state.sed.adv_ov_out[s][iface.from][k_from];
            state.sed.adv_ov_in[s][iface.from][k_from] = state.sed.adv_ov_out[s][iface.to][k_to];
        }
    }

    //channel interfaces
    for iface in &model.net.interfaces {
        for s in 1..=n_classes {
            state.sed.adv_ch_in[s][iface.down_link][iface.down_node][iface.down_source] =
                state.sed.adv_ch_out[s][iface.up_link][iface.up_node][iface.up_source];
            state.sed.adv_ch_in[s][iface.up_link][iface.up_node][iface.up_source] =
                state.sed.adv_ch_out[s][iface.down_link][iface.down_node][iface.down_source];
        }
    }

    //floodplain mirror
    for (l, n) in model.net.nodes() {
        let i = model.cell_of_node(l, n);
        let rate = state.ch.fp_rate[l][n];
        if rate > 0.0 {
            for s in 1..=n_classes {
                state.sed.adv_ch_in[s][l][n][SRC_FLOODPLAIN] =
                    state.sed.adv_ov_out[s][i][SRC_FLOODPLAIN];
            }
        } else if rate < 0.0 {
            for s in 1..=n_classes {
                state.sed.adv_ov_in[s][i][SRC_FLOODPLAIN] =
                    state.sed.adv_ch_out[s][l][n][SRC_FLOODPLAIN];
            }
        }
    }

    //positive point loads
    for (k, load) in model.forcings.loads.iter().enumerate() {
        let rate = transport::load_rate_g_per_s(model, state, k, load);
        if rate <= 0.0 {
            continue;
        }
        match load.target {
            LoadTarget::OverlandCell { row, col } => {
                let i = model.grid.idx(row, col);
                state.sed.adv_ov_in[load.class][i][SRC_POINT] += rate;
            }
            LoadTarget::ChannelNode { link, node } => {
                state.sed.adv_ch_in[load.class][link][node][SRC_POINT] += rate;
            }
            LoadTarget::OverlandDistributed => {
                //spread over the domain weighted by overland area
                let total: f64 = model
                    .grid
                    .domain_cells()
                    .map(|(r, c)| overland_surface_area(model, model.grid.idx(r, c)))
                    .sum();
                if total > 0.0 {
                    for (r, c) in model.grid.domain_cells() {
                        let i = model.grid.idx(r, c);
                        let share = overland_surface_area(model, i) / total;
                        state.sed.adv_ov_in[load.class][i][SRC_POINT] += rate * share;
                    }
                }
            }
        }
    }

    //boundary inflow at outlet last nodes (reverse flow across the
    //domain boundary carries the specified boundary concentration when
    //the outlet depth is specified, and nothing when it is normal depth)
    for (l, outlet_idx) in model.outlet_of_link.iter().enumerate() {
        let o = match outlet_idx {
            Some(o) => *o,
            None => continue,
        };
        let n = model.net.nodes_per_link[l] - 1;
        let q_in = state.ch.dq_in[l][n][SRC_BOUNDARY];
        if q_in <= 0.0 {
            continue;
        }
        if !model.outlets[o].depth_is_specified() {
            continue;
        }
        for s in 1..=n_classes {
            let cin = transport::boundary_concentration(model, state, o, s);
            state.sed.adv_ch_in[s][l][n][SRC_BOUNDARY] =
                q_in * model.options.scale.adv_ch * cin;
        }
    }

}
