// Dispersive solids fluxes. The bulk dispersive flow across an
// interface is E * A_mix / L_mix, with the longitudinal coefficient
// E = 250*h*u* along the flow axis and the transverse coefficient
// E = 0.6*h*u* for the floodplain pair (Julien, 1998). The flux runs
// down the concentration gradient; the donor side's depth and friction
// velocity set the coefficient, and the influx applied on the receiving
// side is the same flux, so interfaces conserve mass exactly.
//
// Degenerate geometry (dry interface, zero mixing length) falls back to
// a unit mixing length with zero mixing area, which produces zero flux.

use crate::hydrology::shear;
use crate::model::{Model, RunState};
use crate::outlets::BoundaryDepth;
use crate::solids::transport;
use crate::topology::{SRC_BOUNDARY, SRC_FLOODPLAIN};

const E_LONGITUDINAL: f64 = 250.0;
const E_TRANSVERSE: f64 = 0.6;

/// Pass 1: dispersive outfluxes across every overland interface.
pub fn assemble_overland(model: &Model, state: &mut RunState) {
    let w = model.grid.cell_size;
    let scale = model.options.scale.dsp_ov;

    for iface in &model.overland_interfaces {
        let a = iface.from;
        let b = iface.to;
        let mix_length = w;
        let mix_area = 0.5 * (state.ov.h[a] + state.ov.h[b]) * w;
        if mix_area <= 0.0 {
            continue;
        }

        for s in 1..=model.catalog.n_classes() {
            let cgrad = state.sed.cov[s][a] - state.sed.cov[s][b];
            if cgrad == 0.0 {
                continue;
            }
            //the donor (higher concentration) side sets the coefficient
            let donor = if cgrad > 0.0 { a } else { b };
            let sf = shear::overland_friction_slope(&state.ov.sf[donor]);
            let ustar = shear::overland_friction_velocity(state.ov.h[donor], sf);
            let elong = E_LONGITUDINAL * state.ov.h[donor] * ustar;
            let flow = elong * mix_area / mix_length * scale;
            let flux = flow * cgrad.abs();

            if cgrad > 0.0 {
                state.sed.dsp_ov_out[s][a][iface.dir.code()] = flux;
            } else {
                state.sed.dsp_ov_out[s][b][iface.dir.opposite().code()] = flux;
            }
        }
    }
}

/// Pass 1: dispersive outfluxes across every channel interface, the
/// floodplain transverse pair and the outlet boundary.
pub fn assemble_channel(model: &Model, state: &mut RunState) {
    let scale = model.options.scale.dsp_ch;

    for iface in &model.net.interfaces {
        let (ul, un) = (iface.up_link, iface.up_node);
        let (dl, dn) = (iface.down_link, iface.down_node);

        //redesigned mixing length: half-sum of the two nodal lengths
        let mix_length = 0.5 * (model.net.length[ul][un] + model.net.length[dl][dn]);
        let mix_length = if mix_length > 0.0 { mix_length } else { 1.0 };
        let area_u = model.geometry[ul][un].cross_section_area(state.ch.h[ul][un]);
        let area_d = model.geometry[dl][dn].cross_section_area(state.ch.h[dl][dn]);
        let mix_area = 0.5 * (area_u + area_d);
        if mix_area <= 0.0 {
            continue;
        }

        for s in 1..=model.catalog.n_classes() {
            let cgrad = state.sed.cch[s][ul][un] - state.sed.cch[s][dl][dn];
            if cgrad == 0.0 {
                continue;
            }
            let (donor_l, donor_n, donor_source) = if cgrad > 0.0 {
                (ul, un, iface.up_source)
            } else {
                (dl, dn, iface.down_source)
            };
            let h = state.ch.h[donor_l][donor_n];
            let hyd = shear::channel_hydraulics(
                &model.geometry[donor_l][donor_n],
                h,
                state.ch.sf[donor_l][donor_n],
            );
            let elong = E_LONGITUDINAL * h * hyd.ustar;
            let flow = elong * mix_area / mix_length * scale;
            state.sed.dsp_ch_out[s][donor_l][donor_n][donor_source] = flow * cgrad.abs();
        }
    }

    //floodplain transverse dispersion: channel cells over bank only
    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let h = state.ch.h[l][n];
        if h <= geom.bank_height {
            continue;
        }
        let i = model.cell_of_node(l, n);
        let length = model.net.length[l][n];
        let mix_length = 0.5 * model.grid.cell_size;
        //transverse areas on both banks, hence the doubling
        let area_ch = length * (h - geom.bank_height);
        let area_ov = length * state.ov.h[i];
        let mix_area = 2.0 * 0.5 * (area_ch + area_ov);
        if mix_area <= 0.0 {
            continue;
        }
        let hyd = shear::channel_hydraulics(geom, h, state.ch.sf[l][n]);
        let etrans = E_TRANSVERSE * h * hyd.ustar;
        let flow = etrans * mix_area / mix_length * scale;

        for s in 1..=model.catalog.n_classes() {
            let cgrad = state.sed.cch[s][l][n] - state.sed.cov[s][i];
            if cgrad > 0.0 {
                state.sed.dsp_ch_out[s][l][n][SRC_FLOODPLAIN] = flow * cgrad;
            } else if cgrad < 0.0 {
                state.sed.dsp_ov_out[s][i][SRC_FLOODPLAIN] = flow * (-cgrad);
            }
        }
    }

    //outlet boundary dispersion
    for (l, outlet_idx) in model.outlet_of_link.iter().enumerate() {
        let o = match outlet_idx {
            Some(o) => *o,
            None => continue,
        };
        let n = model.net.nodes_per_link[l] - 1;
        let outlet = &model.outlets[o];
        match &outlet.depth {
            //normal depth: zero gradient and zero mixing area (no flux)
            BoundaryDepth::NormalDepth => {}
            BoundaryDepth::SpecifiedDepth(_) => {
                let geom = &model.geometry[l][n];
                let h = state.ch.h[l][n];
                let mix_length = model.net.length[l][n].max(1.0);
                let mix_area = geom.cross_section_area(h);
                if mix_area <= 0.0 {
                    continue;
                }
                let hyd = shear::channel_hydraulics(geom, h, state.ch.sf[l][n]);
                let flow = E_LONGITUDINAL * h * hyd.ustar * mix_area / mix_length * scale;
                for s in 1..=model.catalog.n_classes() {
                    let cin = transport::boundary_concentration(model, state, o, s);
                    let cgrad = state.sed.cch[s][l][n] - cin;
                    if cgrad > 0.0 {
                        state.sed.dsp_ch_out[s][l][n][SRC_BOUNDARY] = flow * cgrad;
                    } else if cgrad < 0.0 {
                        state.sed.dsp_ch_in[s][l][n][SRC_BOUNDARY] = flow * (-cgrad);
                    }
                }
            }
        }
    }
}

/// Pass 2: mirror dispersive influxes across interfaces and the
/// floodplain pair.
pub fn apply_influxes(model: &Model, state: &mut RunState) {
    let n_classes = model.catalog.n_classes();

    for iface in &model.overland_interfaces {
        let k_from = iface.dir.code();
        let k_to = iface.dir.opposite().code();
        for s in 1..=n_classes {
            state.sed.dsp_ov_in[s][iface.to][k_to] = state.sed.dsp_ov_out[s][iface.from][k_from];
            state.sed.dsp_ov_in[s][iface.from][k_from] = state.sed.dsp_ov_out[s][iface.to][k_to];
        }
    }

    for iface in &model.net.interfaces {
        for s in 1..=n_classes {
            state.sed.dsp_ch_in[s][iface.down_link][iface.down_node][iface.down_source] =
                state.sed.dsp_ch_out[s][iface.up_link][iface.up_node][iface.up_source];
            state.sed.dsp_ch_in[s][iface.up_link][iface.up_node][iface.up_source] =
                state.sed.dsp_ch_out[s][iface.down_link][iface.down_node][iface.down_source];
        }
    }

    for (l, n) in model.net.nodes() {
        let i = model.cell_of_node(l, n);
        for s in 1..=n_classes {
            state.sed.dsp_ov_in[s][i][SRC_FLOODPLAIN] = state.sed.dsp_ch_out[s][l][n][SRC_FLOODPLAIN];
            state.sed.dsp_ch_in[s][l][n][SRC_FLOODPLAIN] =
                state.sed.dsp_ov_out[s][i][SRC_FLOODPLAIN];
        }
    }
}
