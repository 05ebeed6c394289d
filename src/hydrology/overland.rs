// Overland flow and depth. Flow between adjacent cells is diffusive-
// kinematic Manning routing on the water-surface slope over the four
// axial directions; depth-integrated conveyance uses the donor cell's
// effective depth (ponded depth above depression storage).

use crate::grid::TOLERANCE;
use crate::model::{overland_surface_area, Model, RunState};
use crate::topology::{SRC_BOUNDARY, SRC_POINT};

/// Manning overland discharge (m3/s) across one cell face of width w.
fn manning_overland_flow(h_eff: f64, sf: f64, n: f64, w: f64) -> f64 {
    if h_eff <= 0.0 || sf <= 0.0 || n <= 0.0 {
        return 0.0;
    }
    h_eff.powf(5.0 / 3.0) * f64::sqrt(sf) * w / n
}

/// Phase 4a: flow across every overland interface, external point flows
/// and overland outlet flows. Reads previous-step depths only.
pub fn route(model: &Model, state: &mut RunState) {
    let w = model.grid.cell_size;

    for i in 0..model.grid.n_cells() {
        state.ov.dq_in[i] = [0.0; crate::topology::N_SOURCES];
        state.ov.dq_out[i] = [0.0; crate::topology::N_SOURCES];
        state.ov.sf[i] = [0.0; 9];
    }

    for iface in &model.overland_interfaces {
        let a = iface.from;
        let b = iface.to;
        let wse_a = model.grid.elevation[a] + state.ov.h[a];
        let wse_b = model.grid.elevation[b] + state.ov.h[b];
        let sf = (wse_a - wse_b) / w;

        if sf > 0.0 {
            let land = &model.land_uses[model.grid.land_use[a]];
            let h_eff = (state.ov.h[a] - land.depression_storage).max(0.0);
            let q = manning_overland_flow(h_eff, sf, land.manning_n, w);
            state.ov.dq_out[a][iface.dir.code()] += q;
            state.ov.dq_in[b][iface.dir.opposite().code()] += q;
            state.ov.sf[a][iface.dir.code()] = sf;
        } else if sf < 0.0 {
            let land = &model.land_uses[model.grid.land_use[b]];
            let h_eff = (state.ov.h[b] - land.depression_storage).max(0.0);
            let q = manning_overland_flow(h_eff, -sf, land.manning_n, w);
            state.ov.dq_out[b][iface.dir.opposite().code()] += q;
            state.ov.dq_in[a][iface.dir.code()] += q;
            state.ov.sf[b][iface.dir.opposite().code()] = -sf;
        }
    }

    //overland outflow across the boundary at outlet cells (normal depth
    //on the outlet ground slope); the boundary slope joins the cell's
    //friction slope components so shear at the outlet stays finite
    for outlet in &model.outlets {
        let i = model.grid.idx(outlet.row, outlet.col);
        let land = &model.land_uses[model.grid.land_use[i]];
        let h_eff = (state.ov.h[i] - land.depression_storage).max(0.0);
        let q = manning_overland_flow(h_eff, outlet.slope, land.manning_n, w);
        state.ov.dq_out[i][SRC_BOUNDARY] += q;
        let boundary_slot = crate::topology::Direction::South.code();
        state.ov.sf[i][boundary_slot] = state.ov.sf[i][boundary_slot].max(outlet.slope);
    }

    //external point flows (sources and sinks)
    for (k, source) in model.forcings.flows.iter().enumerate() {
        if let crate::forcing::FlowTarget::OverlandCell { row, col } = source.target {
            let i = model.grid.idx(row, col);
            let q = state.forcing.flow[k];
            if q >= 0.0 {
                state.ov.dq_in[i][SRC_POINT] += q;
            } else {
                state.ov.dq_out[i][SRC_POINT] += -q;
            }
        }
    }
}

/// Phase 4b: depth and snowpack update with the round-off clamp policy.
pub fn update_depths(model: &Model, state: &mut RunState) -> Result<(), String> {
    let dt = state.dt;
    let snow_active = model.options.snow != crate::model::SnowOption::None
        || model.options.melt != crate::model::MeltOption::None;

    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let aov = overland_surface_area(model, i);

        let mut dq = 0.0;
        for k in 0..crate::topology::N_SOURCES {
            dq += state.ov.dq_in[i][k] - state.ov.dq_out[i][k];
        }

        //derivative (m/s): net rain - infiltration + snowmelt + net flow
        let mut derivative = state.ov.net_rain[i];
        if model.options.infiltration {
            derivative -= state.ov.infiltration_rate[i];
        }
        derivative += state.ov.melt_rate[i];
        derivative += dq / aov;

        let mut h_new = state.ov.h[i] + derivative * dt;
        if h_new < 0.0 {
            if h_new.abs() < TOLERANCE {
                h_new = 0.0;
            } else {
                return Err(format!(
                    "Negative overland water depth {:.3e} m at row {} col {}, step {} simtime {:.4} h",
                    h_new, r, c, state.step, state.simtime
                ));
            }
        }
        if h_new < TOLERANCE {
            h_new = 0.0;
        }
        state.ov.h_new[i] = h_new;

        if snow_active {
            let derivative = state.ov.net_swe[i] - state.ov.melt_rate[i];
            let mut swe_new = state.ov.swe[i] + derivative * dt;
            if swe_new < 0.0 {
                if swe_new.abs() < TOLERANCE {
                    swe_new = 0.0;
                } else {
                    return Err(format!(
                        "Negative snowpack swe {:.3e} m at row {} col {}, step {} simtime {:.4} h",
                        swe_new, r, c, state.step, state.simtime
                    ));
                }
            }
            if swe_new < TOLERANCE {
                swe_new = 0.0;
            }
            state.ov.swe_new[i] = swe_new;
        } else {
            state.ov.swe_new[i] = state.ov.swe[i];
        }
    }
    Ok(())
}
