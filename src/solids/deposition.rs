// Deposition (settling) fluxes. The gross flux of a class is its
// settling velocity times the plan area of the water surface times the
// water column concentration. Cohesive classes settle with the linear
// probability (1 - tau/tcd) below the critical shear stress for
// deposition and not at all above it; non-cohesive classes settle
// whenever shear permits (or always, per the deposition option).

use crate::hydrology::shear;
use crate::model::{overland_surface_area, DepositionOption, Model, RunState};
use crate::solids::class::Cohesion;

fn settling_factor(option: DepositionOption, cohesion: Cohesion, tau: f64, tcd: f64) -> f64 {
    match option {
        DepositionOption::Always => 1.0,
        DepositionOption::BelowCritical => {
            if tau > tcd {
                0.0
            } else {
                match cohesion {
                    Cohesion::Cohesive => {
                        if tcd > 0.0 {
                            1.0 - tau / tcd
                        } else {
                            0.0
                        }
                    }
                    Cohesion::NonCohesive => 1.0,
                }
            }
        }
    }
}

/// Gross deposition fluxes out of every water column (g/s), before the
/// supply rule is applied.
pub fn deposition_phase(model: &Model, state: &mut RunState) {
    let option = model.options.deposition;

    //overland cells
    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let area = overland_surface_area(model, i);
        let sf = shear::overland_friction_slope(&state.ov.sf[i]);
        let tau = shear::overland_shear(state.ov.h[i], sf);

        for s in 1..=model.catalog.n_classes() {
            let class = model.catalog.class(s);
            let factor = settling_factor(option, class.cohesion, tau, class.tcd);
            state.sed.dep_ov[s][i] = class.settling_velocity
                * area
                * state.sed.cov[s][i]
                * factor
                * model.options.scale.dep_ov;
        }
    }

    //channel nodes
    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let h = state.ch.h[l][n];
        let hyd = shear::channel_hydraulics(geom, h, state.ch.sf[l][n]);
        let area = geom.surface_width(h) * model.net.length[l][n];

        for s in 1..=model.catalog.n_classes() {
            let class = model.catalog.class(s);
            let factor = settling_factor(option, class.cohesion, hyd.tau, class.tcd);
            state.sed.dep_ch[s][l][n] = class.settling_velocity
                * area
                * state.sed.cch[s][l][n]
                * factor
                * model.options.scale.dep_ch;
        }
    }
}
