// Green-Ampt infiltration. The average rate over a step solves
//
//   rate*dt = kh*dt + (h + psi)*md * ln((F + rate*dt + (h+psi)*md)
//                                      / (F + (h+psi)*md))
//
// which this implementation replaces with the closed-form step used for
// explicit routing: the positive root of a quadratic in the rate. The
// same form serves overland infiltration (soil properties, ponded
// overland depth) and channel transmission loss (bed properties, channel
// depth, bed area).

use crate::model::{Model, RunState};
use crate::numerical::mathfn::quadratic_plus;

/// Average Green-Ampt rate (m/s) over a step of dt seconds, given the
/// hydraulic conductivity kh (m/s), capillary suction psi (m), moisture
/// deficit md, ponded depth h (m) and cumulative infiltrated depth f (m).
/// The rate is capped so that rate*dt never exceeds the ponded depth.
pub fn green_ampt_rate(kh: f64, psi: f64, md: f64, h: f64, f: f64, dt: f64) -> f64 {
    if kh <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    let p1 = kh * dt - 2.0 * f;
    let p2 = kh * (f + (h + psi) * md);

    //rate*2dt = p1 + sqrt(p1^2 + 8*p2*dt), i.e. the positive root of
    //dt*r^2 - p1*r - 2*p2 = 0
    let mut rate = quadratic_plus(dt, -p1, -2.0 * p2);
    if !rate.is_finite() || rate < 0.0 {
        rate = 0.0;
    }

    //the loss cannot exceed the water present
    if rate * dt > h {
        rate = h / dt;
    }
    rate
}

/// Phase 2a: overland infiltration for every in-domain cell.
pub fn infiltration_phase(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let soil = &model.soils[model.grid.soil[i]];
        let rate = green_ampt_rate(
            soil.kh,
            soil.capillary_suction,
            soil.moisture_deficit,
            state.ov.h[i],
            state.ov.infiltration_cum[i],
            dt,
        );
        state.ov.infiltration_rate[i] = rate;
        state.ov.infiltration_cum[i] += rate * dt;
    }
}

/// Phase 2b: channel transmission loss through the bed of every node,
/// using the same Green-Ampt form with the bed sediment properties.
pub fn transmission_loss_phase(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let rate = green_ampt_rate(
            geom.kh_bed,
            geom.capillary_suction_bed,
            geom.moisture_deficit_bed,
            state.ch.h[l][n],
            state.ch.transloss_cum[l][n],
            dt,
        );
        state.ch.transloss_rate[l][n] = rate;
        state.ch.transloss_cum[l][n] += rate * dt;
    }
}
