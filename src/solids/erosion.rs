// Erosion fluxes from the bed surface layer into the water column.
//
// Two regimes per domain. Excess-shear erosion scales with
// (tau/tce - 1)^m; cohesive classes erode only when shear exceeds both
// the critical value and the largest shear the location has ever seen
// (exposure history). Capacity-limited erosion compares a transport
// capacity against the transport rate already leaving the water column
// and erodes the difference. Either way the eroded mass is limited to
// what the surface layer actually holds.

use crate::grid::{DENSITY_WATER, GRAVITY};
use crate::hydrology::shear;
use crate::model::{
    overland_surface_area, ChannelErosionMode, Model, OverlandErosionMode, RunState,
};
use crate::solids::class::Cohesion;
use crate::topology::{Direction, N_SOURCES, SRC_BOUNDARY};

/// Excess-shear erosion amount (g/m2) for one class.
pub fn excess_shear_epsilon(
    tau: f64,
    tau_max: f64,
    tce: f64,
    ay: f64,
    z_age: f64,
    m: f64,
    cohesion: Cohesion,
) -> f64 {
    match cohesion {
        Cohesion::NonCohesive => {
            if tau > tce {
                ay / z_age * libm::pow(tau / tce - 1.0, m)
            } else {
                0.0
            }
        }
        Cohesion::Cohesive => {
            //erosion is controlled by the shear exposure history
            if tau > tce && tau > tau_max {
                let fresh = libm::pow(tau / tce - 1.0, m);
                let aged = if tau_max > tce {
                    libm::pow(tau_max / tce - 1.0, m)
                } else {
                    0.0
                };
                ay / z_age * (fresh - aged)
            } else {
                0.0
            }
        }
    }
}

/// Modified Kilinc-Richardson total transport capacity for an overland
/// cell (g/s), before class weighting.
pub fn kilinc_richardson_capacity(q_unit: f64, sf: f64, k: f64, c: f64, p: f64, width: f64) -> f64 {
    if q_unit <= 0.0 || sf <= 0.0 {
        return 0.0;
    }
    //unit sediment discharge in metric tons per meter width per second
    let qs = 25500.0 * libm::pow(q_unit, 2.035) * libm::pow(sf, 1.664) * (k * c * p / 0.15);
    qs * width * 1.0e6
}

/// Engelund-Hansen total-load transport capacity for one class in a
/// channel node (g/s), before bed-fraction weighting.
pub fn engelund_hansen_capacity(
    velocity: f64,
    rh: f64,
    sf: f64,
    ds: f64,
    specific_gravity: f64,
    tau: f64,
    width: f64,
) -> f64 {
    if velocity <= 0.0 || sf <= 0.0 || ds <= 0.0 || rh <= 0.0 {
        return 0.0;
    }
    let s = specific_gravity;
    let theta = tau / ((s - 1.0) * DENSITY_WATER * GRAVITY * ds);
    let friction = 2.0 * GRAVITY * rh * sf / (velocity * velocity);
    if friction <= 0.0 {
        return 0.0;
    }
    let phi = 0.1 * libm::pow(theta, 2.5) / friction;
    //volumetric rate per unit width (m2/s) to mass rate (g/s)
    let qs_vol = phi * f64::sqrt((s - 1.0) * GRAVITY * ds * ds * ds);
    qs_vol * s * DENSITY_WATER * 1000.0 * width
}

/// Overland erosion fluxes. Runs after the water-column supply rule so
/// the capacity regime sees the reconciled outfluxes.
pub fn erosion_overland(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        let h = state.ov.h[i];
        let land = &model.land_uses[model.grid.land_use[i]];
        let soil = &model.soils[model.grid.soil[i]];
        let sf = shear::overland_friction_slope(&state.ov.sf[i]);
        let tau = shear::overland_shear(h, sf);
        let area = overland_surface_area(model, i);
        let volume = h * area;

        let surface = state.sed.stack_ov[i].surface().cloned();
        let (bed_area, porosity, surface_conc, surface_total, layer_volume) = match &surface {
            Some(layer) => (
                layer.bed_area,
                layer.porosity,
                layer.conc.clone(),
                layer.conc[0],
                layer.volume,
            ),
            None => (0.0, 0.0, Vec::new(), 0.0, 0.0),
        };

        let mut new_taumax: f64 = 0.0;
        for s in 1..=model.catalog.n_classes() {
            state.sed.ers_ov[s][i] = 0.0;
            if bed_area <= 0.0 {
                continue;
            }
            let class = model.catalog.class(s);

            let epsilon = match model.options.overland_erosion {
                OverlandErosionMode::ExcessShear => {
                    let eps = excess_shear_epsilon(
                        tau,
                        state.sed.taumax_ov[i],
                        class.tce,
                        land.erosion_coeff,
                        class.z_age,
                        soil.erosion_exponent,
                        class.cohesion,
                    );
                    if eps > 0.0 && class.cohesion == Cohesion::Cohesive {
                        new_taumax = new_taumax.max(tau);
                    }
                    eps
                }
                OverlandErosionMode::Capacity => {
                    //transport rate: what already leaves the column
                    let mut outflux = state.sed.dep_ov[s][i];
                    for k in 0..N_SOURCES {
                        outflux += state.sed.adv_ov_out[s][i][k];
                    }
                    let available = state.sed.cov[s][i] * volume;
                    let transrate = (available / dt - outflux).max(0.0);

                    let mut q_total = state.ov.dq_out[i][SRC_BOUNDARY];
                    for d in Direction::AXIAL {
                        q_total += state.ov.dq_out[i][d.code()];
                    }
                    let fraction = if surface_total > 0.0 {
                        surface_conc[s] / surface_total
                    } else {
                        0.0
                    };
                    let transcap = kilinc_richardson_capacity(
                        q_total / model.grid.cell_size,
                        sf,
                        soil.usle_k,
                        land.usle_c,
                        land.usle_p,
                        model.grid.cell_size,
                    ) * fraction;
                    if transcap > transrate {
                        (transcap - transrate) * dt / bed_area
                    } else {
                        0.0
                    }
                }
            };

            let bulk_density = class.bulk_density(porosity); //kg/m3
            if bulk_density <= 0.0 || epsilon <= 0.0 {
                continue;
            }
            let mut ers_flow =
                epsilon * bed_area / (bulk_density * 1000.0) / dt * model.options.scale.ers_ov;

            //limit to the mass present in the surface layer
            let potential = ers_flow * surface_conc[s] * dt;
            let available = layer_volume * surface_conc[s];
            if potential > available && potential > 0.0 {
                ers_flow *= available / potential;
            }
            state.sed.ers_ov[s][i] = ers_flow * surface_conc[s];
        }

        if new_taumax > state.sed.taumax_ov[i] {
            state.sed.taumax_ov[i] = new_taumax;
            state.sed.taumax_time_ov[i] = state.simtime;
        }
    }
}

/// Channel erosion fluxes, with optional grain-shear partitioning.
pub fn erosion_channel(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let h = state.ch.h[l][n];
        let length = model.net.length[l][n];
        let hyd = shear::channel_hydraulics(geom, h, state.ch.sf[l][n]);
        let volume = hyd.area * length;

        let mut tau = hyd.tau;
        if model.options.channel_erosion.partitions_grain_shear() && h > 0.0 {
            let d50 = state.sed.stack_ch[l][n].surface_d50(&model.catalog);
            tau = shear::grain_shear(tau, d50, h);
        }

        let surface = state.sed.stack_ch[l][n].surface().cloned();
        let (bed_area, porosity, surface_conc, surface_total, layer_volume) = match &surface {
            Some(layer) => (
                layer.bed_area,
                layer.porosity,
                layer.conc.clone(),
                layer.conc[0],
                layer.volume,
            ),
            None => (0.0, 0.0, Vec::new(), 0.0, 0.0),
        };

        let mut new_taumax: f64 = 0.0;
        for s in 1..=model.catalog.n_classes() {
            state.sed.ers_ch[s][l][n] = 0.0;
            if bed_area <= 0.0 {
                continue;
            }
            let class = model.catalog.class(s);

            let epsilon = match model.options.channel_erosion {
                ChannelErosionMode::ExcessShear => {
                    let eps = excess_shear_epsilon(
                        tau,
                        state.sed.taumax_ch[l][n],
                        class.tce,
                        geom.erosion_coeff,
                        class.z_age,
                        geom.erosion_exponent,
                        class.cohesion,
                    );
                    if eps > 0.0 && class.cohesion == Cohesion::Cohesive {
                        new_taumax = new_taumax.max(tau);
                    }
                    eps
                }
                ChannelErosionMode::Capacity | ChannelErosionMode::CapacityGrain => {
                    let mut outflux = state.sed.dep_ch[s][l][n];
                    for k in 0..N_SOURCES {
                        outflux += state.sed.adv_ch_out[s][l][n][k];
                    }
                    let available = state.sed.cch[s][l][n] * volume;
                    let transrate = (available / dt - outflux).max(0.0);

                    let mut q_total = state.ch.dq_out[l][n][SRC_BOUNDARY];
                    for d in Direction::ALL {
                        q_total += state.ch.dq_out[l][n][d.code()];
                    }
                    let velocity = if hyd.area > 0.0 { q_total / hyd.area } else { 0.0 };
                    let fraction = if surface_total > 0.0 {
                        surface_conc[s] / surface_total
                    } else {
                        0.0
                    };
                    let transcap = engelund_hansen_capacity(
                        velocity,
                        hyd.hydraulic_radius,
                        state.ch.sf[l][n].abs(),
                        class.ds,
                        class.specific_gravity,
                        tau,
                        geom.bottom_width,
                    ) * fraction;
                    if transcap > transrate {
                        (transcap - transrate) * dt / bed_area
                    } else {
                        0.0
                    }
                }
            };

            let bulk_density = class.bulk_density(porosity); //kg/m3
            if bulk_density <= 0.0 || epsilon <= 0.0 {
                continue;
            }
            let mut ers_flow =
                epsilon * bed_area / (bulk_density * 1000.0) / dt * model.options.scale.ers_ch;

            let potential = ers_flow * surface_conc[s] * dt;
            let available = layer_volume * surface_conc[s];
            if potential > available && potential > 0.0 {
                ers_flow *= available / potential;
            }
            state.sed.ers_ch[s][l][n] = ers_flow * surface_conc[s];
        }

        if new_taumax > state.sed.taumax_ch[l][n] {
            state.sed.taumax_ch[l][n] = new_taumax;
            state.sed.taumax_time_ch[l][n] = state.simtime;
        }
    }
}
