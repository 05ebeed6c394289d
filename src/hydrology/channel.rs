// Channel geometry and the channel water phase.
//
// Cross sections are trapezoidal (possibly triangular or rectangular)
// below the bank height with a rectangular cap above it. Flow between
// nodes is Manning flow on the water-surface slope (diffusive wave), so
// reverse flow falls out naturally when the downstream surface stands
// higher.

use crate::grid::TOLERANCE;
use crate::model::{Model, RunState};
use crate::outlets::BoundaryDepth;
use crate::topology::{SRC_BOUNDARY, SRC_POINT};

/// Static geometry and bed properties of one channel node.
#[derive(Debug, Clone, Default)]
pub struct ChannelGeometry {
    pub bottom_width: f64, //m
    pub bank_height: f64,  //m
    pub side_slope: f64,   //horizontal per vertical
    pub top_width: f64,    //width at the top of the bank (m)
    pub manning_n: f64,
    pub sinuosity: f64,

    //bed sediment properties
    pub erosion_coeff: f64,    //ay (kg/m2)
    pub erosion_exponent: f64, //mexp
    pub kh_bed: f64,           //bed hydraulic conductivity (m/s)
    pub capillary_suction_bed: f64,
    pub moisture_deficit_bed: f64,
    pub bed_porosity: f64,
    pub bed_thickness: f64, //initial surface layer thickness (m)
}

impl ChannelGeometry {
    /// Derive the top width from the trapezoid at bank height.
    pub fn finish(mut self) -> ChannelGeometry {
        self.top_width = self.bottom_width + 2.0 * self.side_slope * self.bank_height;
        self
    }

    /// Wetted cross section area at depth h (m2).
    pub fn cross_section_area(&self, h: f64) -> f64 {
        if h <= self.bank_height {
            (self.bottom_width + self.side_slope * h) * h
        } else {
            (self.bottom_width + self.side_slope * self.bank_height) * self.bank_height
                + (h - self.bank_height) * self.top_width
        }
    }

    /// Wetted perimeter at depth h (m).
    pub fn wetted_perimeter(&self, h: f64) -> f64 {
        let bank = f64::sqrt(1.0 + self.side_slope * self.side_slope);
        if h <= self.bank_height {
            self.bottom_width + 2.0 * h * bank
        } else {
            self.bottom_width + 2.0 * self.bank_height * bank + 2.0 * (h - self.bank_height)
        }
    }

    /// Water surface width at depth h (m).
    pub fn surface_width(&self, h: f64) -> f64 {
        if h <= self.bank_height {
            self.bottom_width + 2.0 * self.side_slope * h
        } else {
            self.top_width
        }
    }

    /// Depth whose cross section equals the given area: the exact inverse
    /// of cross_section_area.
    pub fn depth_at_area(&self, area: f64) -> f64 {
        if area <= 0.0 {
            return 0.0;
        }
        let bank_area = (self.bottom_width + self.side_slope * self.bank_height) * self.bank_height;
        if area > bank_area {
            return self.bank_height + (area - bank_area) / self.top_width;
        }
        if self.side_slope > 0.0 {
            let bw = self.bottom_width;
            (-bw + f64::sqrt(bw * bw + 4.0 * self.side_slope * area)) / (2.0 * self.side_slope)
        } else {
            area / self.bottom_width
        }
    }

    /// Manning discharge (m3/s) at depth h under friction slope sf >= 0.
    pub fn manning_flow(&self, h: f64, sf: f64) -> f64 {
        if h <= 0.0 || sf <= 0.0 || self.manning_n <= 0.0 {
            return 0.0;
        }
        let area = self.cross_section_area(h);
        let wp = self.wetted_perimeter(h);
        if wp <= 0.0 {
            return 0.0;
        }
        let rh = area / wp;
        area * rh.powf(2.0 / 3.0) * f64::sqrt(sf) / self.manning_n
    }
}

/// Phase 5a: Manning flow across every internode interface, external
/// point flows and outlet boundary flows. Reads previous-step depths only.
pub fn route(model: &Model, state: &mut RunState) {
    //reset flow and slope workspaces
    for (l, n) in model.net.nodes() {
        state.ch.dq_in[l][n] = [0.0; crate::topology::N_SOURCES];
        state.ch.dq_out[l][n] = [0.0; crate::topology::N_SOURCES];
        state.ch.sf[l][n] = 0.0;
        state.ch.fp_rate[l][n] = 0.0;
    }

    //internode interfaces
    for iface in &model.net.interfaces {
        let (ul, un) = (iface.up_link, iface.up_node);
        let (dl, dn) = (iface.down_link, iface.down_node);

        let bed_u = bed_elevation(model, ul, un);
        let bed_d = bed_elevation(model, dl, dn);
        let wse_u = bed_u + state.ch.h[ul][un];
        let wse_d = bed_d + state.ch.h[dl][dn];
        let length = 0.5 * (model.net.length[ul][un] + model.net.length[dl][dn]);
        if length <= 0.0 {
            continue;
        }
        let sf = (wse_u - wse_d) / length;
        state.ch.sf[ul][un] = sf;

        if sf > 0.0 {
            let q = model.geometry[ul][un].manning_flow(state.ch.h[ul][un], sf);
            state.ch.dq_out[ul][un][iface.up_source] += q;
            state.ch.dq_in[dl][dn][iface.down_source] += q;
        } else if sf < 0.0 {
            //reverse flow: the downstream surface stands higher
            let q = model.geometry[dl][dn].manning_flow(state.ch.h[dl][dn], -sf);
            state.ch.dq_out[dl][dn][iface.down_source] += q;
            state.ch.dq_in[ul][un][iface.up_source] += q;
        }
    }

    //outlet boundary flows at the last node of each outlet link
    for (l, outlet_idx) in model.outlet_of_link.iter().enumerate() {
        let o = match outlet_idx {
            Some(o) => *o,
            None => continue,
        };
        let n = model.net.nodes_per_link[l] - 1;
        let outlet = &model.outlets[o];
        let geom = &model.geometry[l][n];
        let h = state.ch.h[l][n];

        match &outlet.depth {
            BoundaryDepth::NormalDepth => {
                let q = geom.manning_flow(h, outlet.slope);
                state.ch.dq_out[l][n][SRC_BOUNDARY] += q;
                state.ch.sf[l][n] = outlet.slope;
            }
            BoundaryDepth::SpecifiedDepth(_) => {
                let h_bc = state.forcing.outlet_depth[o];
                let length = model.net.length[l][n];
                let sf = (h - h_bc) / length + outlet.slope;
                state.ch.sf[l][n] = sf;
                if sf > 0.0 {
                    let q = geom.manning_flow(h, sf);
                    state.ch.dq_out[l][n][SRC_BOUNDARY] += q;
                } else if sf < 0.0 {
                    //boundary stands higher than the node: water enters
                    let q = geom.manning_flow(h_bc, -sf);
                    state.ch.dq_in[l][n][SRC_BOUNDARY] += q;
                }
            }
        }
    }

    //external point flows (sources and sinks)
    for (k, source) in model.forcings.flows.iter().enumerate() {
        if let crate::forcing::FlowTarget::ChannelNode { link, node } = source.target {
            let q = state.forcing.flow[k];
            if q >= 0.0 {
                state.ch.dq_in[link][node][SRC_POINT] += q;
            } else {
                state.ch.dq_out[link][node][SRC_POINT] += -q;
            }
        }
    }
}

/// Phase 5b: update channel depths from the net flow, the external loads
/// and the transmission loss. Floodplain transfer is applied afterwards
/// by the floodplain phase.
pub fn update_depths(model: &Model, state: &mut RunState) -> Result<(), String> {
    let dt = state.dt;
    for (l, n) in model.net.nodes() {
        let geom = &model.geometry[l][n];
        let h = state.ch.h[l][n];
        let length = model.net.length[l][n];

        let mut dq = 0.0;
        for k in 0..crate::topology::N_SOURCES {
            dq += state.ch.dq_in[l][n][k] - state.ch.dq_out[l][n][k];
        }
        let bed_area = geom.bottom_width * length;
        let q_loss = state.ch.transloss_rate[l][n] * bed_area;

        let width = geom.surface_width(h).max(geom.bottom_width.max(1.0e-6));
        let mut h_new = h + dt * (dq - q_loss) / (length * width);

        if h_new < 0.0 {
            if h_new.abs() < TOLERANCE {
                h_new = 0.0;
            } else {
                let (row, col) = model.net.anchors[l][n];
                return Err(format!(
                    "Negative channel water depth {:.3e} m at link {} node {} (row {} col {}), step {} simtime {:.4} h",
                    h_new,
                    l + 1,
                    n + 1,
                    row,
                    col,
                    state.step,
                    state.simtime
                ));
            }
        }
        if h_new < TOLERANCE {
            h_new = 0.0;
        }
        state.ch.h_new[l][n] = h_new;
    }
    Ok(())
}

/// Channel bed elevation: ground elevation of the containing cell minus
/// the bank height.
pub fn bed_elevation(model: &Model, link: usize, node: usize) -> f64 {
    let i = model.cell_of_node(link, node);
    model.grid.elevation[i] - model.geometry[link][node].bank_height
}
