// Cumulative mass balance accounting. Every cell and node keeps running
// volume totals per source index (0 = point source, 1..8 = compass
// directions, 9 = floodplain, 10 = boundary), every class keeps running
// mass totals for advection, dispersion, erosion and deposition, and
// every outlet keeps its boundary totals. Ledger arithmetic never fails;
// the closure error computed at end of run is diagnostic, not fatal.

use serde_derive::Serialize;

use crate::topology::N_SOURCES;

/// Per-cell (flat, row-major) and per-node (ragged by link) accumulators.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    //---- overland water volumes (m3), per cell ----
    pub gross_rain_vol: Vec<f64>,
    pub net_rain_vol: Vec<f64>,
    pub gross_swe_vol: Vec<f64>,
    pub net_swe_vol: Vec<f64>,
    pub interception_vol: Vec<f64>,
    pub infiltration_vol: Vec<f64>,
    pub swemelt_vol: Vec<f64>,
    pub external_flow_vol: Vec<f64>,
    pub dqov_in_vol: Vec<[f64; N_SOURCES]>,
    pub dqov_out_vol: Vec<[f64; N_SOURCES]>,

    //---- channel water volumes (m3), per link/node ----
    pub dqch_in_vol: Vec<Vec<[f64; N_SOURCES]>>,
    pub dqch_out_vol: Vec<Vec<[f64; N_SOURCES]>>,
    pub transloss_vol: Vec<Vec<f64>>,
    pub external_flow_vol_ch: Vec<Vec<f64>>,

    //---- solids masses (kg), [class][cell or link/node][source] ----
    pub adv_ov_in_mass: Vec<Vec<[f64; N_SOURCES]>>,
    pub adv_ov_out_mass: Vec<Vec<[f64; N_SOURCES]>>,
    pub dsp_ov_in_mass: Vec<Vec<[f64; N_SOURCES]>>,
    pub dsp_ov_out_mass: Vec<Vec<[f64; N_SOURCES]>>,
    pub ers_ov_in_mass: Vec<Vec<f64>>,
    pub dep_ov_out_mass: Vec<Vec<f64>>,

    pub adv_ch_in_mass: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub adv_ch_out_mass: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub dsp_ch_in_mass: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub dsp_ch_out_mass: Vec<Vec<Vec<[f64; N_SOURCES]>>>,
    pub ers_ch_in_mass: Vec<Vec<Vec<f64>>>,
    pub dep_ch_out_mass: Vec<Vec<Vec<f64>>>,

    //---- per-outlet totals ----
    pub outlet_flow_out_vol_ov: Vec<f64>,
    pub outlet_flow_out_vol_ch: Vec<f64>,
    pub outlet_flow_in_vol_ch: Vec<f64>,
    /// [class][outlet] boundary solids totals (kg); outlet slot 0 sums
    /// all outlets.
    pub outlet_sed_out_mass: Vec<Vec<f64>>,
    pub outlet_sed_in_mass: Vec<Vec<f64>>,

    //---- per-class external load totals (kg) ----
    pub load_in_mass: Vec<f64>,
    pub load_out_mass: Vec<f64>,

    //---- cumulative depth grids (m), per cell ----
    pub gross_rain_depth: Vec<f64>,
    pub gross_swe_depth: Vec<f64>,
    pub swemelt_depth: Vec<f64>,
    pub infiltration_depth: Vec<f64>,

    //---- min/max envelopes ----
    pub min_rain_intensity: f64,
    pub max_rain_intensity: f64,
    pub min_swe_intensity: f64,
    pub max_swe_intensity: f64,
    pub min_infilt_depth: f64,
    pub max_infilt_depth: f64,
    pub min_swemelt_depth: f64,
    pub max_swemelt_depth: f64,
    pub peak_overland_depth: f64,
    pub peak_channel_depth: f64,
}

impl Ledger {
    pub fn sized(
        n_cells: usize,
        nodes_per_link: &[usize],
        n_classes: usize,
        n_outlets: usize,
    ) -> Ledger {
        let cell_vec = || vec![0.0f64; n_cells];
        let cell_src = || vec![[0.0f64; N_SOURCES]; n_cells];
        let node_vec = || -> Vec<Vec<f64>> {
            nodes_per_link.iter().map(|&n| vec![0.0; n]).collect()
        };
        let node_src = || -> Vec<Vec<[f64; N_SOURCES]>> {
            nodes_per_link
                .iter()
                .map(|&n| vec![[0.0; N_SOURCES]; n])
                .collect()
        };

        Ledger {
            gross_rain_vol: cell_vec(),
            net_rain_vol: cell_vec(),
            gross_swe_vol: cell_vec(),
            net_swe_vol: cell_vec(),
            interception_vol: cell_vec(),
            infiltration_vol: cell_vec(),
            swemelt_vol: cell_vec(),
            external_flow_vol: cell_vec(),
            dqov_in_vol: cell_src(),
            dqov_out_vol: cell_src(),

            dqch_in_vol: node_src(),
            dqch_out_vol: node_src(),
            transloss_vol: node_vec(),
            external_flow_vol_ch: node_vec(),

            adv_ov_in_mass: (0..=n_classes).map(|_| cell_src()).collect(),
            adv_ov_out_mass: (0..=n_classes).map(|_| cell_src()).collect(),
            dsp_ov_in_mass: (0..=n_classes).map(|_| cell_src()).collect(),
            dsp_ov_out_mass: (0..=n_classes).map(|_| cell_src()).collect(),
            ers_ov_in_mass: (0..=n_classes).map(|_| cell_vec()).collect(),
            dep_ov_out_mass: (0..=n_classes).map(|_| cell_vec()).collect(),

            adv_ch_in_mass: (0..=n_classes).map(|_| node_src()).collect(),
            adv_ch_out_mass: (0..=n_classes).map(|_| node_src()).collect(),
            dsp_ch_in_mass: (0..=n_classes).map(|_| node_src()).collect(),
            dsp_ch_out_mass: (0..=n_classes).map(|_| node_src()).collect(),
            ers_ch_in_mass: (0..=n_classes).map(|_| node_vec()).collect(),
            dep_ch_out_mass: (0..=n_classes).map(|_| node_vec()).collect(),

            outlet_flow_out_vol_ov: vec![0.0; n_outlets],
            outlet_flow_out_vol_ch: vec![0.0; n_outlets],
            outlet_flow_in_vol_ch: vec![0.0; n_outlets],
            outlet_sed_out_mass: vec![vec![0.0; n_outlets + 1]; n_classes + 1],
            outlet_sed_in_mass: vec![vec![0.0; n_outlets + 1]; n_classes + 1],

            load_in_mass: vec![0.0; n_classes + 1],
            load_out_mass: vec![0.0; n_classes + 1],

            gross_rain_depth: cell_vec(),
            gross_swe_depth: cell_vec(),
            swemelt_depth: cell_vec(),
            infiltration_depth: cell_vec(),

            min_rain_intensity: f64::INFINITY,
            max_rain_intensity: f64::NEG_INFINITY,
            min_swe_intensity: f64::INFINITY,
            max_swe_intensity: f64::NEG_INFINITY,
            min_infilt_depth: f64::INFINITY,
            max_infilt_depth: f64::NEG_INFINITY,
            min_swemelt_depth: f64::INFINITY,
            max_swemelt_depth: f64::NEG_INFINITY,
            peak_overland_depth: 0.0,
            peak_channel_depth: 0.0,
        }
    }
}

/// End-of-run totals assembled from the ledger and the final state.
/// Volumes in m3, masses in kg. Serializable so drivers can consume the
/// mass balance as JSON instead of scraping the text report.
#[derive(Clone, Default, Serialize)]
pub struct MassBalanceTotals {
    pub gross_rain_vol: f64,
    pub net_rain_vol: f64,
    pub gross_swe_vol: f64,
    pub interception_vol: f64,
    pub infiltration_vol: f64,
    pub swemelt_vol: f64,
    pub transloss_vol: f64,
    pub external_flow_vol: f64,
    pub outlet_flow_vol: f64,
    pub initial_water_vol: f64,
    pub final_water_vol: f64,
    pub final_swe_vol: f64,
    pub water_closure_error: f64,

    /// Per class (slot 0 = total): initial/in/out/final suspended and bed
    /// masses and the per-class closure error.
    pub sed_initial_mass: Vec<f64>,
    pub sed_in_mass: Vec<f64>,
    pub sed_out_mass: Vec<f64>,
    pub sed_final_mass: Vec<f64>,
    pub sed_closure_error: Vec<f64>,
}
