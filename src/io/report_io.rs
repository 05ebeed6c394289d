// Reporting writers: station time series as CSV (water discharge
// triples and per-group solids exports) and end-of-run ASCII grids.
// Buffered rows are flushed here after the run; nothing in the hot loop
// touches a file.

use std::fs;
use std::path::Path;

use crate::io::ascii_grid;
use crate::model::{Model, RunState};

/// Water export: one time column (hours) and a
/// (Q_overland, Q_channel, Q_total) triple per station.
pub fn write_water_export(model: &Model, state: &RunState, filename: &str) -> Result<(), String> {
    let mut data = String::new();
    data.push_str("Time (hours)");
    for st in &model.stations {
        data.push_str(&format!(
            ",{} Qov (m3/s),{} Qch (m3/s),{} Qtotal (m3/s)",
            st.name, st.name, st.name
        ));
    }
    data.push_str("\r\n");

    for (i, t) in state.reports.times.iter().enumerate() {
        data.push_str(&format!("{}", t));
        for (qov, qch, qtot) in &state.reports.water[i] {
            data.push_str(&format!(",{},{},{}", qov, qch, qtot));
        }
        data.push_str("\r\n");
    }

    write_file(filename, &data)
}

/// Solids exports: one file per reporting group (group 0 sums all
/// classes), values in the per-station units option.
pub fn write_solids_exports(model: &Model, state: &RunState, root: &str) -> Result<(), String> {
    for group in 0..=model.catalog.n_groups {
        let filename = format!("{}_group{}.csv", root, group);
        let mut data = String::new();
        data.push_str("Time (hours)");
        for st in &model.stations {
            data.push_str(&format!(",{}", st.name));
        }
        data.push_str("\r\n");

        for (i, t) in state.reports.times.iter().enumerate() {
            data.push_str(&format!("{}", t));
            for v in &state.reports.solids[group][i] {
                data.push_str(&format!(",{}", v));
            }
            data.push_str("\r\n");
        }
        write_file(&filename, &data)?;
    }
    Ok(())
}

/// End-of-run solids grids: total suspended concentration overland and
/// in the channel network (g/m3), written in the master grid format.
pub fn write_end_grids(model: &Model, state: &RunState, root: &str) -> Result<(), String> {
    let n_cells = model.grid.n_cells();

    let mut suspended = vec![0.0; n_cells];
    for i in 0..n_cells {
        suspended[i] = state.sed.cov[0][i];
    }
    ascii_grid::write_grid(&format!("{}_suspended_ov.asc", root), &model.grid, &suspended)?;

    let mut channel = vec![0.0; n_cells];
    for (l, n) in model.net.nodes() {
        let i = model.cell_of_node(l, n);
        channel[i] = state.sed.cch[0][l][n];
    }
    ascii_grid::write_grid(&format!("{}_suspended_ch.asc", root), &model.grid, &channel)
}

/// Write all outputs the deck asked for.
pub fn write_outputs(model: &Model) -> Result<(), String> {
    let state = match &model.state {
        Some(s) => s,
        None => return Err("No simulation has been run".to_string()),
    };
    if let Some(path) = &model.output.water_export {
        write_water_export(model, state, path)?;
    }
    if model.options.simulate_solids {
        if let Some(root) = &model.output.sed_export_root {
            write_solids_exports(model, state, root)?;
        }
        if let Some(root) = &model.output.end_grid_root {
            write_end_grids(model, state, root)?;
        }
    }
    Ok(())
}

fn write_file(filename: &str, data: &str) -> Result<(), String> {
    if let Some(parent) = Path::new(filename).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Could not create directory for '{}': {}", filename, e))?;
        }
    }
    fs::write(filename, data).map_err(|e| format!("Could not write file '{}': {}", filename, e))
}
