// The echo file records what the engine actually ran: run identity,
// wall-clock start, deck path, grid and network summaries, topology and
// length tables, option settings, fatal diagnostics and the end-of-run
// mass balance.

use std::fmt::Write as FmtWrite;
use std::fs::OpenOptions;
use std::io::Write;

use chrono::Utc;

use crate::model::Model;
use crate::topology::Direction;

pub struct EchoFile {
    path: Option<String>,
}

impl EchoFile {
    /// An echo sink; silently inert when the deck names no echo file.
    pub fn new(path: Option<String>) -> EchoFile {
        EchoFile { path }
    }

    pub fn append(&self, text: &str) {
        if let Some(path) = &self.path {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = file.write_all(text.as_bytes());
            }
        }
    }

    /// Header with run identity, wall-clock start and configuration
    /// summary, plus the channel topology and length tables.
    pub fn write_header(&self, model: &Model, deck_path: &str) {
        let mut out = String::new();
        writeln!(&mut out, "Freshet run {}", model.id).ok();
        writeln!(&mut out, "Started (UTC): {}", Utc::now().to_rfc3339()).ok();
        writeln!(&mut out, "Deck: {}", deck_path).ok();
        if !model.name.is_empty() {
            writeln!(&mut out, "Name: {}", model.name).ok();
        }
        writeln!(&mut out).ok();
        writeln!(
            &mut out,
            "Grid: {} rows x {} cols, cell size {} m",
            model.grid.nrows, model.grid.ncols, model.grid.cell_size
        )
        .ok();
        writeln!(
            &mut out,
            "Simulation: {} h to {} h",
            model.time.tstart, model.time.tend
        )
        .ok();
        writeln!(&mut out, "Solids classes: {}", model.catalog.n_classes()).ok();
        writeln!(&mut out, "Outlets: {}", model.outlets.len()).ok();

        if model.net.nlinks > 0 {
            writeln!(&mut out).ok();
            writeln!(&mut out, "  Channel Network Topology").ok();
            writeln!(&mut out, "----------------------------").ok();
            writeln!(&mut out, "  Number of Links = {}", model.net.nlinks).ok();
            writeln!(&mut out).ok();
            writeln!(&mut out, "    Link    Nodes    Upstream branches").ok();
            for l in 0..model.net.nlinks {
                let mut branches = String::new();
                for d in Direction::ALL {
                    if let crate::topology::BranchSlot::Link(upl) =
                        model.net.up_branches[l][d.code() - 1]
                    {
                        write!(&mut branches, " {}(dir {})", upl + 1, d.code()).ok();
                    }
                }
                if branches.is_empty() {
                    branches = " headwater".to_string();
                }
                writeln!(
                    &mut out,
                    "{:8} {:8} {}",
                    l + 1,
                    model.net.nodes_per_link[l],
                    branches
                )
                .ok();
            }

            writeln!(&mut out).ok();
            writeln!(&mut out, "  Channel Lengths (m)").ok();
            writeln!(&mut out, "~~~~~~~~~~~~~~~~~~~~~").ok();
            for (l, n) in model.net.nodes() {
                writeln!(
                    &mut out,
                    "{:8} {:4}   {:12.3}",
                    l + 1,
                    n + 1,
                    model.net.length[l][n]
                )
                .ok();
            }
        }
        writeln!(&mut out).ok();
        self.append(&out);
    }

    /// Longer diagnostic for a fatal error; the one-line version goes to
    /// stderr separately.
    pub fn write_error(&self, context: &str, message: &str) {
        self.append(&format!("\nFATAL ({}): {}\n", context, message));
    }

    pub fn write_mass_balance(&self, report: &str) {
        self.append("\n");
        self.append(report);
    }
}
