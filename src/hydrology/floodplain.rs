// Floodplain exchange. Water moves between the overland and channel
// portions of a channel cell toward a common water surface: overland
// water first fills the channel up to the bank, and any water standing
// above ground level on either side equalizes between the two plan
// areas. Transfer volumes are computed from previous-step depths and
// applied to the staged depths, so the phase reads old state only.

use crate::grid::TOLERANCE;
use crate::model::{channel_surface_area, overland_surface_area, Model, RunState};

/// Phase 6: reconcile overland and channel depths in every channel cell.
pub fn exchange(model: &Model, state: &mut RunState) -> Result<(), String> {
    let dt = state.dt;

    for (l, n) in model.net.nodes() {
        let i = model.cell_of_node(l, n);
        let geom = &model.geometry[l][n];
        let length = model.net.length[l][n];
        let a_ov = overland_surface_area(model, i);
        let a_ch = channel_surface_area(model, l, n);
        if a_ov <= 0.0 || a_ch <= 0.0 || length <= 0.0 {
            continue;
        }

        let hov = state.ov.h[i];
        let hch = state.ch.h[l][n];
        let hbank = geom.bank_height;

        //level of channel water above ground (m); zero while in bank
        let lch = (hch - hbank).max(0.0);

        //moved > 0 transfers water from the overland plane into the
        //channel; moved < 0 is flooding out of the channel
        let mut moved;
        if hov > lch {
            //overland water pours in: fill the channel to the bank first
            let vol_ov = hov * a_ov;
            let below_bank =
                ((geom.cross_section_area(hbank) - geom.cross_section_area(hch)) * length).max(0.0);
            if vol_ov <= below_bank {
                moved = vol_ov;
            } else {
                //the rest equalizes above ground across both plan areas
                let rest = vol_ov - below_bank;
                let eq = (rest + lch * a_ch) / (a_ov + a_ch);
                moved = below_bank + (rest - eq * a_ov);
            }
        } else if lch > hov {
            //flooding: above-ground water equalizes across the cell
            let eq = (hov * a_ov + lch * a_ch) / (a_ov + a_ch);
            moved = -((lch - eq) * a_ch);
            //never draw the channel below its bank by flooding
            let above_bank =
                (geom.cross_section_area(hch) - geom.cross_section_area(hbank)).max(0.0) * length;
            if -moved > above_bank {
                moved = -above_bank;
            }
        } else {
            continue;
        }

        if moved == 0.0 {
            continue;
        }
        state.ch.fp_rate[l][n] = moved / dt;

        //apply exactly in volume on both sides
        let mut hov_new = state.ov.h_new[i] - moved / a_ov;
        let vol_ch_new = geom.cross_section_area(state.ch.h_new[l][n]) * length + moved;
        let mut hch_new = geom.depth_at_area(vol_ch_new / length);

        if hov_new < 0.0 {
            if hov_new.abs() < TOLERANCE {
                hov_new = 0.0;
            } else {
                let (r, c) = model.net.anchors[l][n];
                return Err(format!(
                    "Floodplain transfer drove overland depth to {:.3e} m at row {} col {}, step {} simtime {:.4} h",
                    hov_new, r, c, state.step, state.simtime
                ));
            }
        }
        if hch_new < 0.0 {
            if hch_new.abs() < TOLERANCE {
                hch_new = 0.0;
            } else {
                let (r, c) = model.net.anchors[l][n];
                return Err(format!(
                    "Floodplain transfer drove channel depth to {:.3e} m at link {} node {} (row {} col {}), step {} simtime {:.4} h",
                    hch_new,
                    l + 1,
                    n + 1,
                    r,
                    c,
                    state.step,
                    state.simtime
                ));
            }
        }
        state.ov.h_new[i] = if hov_new < TOLERANCE { 0.0 } else { hov_new };
        state.ch.h_new[l][n] = if hch_new < TOLERANCE { 0.0 } else { hch_new };
    }
    Ok(())
}
