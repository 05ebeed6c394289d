// Channel lengths are computed from cell center to cell center. Half the
// length is assigned to the downstream half of the upstream node and half
// to the upstream half of the downstream node, then node-to-node lengths
// are multiplied by stream sinuosity.

use crate::grid::Grid;
use crate::topology::ChannelNetwork;

/// Compute per-node half lengths and node-to-node channel lengths.
/// `sinuosity[link][node]` is dimensionless, >= 1 for meandering reaches.
pub fn compute_channel_lengths(
    net: &mut ChannelNetwork,
    grid: &Grid,
    sinuosity: &[Vec<f64>],
) -> Result<(), String> {
    let w = grid.cell_size;
    let straight = 0.5 * w;
    let diagonal = 0.5 * f64::sqrt(2.0) * w;

    net.length = net.nodes_per_link.iter().map(|&n| vec![0.0; n]).collect();
    net.length_up = net.nodes_per_link.iter().map(|&n| vec![0.0; n]).collect();
    net.length_down = net.nodes_per_link.iter().map(|&n| vec![0.0; n]).collect();

    // Half lengths from each internode span: 0.5*w for N-S or E-W flow,
    // 0.5*sqrt(2)*w on a diagonal.
    for link in 0..net.nlinks {
        let n_nodes = net.nodes_per_link[link];
        for node in 0..n_nodes - 1 {
            let half = span_half_length(net.anchors[link][node], net.anchors[link][node + 1], straight, diagonal);
            net.length_down[link][node] = half;
            net.length_up[link][node + 1] = half;
        }

        // Last node of the link (a junction or an outlet).
        let last = n_nodes - 1;
        match net.downstream_anchor[link] {
            Some(anchor) => {
                let half = span_half_length(net.anchors[link][last], anchor, straight, diagonal);
                net.length_down[link][last] = half;
            }
            None => {
                // No downstream branch: the exit direction is assumed to
                // follow the previous internode span. A one-node link
                // with no neighbors at all falls back to a straight exit.
                let half = if net.length_up[link][last] > 0.0 {
                    net.length_up[link][last]
                } else {
                    straight
                };
                net.length_down[link][last] = half;
                if net.length_up[link][last] == 0.0 {
                    net.length_up[link][last] = half;
                }
            }
        }
    }

    // Node-to-node lengths: downstream half of the node plus the upstream
    // half of the next node (the virtual exit node mirrors the downstream
    // half), times sinuosity.
    for link in 0..net.nlinks {
        let n_nodes = net.nodes_per_link[link];
        for node in 0..n_nodes {
            let sin = sinuosity[link][node];
            if sin < 1.0 {
                return Err(format!(
                    "Sinuosity {} at link {} node {} is below 1",
                    sin,
                    link + 1,
                    node + 1
                ));
            }
            let half_up_next = if node + 1 < n_nodes {
                net.length_up[link][node + 1]
            } else {
                net.length_down[link][node]
            };
            net.length[link][node] = (net.length_down[link][node] + half_up_next) * sin;
        }
    }

    Ok(())
}

fn span_half_length(
    from: (usize, usize),
    to: (usize, usize),
    straight: f64,
    diagonal: f64,
) -> f64 {
    let same_row = from.0 == to.0;
    let same_col = from.1 == to.1;
    if same_row || same_col {
        straight
    } else {
        diagonal
    }
}
