// Builds the channel network topology from the link and node rasters.
//
// The sweep over links runs in descending link id order, and every channel
// cell carries a one-shot "available" flag. Together these guarantee that
// each upstream link is claimed by exactly one downstream link even when
// three candidate links crowd one junction.

use crate::grid::{CellKind, Grid};
use crate::topology::{
    BranchSlot, ChannelInterface, ChannelNetwork, Direction, InterfaceCode, NodeDirections,
};

/// Build the channel network from link and node rasters (raw ASCII grid
/// values, 0 or nodata meaning "no channel", link ids and node ordinals
/// counted from 1). Flags the grid mask with CellKind::Channel as a side
/// effect.
pub fn build_network(
    grid: &mut Grid,
    link_raster: &[f64],
    node_raster: &[f64],
) -> Result<ChannelNetwork, String> {
    let nrows = grid.nrows;
    let ncols = grid.ncols;
    let nodata = grid.nodata;

    let cell_link = move |r: usize, c: usize| -> usize {
        let v = link_raster[r * ncols + c];
        if !v.is_finite() || v == nodata || v < 0.5 {
            0
        } else {
            v.round() as usize
        }
    };
    let cell_node = move |r: usize, c: usize| -> usize {
        let v = node_raster[r * ncols + c];
        if !v.is_finite() || v == nodata || v < 0.5 {
            0
        } else {
            v.round() as usize
        }
    };

    // First pass: count links and nodes, check that link and node rasters
    // agree cell by cell.
    let mut nlinks = 0usize;
    for r in 0..nrows {
        for c in 0..ncols {
            let l = cell_link(r, c);
            let n = cell_node(r, c);
            if (l >= 1) != (n >= 1) {
                return Err(format!(
                    "Link and node locations do not match at row {} column {} (link = {}, node = {})",
                    r, c, l, n
                ));
            }
            if l >= 1 && !grid.is_in_domain(r, c) {
                return Err(format!(
                    "Channel cell at row {} column {} lies outside the domain mask",
                    r, c
                ));
            }
            nlinks = nlinks.max(l);
        }
    }

    let mut nodes_per_link = vec![0usize; nlinks];
    for r in 0..nrows {
        for c in 0..ncols {
            let l = cell_link(r, c);
            if l >= 1 {
                nodes_per_link[l - 1] = nodes_per_link[l - 1].max(cell_node(r, c));
            }
        }
    }
    for (l, &n) in nodes_per_link.iter().enumerate() {
        if n == 0 {
            return Err(format!("Link {} has zero nodes", l + 1));
        }
    }

    // Second pass: flag channel cells in the mask and anchor every
    // (link, node) to its cell.
    let mut anchors: Vec<Vec<Option<(usize, usize)>>> =
        nodes_per_link.iter().map(|&n| vec![None; n]).collect();
    let mut link_node_of_cell: Vec<Option<(usize, usize)>> = vec![None; grid.n_cells()];
    let mut available = vec![false; grid.n_cells()];

    for r in 0..nrows {
        for c in 0..ncols {
            let l = cell_link(r, c);
            if l == 0 {
                continue;
            }
            let n = cell_node(r, c);
            if n > nodes_per_link[l - 1] {
                return Err(format!(
                    "Node {} of link {} exceeds the link's node count",
                    n, l
                ));
            }
            if let Some((r0, c0)) = anchors[l - 1][n - 1] {
                return Err(format!(
                    "Link {} node {} appears at both row {} column {} and row {} column {}",
                    l, n, r0, c0, r, c
                ));
            }
            let idx = grid.idx(r, c);
            grid.mask[idx] = CellKind::Channel;
            available[idx] = true;
            anchors[l - 1][n - 1] = Some((r, c));
            link_node_of_cell[idx] = Some((l - 1, n - 1));
        }
    }

    let anchors: Vec<Vec<(usize, usize)>> = anchors
        .into_iter()
        .enumerate()
        .map(|(l, link_anchors)| {
            link_anchors
                .into_iter()
                .enumerate()
                .map(|(n, a)| a.ok_or_else(|| format!("Link {} is missing node {}", l + 1, n + 1)))
                .collect::<Result<Vec<_>, String>>()
        })
        .collect::<Result<Vec<_>, String>>()?;

    // Third pass: walk links in descending id order, scanning the eight
    // neighbors of each first node for junction connections. A neighbor
    // qualifies as an upstream branch when it is a channel cell with a
    // smaller link id, is the last node of its link, and still carries
    // the available flag.
    let mut up_branches = vec![[BranchSlot::None; 8]; nlinks];
    let mut down_branches = vec![[BranchSlot::None; 8]; nlinks];
    let mut upstream_anchor: Vec<Option<(usize, usize)>> = vec![None; nlinks];
    let mut downstream_anchor: Vec<Option<(usize, usize)>> = vec![None; nlinks];

    for link in (0..nlinks).rev() {
        let (row, col) = anchors[link][0];
        for drow in -1i64..=1 {
            for dcol in -1i64..=1 {
                if drow == 0 && dcol == 0 {
                    continue;
                }
                let (nr, nc) = (row as i64 + drow, col as i64 + dcol);
                if !grid.in_bounds(nr, nc) {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                let idx = grid.idx(nr, nc);
                if !grid.is_channel_cell(nr, nc) || !available[idx] {
                    continue;
                }
                let (uplink, upnode) = match link_node_of_cell[idx] {
                    Some(pair) => pair,
                    None => continue,
                };
                if uplink >= link {
                    continue;
                }
                if upnode + 1 != nodes_per_link[uplink] {
                    continue;
                }

                // The neighbor is the last node of a lower-numbered link:
                // this is a junction. The direction runs from the first
                // node of the current link toward the neighbor.
                let to_up = Direction::from_offset(drow, dcol)
                    .ok_or_else(|| format!("Bad neighbor offset ({}, {})", drow, dcol))?;
                up_branches[link][to_up.code() - 1] = BranchSlot::Link(uplink);
                down_branches[uplink][to_up.opposite().code() - 1] = BranchSlot::Link(link);
                available[idx] = false;

                upstream_anchor[link] = Some((nr, nc));
                downstream_anchor[uplink] = Some((row, col));
            }
        }
    }

    // Fourth pass: interface direction tables for every node, and the
    // global interface list used by routing and solids transport.
    let mut directions: Vec<Vec<NodeDirections>> = nodes_per_link
        .iter()
        .map(|&n| vec![NodeDirections::default(); n])
        .collect();
    let mut interfaces: Vec<ChannelInterface> = Vec::new();

    for link in 0..nlinks {
        let n_nodes = nodes_per_link[link];

        // Interior interfaces: the flow path between consecutive nodes is
        // stored in the zeroeth slot on both sides.
        for node in 0..n_nodes - 1 {
            let (row, col) = anchors[link][node];
            let (drow, dcol) = anchors[link][node + 1];
            let to_down =
                Direction::from_offset(drow as i64 - row as i64, dcol as i64 - col as i64)
                    .ok_or_else(|| {
                        format!(
                            "Nodes {} and {} of link {} are not adjacent",
                            node + 1,
                            node + 2,
                            link + 1
                        )
                    })?;
            directions[link][node].down[0] = InterfaceCode::Dir(to_down);
            directions[link][node + 1].up[0] = InterfaceCode::Dir(to_down.opposite());
            interfaces.push(ChannelInterface {
                up_link: link,
                up_node: node,
                down_link: link,
                down_node: node + 1,
                up_source: to_down.code(),
                down_source: to_down.opposite().code(),
            });
        }

        // First node: junction slots per upstream branch direction, or a
        // headwater marker when the link originates inside the domain.
        for d in Direction::ALL {
            match up_branches[link][d.code() - 1] {
                BranchSlot::Link(uplink) => {
                    let upnode = nodes_per_link[uplink] - 1;
                    directions[link][0].up[d.code()] = InterfaceCode::Dir(d);
                    directions[uplink][upnode].down[d.opposite().code()] =
                        InterfaceCode::Dir(d.opposite());
                    interfaces.push(ChannelInterface {
                        up_link: uplink,
                        up_node: upnode,
                        down_link: link,
                        down_node: 0,
                        up_source: d.opposite().code(),
                        down_source: d.code(),
                    });
                }
                BranchSlot::Boundary => {
                    directions[link][0].up[d.code()] = InterfaceCode::Boundary;
                }
                BranchSlot::None => {}
            }
        }

        // Last node with no downstream branch drains the domain boundary.
        if down_branches[link].iter().all(|b| !b.is_some()) {
            directions[link][n_nodes - 1].down[0] = InterfaceCode::Boundary;
        }
    }

    Ok(ChannelNetwork {
        nlinks,
        nodes_per_link,
        anchors,
        upstream_anchor,
        downstream_anchor,
        up_branches,
        down_branches,
        directions,
        interfaces,
        length: Vec::new(),
        length_up: Vec::new(),
        length_down: Vec::new(),
        link_node_of_cell,
    })
}
