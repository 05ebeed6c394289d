use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{CellKind, Grid};
use crate::topology::builder::build_network;
use crate::topology::{BranchSlot, Direction, InterfaceCode};

fn open_grid(nrows: usize, ncols: usize) -> Grid {
    Grid {
        nrows,
        ncols,
        cell_size: 10.0,
        nodata: -9999.0,
        mask: vec![CellKind::Overland; nrows * ncols],
        elevation: vec![0.0; nrows * ncols],
        slope: vec![0.0; nrows * ncols],
        land_use: vec![0; nrows * ncols],
        soil: vec![0; nrows * ncols],
        ..Default::default()
    }
}

/// Two links meeting end to start along one row: link 1 nodes at columns
/// 0 and 1, link 2 nodes at columns 2 and 3.
#[test]
fn test_junction_between_two_links() {
    let mut grid = open_grid(1, 4);
    let link = vec![1.0, 1.0, 2.0, 2.0];
    let node = vec![1.0, 2.0, 1.0, 2.0];

    let net = build_network(&mut grid, &link, &node).unwrap();

    assert_eq!(net.nlinks, 2);
    assert_eq!(net.nodes_per_link, vec![2, 2]);

    //link 1's last node is the upstream branch of link 2 to the west
    assert_eq!(net.up_branches[1][Direction::West.code() - 1], BranchSlot::Link(0));
    //and link 2 is the downstream branch of link 1 to the east
    assert_eq!(net.down_branches[0][Direction::East.code() - 1], BranchSlot::Link(1));

    //sentinel anchors point across the junction
    assert_eq!(net.downstream_anchor[0], Some((0, 2)));
    assert_eq!(net.upstream_anchor[1], Some((0, 1)));
    assert_eq!(net.downstream_anchor[0].unwrap(), net.anchors[1][0]);

    //mask was flagged for channel cells
    for c in 0..4 {
        assert!(grid.is_channel_cell(0, c));
    }

    //interface directions: interior nodes carry slot 0, the junction
    //carries its compass slot, the outlet last node drains the boundary
    assert_eq!(
        net.directions[0][0].down[0],
        InterfaceCode::Dir(Direction::East)
    );
    assert_eq!(
        net.directions[1][0].up[Direction::West.code()],
        InterfaceCode::Dir(Direction::West)
    );
    assert_eq!(net.directions[1][1].down[0], InterfaceCode::Boundary);
    //headwater first node has no upstream interface
    assert_eq!(net.directions[0][0].up[0], InterfaceCode::None);

    //three interfaces: two interior, one junction
    assert_eq!(net.interfaces.len(), 3);
}

#[test]
fn test_junction_claims_each_upstream_link_once() {
    //links 1 and 2 both end next to the single-node link 3; the
    //descending scan lets link 3 claim both, and the headwater links
    //(whose first nodes also touch the junction cell diagonally) must
    //not claim anything
    let mut grid = open_grid(3, 3);
    let link = vec![
        1.0, 0.0, 2.0, //
        1.0, 3.0, 2.0, //
        0.0, 0.0, 0.0,
    ];
    let node = vec![
        1.0, 0.0, 1.0, //
        2.0, 1.0, 2.0, //
        0.0, 0.0, 0.0,
    ];

    let net = build_network(&mut grid, &link, &node).unwrap();

    //every upstream link is claimed by exactly one downstream link
    for upstream in 0..net.nlinks {
        let claims: usize = (0..net.nlinks)
            .map(|l| {
                net.up_branches[l]
                    .iter()
                    .filter(|b| **b == BranchSlot::Link(upstream))
                    .count()
            })
            .sum();
        let expected = if upstream == 2 { 0 } else { 1 };
        assert_eq!(claims, expected, "upstream link {}", upstream + 1);
    }

    assert_eq!(net.up_branch_count(2), 2);
    assert_eq!(net.down_branch_count(0), 1);
    assert_eq!(net.down_branch_count(1), 1);
}

#[test]
fn test_link_node_mismatch_is_fatal() {
    let mut grid = open_grid(1, 2);
    let link = vec![1.0, 1.0];
    let node = vec![1.0, 0.0]; //second cell has a link but no node
    let err = build_network(&mut grid, &link, &node).unwrap_err();
    assert!(err.contains("do not match"), "unexpected error: {}", err);
}

#[test]
fn test_missing_node_is_fatal() {
    let mut grid = open_grid(1, 3);
    let link = vec![1.0, 0.0, 1.0];
    let node = vec![1.0, 0.0, 3.0]; //node 2 never appears
    let err = build_network(&mut grid, &link, &node).unwrap_err();
    assert!(err.contains("missing node"), "unexpected error: {}", err);
}

#[test]
fn test_duplicate_node_is_fatal() {
    let mut grid = open_grid(1, 3);
    let link = vec![1.0, 1.0, 1.0];
    let node = vec![1.0, 2.0, 2.0];
    let err = build_network(&mut grid, &link, &node).unwrap_err();
    assert!(err.contains("appears at both"), "unexpected error: {}", err);
}

/// Random chains split into consecutive links always satisfy the
/// single-claim invariant, and every interface connects adjacent cells.
#[test]
fn test_random_chains_single_claim() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20 {
        let ncols = rng.gen_range(4..12);
        let mut grid = open_grid(1, ncols);

        //split the row into 2..4 consecutive links, numbered upstream
        //to downstream
        let n_links = rng.gen_range(2..=3.min(ncols / 2));
        let mut cuts: Vec<usize> = (1..ncols).collect();
        let mut boundaries = Vec::new();
        for _ in 0..n_links - 1 {
            let k = rng.gen_range(0..cuts.len());
            boundaries.push(cuts.remove(k));
        }
        boundaries.sort_unstable();
        boundaries.push(ncols);

        let mut link = vec![0.0; ncols];
        let mut node = vec![0.0; ncols];
        let mut start = 0;
        for (l, &end) in boundaries.iter().enumerate() {
            for (j, c) in (start..end).enumerate() {
                link[c] = (l + 1) as f64;
                node[c] = (j + 1) as f64;
            }
            start = end;
        }

        let net = build_network(&mut grid, &link, &node).unwrap();

        for upstream in 0..net.nlinks - 1 {
            let claims: usize = (0..net.nlinks)
                .map(|l| {
                    net.up_branches[l]
                        .iter()
                        .filter(|b| **b == BranchSlot::Link(upstream))
                        .count()
                })
                .sum();
            assert_eq!(claims, 1, "upstream link {} of {:?}", upstream + 1, boundaries);
        }

        for iface in &net.interfaces {
            let (ur, uc) = net.anchors[iface.up_link][iface.up_node];
            let (dr, dc) = net.anchors[iface.down_link][iface.down_node];
            let dr_off = dr as i64 - ur as i64;
            let dc_off = dc as i64 - uc as i64;
            assert!(Direction::from_offset(dr_off, dc_off).is_some());
        }
    }
}
