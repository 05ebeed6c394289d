use crate::grid::{CellKind, Grid};
use crate::topology::builder::build_network;
use crate::topology::length::compute_channel_lengths;

fn open_grid(nrows: usize, ncols: usize, w: f64) -> Grid {
    Grid {
        nrows,
        ncols,
        cell_size: w,
        nodata: -9999.0,
        mask: vec![CellKind::Overland; nrows * ncols],
        elevation: vec![0.0; nrows * ncols],
        slope: vec![0.0; nrows * ncols],
        land_use: vec![0; nrows * ncols],
        soil: vec![0; nrows * ncols],
        ..Default::default()
    }
}

fn unit_sinuosity(net: &crate::topology::ChannelNetwork) -> Vec<Vec<f64>> {
    net.nodes_per_link.iter().map(|&n| vec![1.0; n]).collect()
}

#[test]
fn test_straight_spans() {
    let mut grid = open_grid(1, 3, 10.0);
    let link = vec![1.0, 1.0, 1.0];
    let node = vec![1.0, 2.0, 3.0];
    let mut net = build_network(&mut grid, &link, &node).unwrap();
    let sin = unit_sinuosity(&net);
    compute_channel_lengths(&mut net, &grid, &sin).unwrap();

    //straight internode spans: half lengths of 0.5 * w
    assert_eq!(net.length_down[0][0], 5.0);
    assert_eq!(net.length_up[0][1], 5.0);
    assert_eq!(net.length[0][0], 10.0);
    assert_eq!(net.length[0][1], 10.0);
    //last node copies the previous interior span direction
    assert_eq!(net.length[0][2], 10.0);
}

#[test]
fn test_diagonal_spans() {
    let mut grid = open_grid(3, 3, 10.0);
    //channel runs down the diagonal
    let link = vec![
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0,
    ];
    let node = vec![
        1.0, 0.0, 0.0, //
        0.0, 2.0, 0.0, //
        0.0, 0.0, 3.0,
    ];
    let mut net = build_network(&mut grid, &link, &node).unwrap();
    let sin = unit_sinuosity(&net);
    compute_channel_lengths(&mut net, &grid, &sin).unwrap();

    let expected_half = 0.5 * f64::sqrt(2.0) * 10.0;
    assert!((net.length_down[0][0] - expected_half).abs() < 1e-12);
    assert!((net.length[0][0] - 2.0 * expected_half).abs() < 1e-12);
    assert!((net.length[0][2] - 2.0 * expected_half).abs() < 1e-12);
}

#[test]
fn test_sinuosity_multiplies_node_lengths() {
    let mut grid = open_grid(1, 2, 10.0);
    let link = vec![1.0, 1.0];
    let node = vec![1.0, 2.0];
    let mut net = build_network(&mut grid, &link, &node).unwrap();
    let sin = vec![vec![1.5, 2.0]];
    compute_channel_lengths(&mut net, &grid, &sin).unwrap();

    assert_eq!(net.length[0][0], 15.0);
    assert_eq!(net.length[0][1], 20.0);
}

#[test]
fn test_sinuosity_below_one_is_fatal() {
    let mut grid = open_grid(1, 2, 10.0);
    let link = vec![1.0, 1.0];
    let node = vec![1.0, 2.0];
    let mut net = build_network(&mut grid, &link, &node).unwrap();
    let sin = vec![vec![1.0, 0.9]];
    assert!(compute_channel_lengths(&mut net, &grid, &sin).is_err());
}

#[test]
fn test_junction_span_uses_downstream_anchor() {
    //link 1 ends one cell northwest of link 2's first node, so its last
    //span is diagonal even though its interior span is straight
    let mut grid = open_grid(2, 3, 10.0);
    let link = vec![
        1.0, 1.0, 0.0, //
        0.0, 0.0, 2.0,
    ];
    let node = vec![
        1.0, 2.0, 0.0, //
        0.0, 0.0, 1.0,
    ];
    let mut net = build_network(&mut grid, &link, &node).unwrap();
    let sin = unit_sinuosity(&net);
    compute_channel_lengths(&mut net, &grid, &sin).unwrap();

    let diagonal_half = 0.5 * f64::sqrt(2.0) * 10.0;
    assert!((net.length_down[0][1] - diagonal_half).abs() < 1e-12);
    //node-to-node length at the junction: diagonal down-half plus the
    //mirrored virtual exit half
    assert!((net.length[0][1] - 2.0 * diagonal_half).abs() < 1e-12);
}
