use crate::grid::{CellKind, Grid};
use crate::io::ascii_grid::{check_header, parse_grid, read_grid, write_grid};
use crate::tests::test_helpers;

fn small_grid() -> Grid {
    Grid {
        nrows: 2,
        ncols: 3,
        cell_size: 10.0,
        xllcorner: 100.0,
        yllcorner: 200.0,
        nodata: -9999.0,
        mask: vec![CellKind::Overland; 6],
        elevation: vec![0.0; 6],
        slope: vec![0.0; 6],
        land_use: vec![0; 6],
        soil: vec![0; 6],
    }
}

#[test]
fn test_parse_header_and_values() {
    let content = "ncols 3\nnrows 2\nxllcorner 100\nyllcorner 200\ncellsize 10\nNODATA_value -9999\n\
                   1.5 2.5 3.5\n4.5 -9999 6.5\n";
    let raster = parse_grid(content, "test").unwrap();
    assert_eq!(raster.ncols, 3);
    assert_eq!(raster.nrows, 2);
    assert_eq!(raster.cellsize, 10.0);
    assert_eq!(raster.value(0, 0), 1.5);
    assert_eq!(raster.value(1, 1), -9999.0);
    assert_eq!(raster.value(1, 2), 6.5);
}

#[test]
fn test_truncated_grid_is_fatal() {
    let content = "ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 10\nNODATA_value -9999\n\
                   1 2 3 4\n";
    assert!(parse_grid(content, "short").is_err());
}

#[test]
fn test_bad_value_is_fatal() {
    let content = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 10\nNODATA_value -9999\n\
                   1 two\n";
    let err = parse_grid(content, "bad").unwrap_err();
    assert!(err.contains("bad numeric value"), "unexpected error: {}", err);
}

/// Round-trip law: writing a grid and re-reading it yields bit-identical
/// numeric values.
#[test]
fn test_write_read_round_trip() {
    let dir = test_helpers::temp_dir();
    let grid = small_grid();
    let path = dir.path().join("out.asc").to_string_lossy().to_string();

    let values = vec![0.1, 2.778e-6, -3.25, 1.0e9, 0.0, 42.5];
    write_grid(&path, &grid, &values).unwrap();
    let back = read_grid(&path).unwrap();

    assert_eq!(back.nrows, grid.nrows);
    assert_eq!(back.ncols, grid.ncols);
    //values cross the boundary in single precision, so compare through
    //the same cast
    for i in 0..values.len() {
        assert_eq!(back.values[i], values[i] as f32 as f64, "cell {}", i);
    }

    //a second round trip is exactly stable
    let path2 = dir.path().join("out2.asc").to_string_lossy().to_string();
    write_grid(&path2, &grid, &back.values).unwrap();
    let again = read_grid(&path2).unwrap();
    assert_eq!(again.values, back.values);
}

#[test]
fn test_nodata_cells_write_the_marker() {
    let dir = test_helpers::temp_dir();
    let mut grid = small_grid();
    grid.mask[4] = CellKind::NoData;
    let path = dir.path().join("masked.asc").to_string_lossy().to_string();
    write_grid(&path, &grid, &vec![1.0; 6]).unwrap();
    let back = read_grid(&path).unwrap();
    assert_eq!(back.value(1, 1), -9999.0);
    assert_eq!(back.value(1, 2), 1.0);
}

#[test]
fn test_header_mismatch_is_fatal() {
    let grid = small_grid();
    let content = "ncols 3\nnrows 3\nxllcorner 0\nyllcorner 0\ncellsize 10\nNODATA_value -9999\n\
                   1 1 1\n1 1 1\n1 1 1\n";
    let raster = parse_grid(content, "other").unwrap();
    assert!(check_header(&raster, &grid, "other").is_err());

    let content = "ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 30\nNODATA_value -9999\n\
                   1 1 1\n1 1 1\n";
    let raster = parse_grid(content, "coarse").unwrap();
    assert!(check_header(&raster, &grid, "coarse").is_err());
}
