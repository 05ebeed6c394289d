use crate::hydrology::channel::ChannelGeometry;

fn trapezoid() -> ChannelGeometry {
    ChannelGeometry {
        bottom_width: 2.0,
        bank_height: 1.0,
        side_slope: 1.5,
        manning_n: 0.03,
        sinuosity: 1.0,
        ..Default::default()
    }
    .finish()
}

#[test]
fn test_top_width_from_trapezoid() {
    let geom = trapezoid();
    assert_eq!(geom.top_width, 5.0);
}

#[test]
fn test_cross_section_below_bank() {
    let geom = trapezoid();
    let h = 0.5;
    assert!((geom.cross_section_area(h) - (2.0 + 1.5 * 0.5) * 0.5).abs() < 1e-12);
    let wp = 2.0 + 2.0 * 0.5 * f64::sqrt(1.0 + 1.5 * 1.5);
    assert!((geom.wetted_perimeter(h) - wp).abs() < 1e-12);
    assert!((geom.surface_width(h) - 3.5).abs() < 1e-12);
}

#[test]
fn test_cross_section_above_bank_adds_rectangular_cap() {
    let geom = trapezoid();
    let h = 1.4;
    let below = (2.0 + 1.5 * 1.0) * 1.0;
    let cap = 0.4 * 5.0;
    assert!((geom.cross_section_area(h) - (below + cap)).abs() < 1e-12);
    let wp = 2.0 + 2.0 * 1.0 * f64::sqrt(1.0 + 1.5 * 1.5) + 2.0 * 0.4;
    assert!((geom.wetted_perimeter(h) - wp).abs() < 1e-12);
    assert_eq!(geom.surface_width(h), 5.0);
}

#[test]
fn test_depth_at_area_inverts_cross_section() {
    let geom = trapezoid();
    for &h in &[0.0, 0.2, 0.7, 1.0, 1.3, 2.5] {
        let area = geom.cross_section_area(h);
        let back = geom.depth_at_area(area);
        assert!((back - h).abs() < 1e-10, "h = {}: {}", h, back);
    }
}

#[test]
fn test_depth_at_area_rectangular() {
    let geom = ChannelGeometry {
        bottom_width: 2.0,
        bank_height: 1.0,
        side_slope: 0.0,
        ..Default::default()
    }
    .finish();
    assert!((geom.depth_at_area(1.0) - 0.5).abs() < 1e-12);
}

#[test]
fn test_manning_flow_increases_with_depth_and_slope() {
    let geom = trapezoid();
    let q1 = geom.manning_flow(0.3, 0.001);
    let q2 = geom.manning_flow(0.6, 0.001);
    let q3 = geom.manning_flow(0.6, 0.004);
    assert!(q1 > 0.0);
    assert!(q2 > q1);
    //quadrupling the slope doubles the flow
    assert!((q3 / q2 - 2.0).abs() < 1e-9);
}

#[test]
fn test_manning_flow_zero_when_dry_or_flat() {
    let geom = trapezoid();
    assert_eq!(geom.manning_flow(0.0, 0.01), 0.0);
    assert_eq!(geom.manning_flow(0.5, 0.0), 0.0);
}
