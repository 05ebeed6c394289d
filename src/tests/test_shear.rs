use crate::grid::{DENSITY_WATER, GRAVITY};
use crate::hydrology::channel::ChannelGeometry;
use crate::hydrology::shear;
use crate::solids::class::{SolidsCatalog, SolidsClass};
use crate::solids::stack::{SedimentLayer, SedimentStack};
use crate::topology::Direction;

#[test]
fn test_overland_friction_slope_is_vector_magnitude() {
    let mut sf = [0.0; 9];
    sf[Direction::South.code()] = 0.003;
    sf[Direction::East.code()] = 0.004;
    assert!((shear::overland_friction_slope(&sf) - 0.005).abs() < 1e-12);
}

#[test]
fn test_overland_shear_stress() {
    let tau = shear::overland_shear(0.02, 0.01);
    assert!((tau - DENSITY_WATER * GRAVITY * 0.02 * 0.01).abs() < 1e-9);
    let ustar = shear::overland_friction_velocity(0.02, 0.01);
    assert!((ustar - f64::sqrt(GRAVITY * 0.02 * 0.01)).abs() < 1e-12);
}

#[test]
fn test_channel_hydraulics() {
    let geom = ChannelGeometry {
        bottom_width: 2.0,
        bank_height: 1.0,
        side_slope: 0.0,
        ..Default::default()
    }
    .finish();
    let hyd = shear::channel_hydraulics(&geom, 0.5, 0.001);
    let rh = 1.0 / 3.0; //area 1.0, wetted perimeter 3.0
    assert!((hyd.hydraulic_radius - rh).abs() < 1e-12);
    assert!((hyd.tau - DENSITY_WATER * GRAVITY * rh * 0.001).abs() < 1e-9);
    assert!((hyd.ustar - f64::sqrt(GRAVITY * rh * 0.001)).abs() < 1e-12);
    //negative friction slopes (reverse flow) use the magnitude
    let reversed = shear::channel_hydraulics(&geom, 0.5, -0.001);
    assert_eq!(reversed.tau, hyd.tau);
}

#[test]
fn test_grain_shear_never_exceeds_total() {
    for &(d50, h) in &[(0.001, 0.5), (0.0001, 0.05), (0.01, 2.0)] {
        let tau = 5.0;
        let grain = shear::grain_shear(tau, d50, h);
        assert!(grain > 0.0);
        assert!(grain <= tau, "d50 {} h {}: {}", d50, h, grain);
    }
}

#[test]
fn test_surface_d50_defaults_to_one_millimeter() {
    let catalog = SolidsCatalog::new(vec![SolidsClass {
        name: "sand".to_string(),
        ds: 5.0e-4,
        specific_gravity: 2.65,
        ..Default::default()
    }]);

    //empty stack: 1 mm default
    let empty = SedimentStack::default();
    assert_eq!(empty.surface_d50(&catalog), 0.001);

    //populated layer: mass-weighted mean equals the single class size
    let mut layer = SedimentLayer::new(1.0, 1.0, 0.4, 1);
    layer.fill_from_fractions(&[1.0], &catalog);
    let stack = SedimentStack::single_layer(layer);
    assert!((stack.surface_d50(&catalog) - 5.0e-4).abs() < 1e-12);
}
