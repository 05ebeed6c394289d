use crate::solids::class::{SolidsCatalog, SolidsClass};
use crate::solids::stack::{SedimentLayer, SedimentStack};

fn two_class_catalog() -> SolidsCatalog {
    SolidsCatalog::new(vec![
        SolidsClass {
            name: "silt".to_string(),
            ds: 2.0e-5,
            specific_gravity: 2.65,
            group: 1,
            ..Default::default()
        },
        SolidsClass {
            name: "sand".to_string(),
            ds: 5.0e-4,
            specific_gravity: 2.65,
            group: 2,
            ..Default::default()
        },
    ])
}

#[test]
fn test_fill_from_fractions_totals() {
    let catalog = two_class_catalog();
    let mut layer = SedimentLayer::new(2.0, 1.0, 0.4, 2);
    layer.fill_from_fractions(&[0.25, 0.75], &catalog);

    //bulk density of each class at 40% porosity: 2.65 * 1000 * 0.6 kg/m3
    let density_g = 2.65 * 1000.0 * 0.6 * 1000.0;
    assert!((layer.conc[1] - 0.25 * density_g).abs() < 1e-6);
    assert!((layer.conc[2] - 0.75 * density_g).abs() < 1e-6);
    assert!((layer.conc[0] - (layer.conc[1] + layer.conc[2])).abs() < 1e-6);
    assert!((layer.mass(1) - 0.25 * density_g * 2.0).abs() < 1e-6);
}

#[test]
fn test_exchange_conserves_class_mass() {
    let catalog = two_class_catalog();
    let mut layer = SedimentLayer::new(1.0, 1.0, 0.4, 2);
    layer.fill_from_fractions(&[0.5, 0.5], &catalog);
    let mut stack = SedimentStack::single_layer(layer);

    let before_1 = stack.total_mass(1);
    let before_2 = stack.total_mass(2);

    //erode 100 g of class 1, deposit 40 g of class 2
    stack.apply_exchange(&[0.0, 100.0, 0.0], &[0.0, 0.0, 40.0], &catalog);

    assert!((stack.total_mass(1) - (before_1 - 100.0)).abs() < 1e-6);
    assert!((stack.total_mass(2) - (before_2 + 40.0)).abs() < 1e-6);

    //volume follows mass at each class bulk density
    let density_g = 2.65 * 1000.0 * 0.6 * 1000.0;
    let expected_volume = 1.0 - 100.0 / density_g + 40.0 / density_g;
    assert!((stack.surface().unwrap().volume - expected_volume).abs() < 1e-9);

    //the total slot tracks the class sum
    let surface = stack.surface().unwrap();
    assert!((surface.conc[0] - (surface.conc[1] + surface.conc[2])).abs() < 1e-6);
}

#[test]
fn test_exhausted_surface_layer_pops() {
    let catalog = two_class_catalog();
    let mut bottom = SedimentLayer::new(1.0, 1.0, 0.4, 2);
    bottom.fill_from_fractions(&[1.0, 0.0], &catalog);
    let mut top = SedimentLayer::new(0.001, 1.0, 0.4, 2);
    top.fill_from_fractions(&[0.0, 1.0], &catalog);
    let mut stack = SedimentStack {
        layers: vec![bottom, top],
    };

    //erode more bulk volume than the thin top layer holds
    let density_g = 2.65 * 1000.0 * 0.6 * 1000.0;
    let huge = 0.002 * density_g;
    stack.apply_exchange(&[0.0, 0.0, huge], &[0.0, 0.0, 0.0], &catalog);

    //the thin layer is gone and the one beneath is the new surface
    assert_eq!(stack.layers.len(), 1);
    assert!(stack.surface().unwrap().conc[1] > 0.0);
}

#[test]
fn test_empty_stack_ignores_exchange() {
    let catalog = two_class_catalog();
    let mut stack = SedimentStack::default();
    stack.apply_exchange(&[0.0, 1.0, 1.0], &[0.0, 0.0, 0.0], &catalog);
    assert!(stack.surface().is_none());
}
