use crate::hydrology::infiltration::green_ampt_rate;

/// One Green-Ampt step with literal values: kh = 1e-5 m/s, psi = 0.1 m,
/// moisture deficit 0.3, F = 0, ponded depth 0.01 m, dt = 10 s.
#[test]
fn test_green_ampt_one_step() {
    let rate = green_ampt_rate(1.0e-5, 0.1, 0.3, 0.01, 0.0, 10.0);
    //(1e-4 + sqrt(1e-8 + 8 * 3.3e-7 * 10)) / 20
    assert!((rate - 2.624e-4).abs() < 2.0e-6, "rate = {}", rate);
    //accepted without capping: rate * dt < h
    assert!(rate * 10.0 < 0.01);
}

#[test]
fn test_rate_capped_at_ponded_depth() {
    //tiny ponded depth: the loss cannot exceed the water present
    let h = 1.0e-5;
    let dt = 10.0;
    let rate = green_ampt_rate(1.0e-4, 0.3, 0.4, h, 0.0, dt);
    assert!((rate - h / dt).abs() < 1e-15);
}

#[test]
fn test_rate_declines_with_cumulative_depth() {
    let shallow = green_ampt_rate(1.0e-5, 0.1, 0.3, 0.01, 0.0, 10.0);
    let deep = green_ampt_rate(1.0e-5, 0.1, 0.3, 0.01, 0.05, 10.0);
    assert!(deep < shallow);
    //with a large wetted depth the rate approaches kh
    let asymptotic = green_ampt_rate(1.0e-5, 0.1, 0.3, 1.0, 10.0, 10.0);
    assert!((asymptotic - 1.0e-5).abs() < 5.0e-6);
}

#[test]
fn test_zero_conductivity_infiltrates_nothing() {
    assert_eq!(green_ampt_rate(0.0, 0.1, 0.3, 0.01, 0.0, 10.0), 0.0);
}
