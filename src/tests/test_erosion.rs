use crate::solids::class::Cohesion;
use crate::solids::erosion::{
    engelund_hansen_capacity, excess_shear_epsilon, kilinc_richardson_capacity,
};

#[test]
fn test_non_cohesive_excess_shear() {
    //tau twice the critical value with a unit exponent: epsilon = ay/zage
    let eps = excess_shear_epsilon(0.2, 0.0, 0.1, 0.5, 0.01, 1.0, Cohesion::NonCohesive);
    assert!((eps - 50.0).abs() < 1e-9);

    //below critical: nothing
    assert_eq!(
        excess_shear_epsilon(0.05, 0.0, 0.1, 0.5, 0.01, 1.0, Cohesion::NonCohesive),
        0.0
    );

    //the exponent shapes the excess term
    let eps2 = excess_shear_epsilon(0.3, 0.0, 0.1, 0.5, 0.01, 2.0, Cohesion::NonCohesive);
    assert!((eps2 - 50.0 * 4.0).abs() < 1e-9);
}

#[test]
fn test_cohesive_erosion_respects_exposure_history() {
    //first exposure at tau = 0.2 erodes the full excess
    let fresh = excess_shear_epsilon(0.2, 0.0, 0.1, 0.5, 0.01, 1.0, Cohesion::Cohesive);
    assert!((fresh - 50.0).abs() < 1e-9);

    //the same shear against a history of 0.2 erodes nothing
    assert_eq!(
        excess_shear_epsilon(0.2, 0.2, 0.1, 0.5, 0.01, 1.0, Cohesion::Cohesive),
        0.0
    );

    //a higher shear erodes only the increment above the history
    let incremental = excess_shear_epsilon(0.3, 0.2, 0.1, 0.5, 0.01, 1.0, Cohesion::Cohesive);
    let full = excess_shear_epsilon(0.3, 0.0, 0.1, 0.5, 0.01, 1.0, Cohesion::Cohesive);
    assert!(incremental < full);
    assert!((incremental - (full - fresh)).abs() < 1e-9);
}

#[test]
fn test_kilinc_richardson_capacity_behaviour() {
    //no flow or no slope: no capacity
    assert_eq!(kilinc_richardson_capacity(0.0, 0.01, 0.3, 0.5, 1.0, 10.0), 0.0);
    assert_eq!(kilinc_richardson_capacity(1e-4, 0.0, 0.3, 0.5, 1.0, 10.0), 0.0);

    let base = kilinc_richardson_capacity(1e-4, 0.01, 0.3, 0.5, 1.0, 10.0);
    assert!(base > 0.0);
    //capacity grows steeply with unit discharge and slope
    assert!(kilinc_richardson_capacity(2e-4, 0.01, 0.3, 0.5, 1.0, 10.0) > 2.0 * base);
    assert!(kilinc_richardson_capacity(1e-4, 0.02, 0.3, 0.5, 1.0, 10.0) > 2.0 * base);
    //erodibility factors scale linearly
    let doubled_k = kilinc_richardson_capacity(1e-4, 0.01, 0.6, 0.5, 1.0, 10.0);
    assert!((doubled_k / base - 2.0).abs() < 1e-9);
}

#[test]
fn test_engelund_hansen_capacity_behaviour() {
    let tau = 2.0;
    let base = engelund_hansen_capacity(0.5, 0.3, 0.001, 2e-4, 2.65, tau, 2.0);
    assert!(base > 0.0);
    //more shear stress moves more sediment
    let sheared = engelund_hansen_capacity(0.5, 0.3, 0.001, 2e-4, 2.65, 2.0 * tau, 2.0);
    assert!(sheared > base);
    //degenerate hydraulics carry nothing
    assert_eq!(engelund_hansen_capacity(0.0, 0.3, 0.001, 2e-4, 2.65, tau, 2.0), 0.0);
    assert_eq!(engelund_hansen_capacity(0.5, 0.3, 0.0, 2e-4, 2.65, tau, 2.0), 0.0);
}
