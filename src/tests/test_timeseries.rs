use crate::forcing::TimeSeries;

#[test]
fn test_interpolation_inside_range() {
    let ts = TimeSeries::from_pairs("q", &[(0.0, 0.0), (10.0, 100.0)]).unwrap();
    let mut cursor = ts.start_cursor(0.0);
    assert_eq!(ts.value_at(&mut cursor, 5.0), 50.0);
    assert_eq!(ts.value_at(&mut cursor, 7.5), 75.0);
}

#[test]
fn test_saturates_outside_range() {
    let ts = TimeSeries::from_pairs("q", &[(2.0, 4.0), (6.0, 8.0)]).unwrap();
    let mut cursor = ts.start_cursor(0.0);
    //before the first breakpoint: first value
    assert_eq!(ts.value_at(&mut cursor, 0.0), 4.0);
    //past the last breakpoint: last value, however far past
    assert_eq!(ts.value_at(&mut cursor, 100.0), 8.0);
    assert_eq!(ts.value_at(&mut cursor, 1000.0), 8.0);
}

#[test]
fn test_advancing_with_unchanged_time_is_idempotent() {
    let ts = TimeSeries::from_pairs("q", &[(0.0, 1.0), (1.0, 2.0), (2.0, 5.0)]).unwrap();
    let mut cursor = ts.start_cursor(0.0);
    let first = ts.value_at(&mut cursor, 1.5);
    //advancing by dt = 0 returns the same interpolated value
    let second = ts.value_at(&mut cursor, 1.5);
    assert_eq!(first, second);
    assert_eq!(first, 3.5);
}

#[test]
fn test_cursor_persists_across_steps() {
    let mut ts = TimeSeries::new("q");
    for i in 0..100 {
        ts.push(i as f64, (i * 2) as f64);
    }
    ts.validate().unwrap();
    let mut cursor = ts.start_cursor(0.0);
    for step in 0..200 {
        let t = step as f64 * 0.7;
        let v = ts.value_at(&mut cursor, t);
        let expected = if t >= 99.0 { 198.0 } else { t * 2.0 };
        assert!((v - expected).abs() < 1e-9, "t = {}: {} vs {}", t, v, expected);
    }
}

#[test]
fn test_start_cursor_mid_series() {
    let ts = TimeSeries::from_pairs("q", &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]).unwrap();
    let mut cursor = ts.start_cursor(15.0);
    assert_eq!(ts.value_at(&mut cursor, 15.0), 5.0);
}

#[test]
fn test_scale_values_applied_once() {
    let mut ts = TimeSeries::from_pairs("rain", &[(0.0, 10.0), (1.0, 20.0)]).unwrap();
    ts.scale_values(1.0 / 3.6e6);
    let mut cursor = ts.start_cursor(0.0);
    assert!((ts.value_at(&mut cursor, 0.0) - 2.778e-6).abs() < 1e-9);
}

#[test]
fn test_validation_rejects_bad_series() {
    assert!(TimeSeries::from_pairs("empty", &[]).is_err());
    assert!(TimeSeries::from_pairs("backwards", &[(1.0, 0.0), (0.5, 0.0)]).is_err());
    assert!(TimeSeries::from_pairs("duplicate", &[(1.0, 0.0), (1.0, 2.0)]).is_err());
}

#[test]
fn test_single_breakpoint_is_constant() {
    let ts = TimeSeries::from_pairs("c", &[(0.0, 7.0)]).unwrap();
    let mut cursor = ts.start_cursor(0.0);
    assert_eq!(ts.value_at(&mut cursor, 0.0), 7.0);
    assert_eq!(ts.value_at(&mut cursor, 55.0), 7.0);
}
