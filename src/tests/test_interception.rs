use crate::hydrology::interception::debit;

/// Interception absorbs all the rain while storage remains: 10 mm/hr on
/// 0.002 m of remaining storage over a 60 s step.
#[test]
fn test_interception_absorbs_rain() {
    let gross = 10.0 / 3.6e6; //10 mm/hr in m/s
    let dt = 60.0;
    let mut remaining = 0.002;
    let mut debited = 0.0;

    let net = debit(gross, dt, &mut remaining, &mut debited);

    assert_eq!(net, 0.0);
    assert!((debited - 1.667e-4).abs() < 1e-7);
    assert!((remaining - 1.833e-3).abs() < 1e-6);
}

/// Interception overflows mid-step: 1e-4 m of storage against the same
/// rain leaves net rain of 1.111e-6 m/s.
#[test]
fn test_interception_overflow() {
    let gross = 10.0 / 3.6e6;
    let dt = 60.0;
    let mut remaining = 1.0e-4;
    let mut debited = 0.0;

    let net = debit(gross, dt, &mut remaining, &mut debited);

    assert!((net - 1.111e-6).abs() < 1e-9);
    assert_eq!(remaining, 0.0);
    assert!((debited - 1.0e-4).abs() < 1e-12);
    //one step of the net rate builds the expected depth
    assert!((net * dt - 6.667e-5).abs() < 1e-8);
}

#[test]
fn test_no_storage_passes_rain_through() {
    let gross = 2.778e-6;
    let mut remaining = 0.0;
    let mut debited = 0.0;
    let net = debit(gross, 60.0, &mut remaining, &mut debited);
    assert_eq!(net, gross);
    assert_eq!(debited, 0.0);
}

/// Rain and snow debit the same storage in sequence.
#[test]
fn test_rain_then_snow_share_storage() {
    let dt = 60.0;
    let mut remaining = 2.0e-4;
    let mut debited = 0.0;

    //rain takes 1.667e-4 of the storage
    let net_rain = debit(10.0 / 3.6e6, dt, &mut remaining, &mut debited);
    assert_eq!(net_rain, 0.0);
    //snow overflows what is left
    let net_swe = debit(10.0 / 3.6e6, dt, &mut remaining, &mut debited);
    assert!(net_swe > 0.0);
    assert_eq!(remaining, 0.0);
    assert!((debited - 2.0e-4).abs() < 1e-12);
}
