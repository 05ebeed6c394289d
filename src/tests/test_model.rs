use std::path::Path;

use crate::io::deck_io::DeckIO;
use crate::model::Model;
use crate::tests::test_helpers;

/// Single overland cell, 10 m on a side, no channel.
fn single_cell_deck(dir: &Path, interception_m: f64, steps: usize, dt_seconds: f64) -> String {
    let w = 10.0;
    let nodata = -9999.0;
    test_helpers::write_ascii(dir, "mask.asc", 1, 1, w, nodata, &[1.0]);
    test_helpers::write_ascii(dir, "elev.asc", 1, 1, w, nodata, &[1.0]);
    test_helpers::write_ascii(dir, "slope.asc", 1, 1, w, nodata, &[0.01]);
    test_helpers::write_ascii(dir, "landuse.asc", 1, 1, w, nodata, &[1.0]);
    test_helpers::write_ascii(dir, "soil.asc", 1, 1, w, nodata, &[1.0]);

    let tend = steps as f64 * dt_seconds / 3600.0;
    format!(
        r#"[freshet]
name = single

[time]
tstart = 0.0
tend = {tend}
dt = {dt}:{tend}

[grid]
mask = mask.asc
elevation = elev.asc
slope = slope.asc
landuse = landuse.asc
soil = soil.asc

[landuse.1]
name = pasture
manning_n = 0.1
interception = {interception}
depression = 0.0

[soil.1]
name = loam
kh = 0.0

[rain.1]
x = 0.0
y = 0.0
series = 0:10.0, 1000:10.0
"#,
        tend = tend,
        dt = dt_seconds,
        interception = interception_m
    )
}

fn run_deck(dir: &Path, deck: &str) -> Model {
    let path = test_helpers::write_deck(dir, deck);
    let mut model = DeckIO::new().read_model_file(&path).unwrap();
    model.configure().unwrap();
    model.run().unwrap();
    model
}

/// Interception storage of 2 mm swallows the first minute of a
/// 10 mm/hr storm completely.
#[test]
fn test_interception_absorbs_first_step() {
    let dir = test_helpers::temp_dir();
    let deck = single_cell_deck(dir.path(), 0.002, 1, 60.0);
    let model = run_deck(dir.path(), &deck);
    let state = model.state.as_ref().unwrap();

    assert_eq!(state.ov.h[0], 0.0);
    assert!((state.ov.interception_remaining[0] - 1.833e-3).abs() < 1e-6);
    //intercepted volume over the full cell: 1.667e-4 m * 100 m2
    assert!((state.ledger.interception_vol[0] - 0.01667).abs() < 1e-5);
}

/// Interception storage of 0.1 mm overflows within the first minute and
/// the overflow ponds on the surface.
#[test]
fn test_interception_overflow_ponds_water() {
    let dir = test_helpers::temp_dir();
    let deck = single_cell_deck(dir.path(), 1.0e-4, 1, 60.0);
    let model = run_deck(dir.path(), &deck);
    let state = model.state.as_ref().unwrap();

    assert!((state.ov.h[0] - 6.667e-5).abs() < 1e-8);
    assert_eq!(state.ov.interception_remaining[0], 0.0);
}

/// A closed basin (no outlets, no losses) retains every drop: rain in
/// equals storage, to round-off.
#[test]
fn test_closed_basin_water_balance() {
    let dir = test_helpers::temp_dir();
    let w = 10.0;
    let nodata = -9999.0;
    //two cells with an elevation step so water moves between them
    test_helpers::write_ascii(dir.path(), "mask.asc", 1, 2, w, nodata, &[1.0, 1.0]);
    test_helpers::write_ascii(dir.path(), "elev.asc", 1, 2, w, nodata, &[1.0, 0.99]);
    test_helpers::write_ascii(dir.path(), "slope.asc", 1, 2, w, nodata, &[0.001, 0.001]);
    test_helpers::write_ascii(dir.path(), "landuse.asc", 1, 2, w, nodata, &[1.0, 1.0]);
    test_helpers::write_ascii(dir.path(), "soil.asc", 1, 2, w, nodata, &[1.0, 1.0]);
    let deck = r#"[freshet]
name = closed

[time]
tstart = 0.0
tend = 0.5
dt = 10:0.5

[grid]
mask = mask.asc
elevation = elev.asc
slope = slope.asc
landuse = landuse.asc
soil = soil.asc

[landuse.1]
name = pasture
manning_n = 0.1
interception = 0.0
depression = 0.0

[soil.1]
name = loam
kh = 0.0

[rain.1]
x = 0.0
y = 0.0
series = 0:10.0, 1000:10.0
"#;
    let model = run_deck(dir.path(), deck);
    let state = model.state.as_ref().unwrap();
    let totals = model.compute_mass_balance(state);

    assert!(totals.net_rain_vol > 0.0);
    assert!(
        totals.water_closure_error.abs() < 1e-9,
        "closure error {}",
        totals.water_closure_error
    );
    //water moved between the cells along the elevation step
    assert!(state.ledger.dqov_out_vol[0].iter().sum::<f64>() > 0.0);
}

/// The strip watershed drains through its outlet; the full water budget
/// closes within the documented tolerance.
#[test]
fn test_strip_watershed_budget_closes() {
    let dir = test_helpers::temp_dir();
    let mut deck = test_helpers::strip_deck_text(dir.path(), 3, 2.0, 10.0);
    //rain onto the strip
    deck = deck.replace("series = 0:0.0, 1000:0.0", "series = 0:10.0, 1000:10.0");
    let model = run_deck(dir.path(), &deck);
    let state = model.state.as_ref().unwrap();
    let totals = model.compute_mass_balance(state);

    assert!(totals.outlet_flow_vol > 0.0, "outlet never flowed");
    assert!(
        totals.water_closure_error.abs() < 1e-3,
        "closure error {}",
        totals.water_closure_error
    );

    //peak depth envelopes were tracked
    assert!(state.ledger.peak_channel_depth > 0.0);
    assert!(state.ledger.max_rain_intensity > 0.0);

    //the serialized totals carry the same numbers as the text report
    let json = model.mass_balance_json().unwrap();
    assert!(json.contains("outlet_flow_vol"));
    assert!(json.contains("water_closure_error"));
}

/// Reports are captured on the configured interval and flushed as CSV.
#[test]
fn test_station_reports_are_written() {
    let dir = test_helpers::temp_dir();
    let out = dir.path().join("water.csv");
    let mut deck = test_helpers::strip_deck_text(dir.path(), 3, 1.0, 10.0);
    deck = deck.replace("series = 0:0.0, 1000:0.0", "series = 0:10.0, 1000:10.0");
    deck.push_str(&format!(
        r#"
[report.1]
name = outlet
row = 1
col = 3
units = gm3

[output]
water_export = {}
report_dt = 0.25
"#,
        out.to_string_lossy()
    ));
    let model = run_deck(dir.path(), &deck);
    crate::io::report_io::write_outputs(&model).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    let header = lines.next().unwrap();
    assert!(header.contains("Qov"));
    assert!(header.contains("Qtotal"));
    //one row per report interval over one simulated hour
    let rows = lines.filter(|l| !l.trim().is_empty()).count();
    assert_eq!(rows, 4);

    let state = model.state.as_ref().unwrap();
    assert_eq!(state.reports.times.len(), 4);
    //the discharge triple sums overland and channel flow
    let (qov, qch, qtot) = state.reports.water.last().unwrap()[0];
    assert!((qov + qch - qtot).abs() < 1e-12);
}
