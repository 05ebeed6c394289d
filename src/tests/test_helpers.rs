// Shared builders for the test suite: small ASCII rasters and decks
// written into a temp directory, plus a few hand-assembled watersheds.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("could not create temp dir")
}

/// Write an ASCII grid file and return its path.
pub fn write_ascii(
    dir: &Path,
    name: &str,
    nrows: usize,
    ncols: usize,
    cellsize: f64,
    nodata: f64,
    values: &[f64],
) -> PathBuf {
    assert_eq!(values.len(), nrows * ncols);
    let mut out = String::new();
    out.push_str(&format!("ncols {}\n", ncols));
    out.push_str(&format!("nrows {}\n", nrows));
    out.push_str("xllcorner 0\n");
    out.push_str("yllcorner 0\n");
    out.push_str(&format!("cellsize {}\n", cellsize));
    out.push_str(&format!("NODATA_value {}\n", nodata));
    for r in 0..nrows {
        let row: Vec<String> = (0..ncols).map(|c| format!("{}", values[r * ncols + c])).collect();
        out.push_str(&row.join(" "));
        out.push('\n');
    }
    let path = dir.join(name);
    fs::write(&path, out).expect("could not write raster");
    path
}

/// A 1 x ncols strip catchment with a channel along the whole row and an
/// outlet at the last column. Rasters are written into `dir`; the deck
/// text is returned so callers can append extra sections before writing.
pub fn strip_deck_text(dir: &Path, ncols: usize, tend_hours: f64, dt_seconds: f64) -> String {
    let w = 10.0;
    let nodata = -9999.0;
    let ones = vec![1.0; ncols];
    let elevation: Vec<f64> = (0..ncols).map(|c| 1.0 - 0.1 * c as f64).collect();
    let slope = vec![0.01; ncols];
    let links = vec![1.0; ncols];
    let nodes: Vec<f64> = (0..ncols).map(|c| (c + 1) as f64).collect();

    write_ascii(dir, "mask.asc", 1, ncols, w, nodata, &ones);
    write_ascii(dir, "elev.asc", 1, ncols, w, nodata, &elevation);
    write_ascii(dir, "slope.asc", 1, ncols, w, nodata, &slope);
    write_ascii(dir, "landuse.asc", 1, ncols, w, nodata, &ones);
    write_ascii(dir, "soil.asc", 1, ncols, w, nodata, &ones);
    write_ascii(dir, "link.asc", 1, ncols, w, nodata, &links);
    write_ascii(dir, "node.asc", 1, ncols, w, nodata, &nodes);

    format!(
        r#"[freshet]
name = strip

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
link = link.asc
node = node.asc

[channels]
bottom_width = 2.0
bank_height = 1.0
side_slope = 0.0
manning_n = 0.03
kh_bed = 0.0
capillary_suction_bed = 0.0
moisture_deficit_bed = 0.0
erosion_coeff = 0.0
bed_porosity = 0.4
bed_thickness = 0.1
gsd = 1.0

[landuse.1]
name = pasture
manning_n = 0.1
interception = 0.0
depression = 0.0

[soil.1]
name = loam
kh = 0.0

[outlet.1]
row = 1
col = {last}
slope = 0.01

[rain.1]
x = 0.0
y = 0.0
series = 0:0.0, 1000:0.0
"#,
        tend = tend_hours,
        dt = dt_seconds,
        last = ncols
    )
}

/// Write deck text (plus any appended sections) to `deck.ini` in `dir`.
pub fn write_deck(dir: &Path, text: &str) -> String {
    let path = dir.join("deck.ini");
    fs::write(&path, text).expect("could not write deck");
    path.to_string_lossy().to_string()
}

/// Options block enabling solids transport with one inert class: no
/// settling, no erosion (critical shear far above anything the strip
/// produces), capacity formulas disabled through zero USLE factors.
pub fn inert_solids_sections() -> &'static str {
    r#"
[options]
solids = true
overland_erosion = shear
channel_erosion = shear
soil_thickness = 0.1
soil_porosity = 0.4
soil_gsd = 1.0

[solids.1]
name = silt
diameter = 2e-5
specific_gravity = 2.65
settling_velocity = 0.0
tce = 1e9
tcd = 0.0
z_age = 0.01
group = 1
"#
}

/// A 3 x 3 watershed with a Y junction: two headwater links draining
/// into a single-node outlet link at the center of the middle row.
pub fn junction_deck_text(dir: &Path, tend_hours: f64, dt_seconds: f64) -> String {
    let w = 10.0;
    let nodata = -9999.0;
    let ones = vec![1.0; 9];
    //water drains from the top corners toward the center outlet
    let elevation = vec![1.2, 1.1, 1.2, 1.0, 0.8, 1.0, 1.1, 0.9, 1.1];
    let slope = vec![0.01; 9];
    let links = vec![1.0, 0.0, 2.0, 1.0, 3.0, 2.0, 0.0, 0.0, 0.0];
    let nodes = vec![1.0, 0.0, 1.0, 2.0, 1.0, 2.0, 0.0, 0.0, 0.0];

    write_ascii(dir, "mask.asc", 3, 3, w, nodata, &ones);
    write_ascii(dir, "elev.asc", 3, 3, w, nodata, &elevation);
    write_ascii(dir, "slope.asc", 3, 3, w, nodata, &slope);
    write_ascii(dir, "landuse.asc", 3, 3, w, nodata, &ones);
    write_ascii(dir, "soil.asc", 3, 3, w, nodata, &ones);
    write_ascii(dir, "link.asc", 3, 3, w, nodata, &links);
    write_ascii(dir, "node.asc", 3, 3, w, nodata, &nodes);

    format!(
        r#"[freshet]
name = junction

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
link = link.asc
node = node.asc

[channels]
bottom_width = 2.0
bank_height = 1.0
side_slope = 0.0
manning_n = 0.03
kh_bed = 0.0
capillary_suction_bed = 0.0
moisture_deficit_bed = 0.0
erosion_coeff = 0.1
erosion_exponent = 1.0
bed_porosity = 0.4
bed_thickness = 0.1
gsd = 1.0

[landuse.1]
name = pasture
manning_n = 0.1
interception = 0.0
depression = 0.0
erosion_coeff = 0.1

[soil.1]
name = loam
kh = 0.0
erosion_exponent = 1.0

[outlet.1]
row = 2
col = 2
slope = 0.01

[rain.1]
x = 0.0
y = 0.0
series = 0:10.0, 1000:10.0
"#,
        tend = tend_hours,
        dt = dt_seconds
    )
}
