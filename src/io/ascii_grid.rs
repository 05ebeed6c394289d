// ESRI ASCII grid reader and writer. Values cross the file boundary in
// single precision: the writer prints the shortest representation of the
// f32 cast and the reader widens f32 back to f64, so a written grid
// re-reads bit-identically.

use std::fs;
use std::path::Path;

use crate::grid::Grid;

#[derive(Debug)]
pub enum GridFileError {
    OpenFileError(String),
    ReadError(String),
    WriteError(String),
}

impl From<GridFileError> for String {
    fn from(error: GridFileError) -> Self {
        match error {
            GridFileError::OpenFileError(f) => format!("Failed to open grid file '{}'", f),
            GridFileError::ReadError(msg) => format!("Grid read error: {}", msg),
            GridFileError::WriteError(msg) => format!("Grid write error: {}", msg),
        }
    }
}

/// One raster as read from disk.
#[derive(Clone, Default, Debug)]
pub struct Raster {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata: f64,
    pub values: Vec<f64>, //row-major, north row first
}

impl Raster {
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.ncols + col]
    }
}

/// Read one ASCII grid file.
pub fn read_grid(filename: &str) -> Result<Raster, String> {
    let content = fs::read_to_string(filename)
        .map_err(|_| String::from(GridFileError::OpenFileError(filename.to_string())))?;
    parse_grid(&content, filename)
}

pub fn parse_grid(content: &str, filename: &str) -> Result<Raster, String> {
    let mut tokens = content.split_whitespace();
    let mut raster = Raster::default();

    //six header records: keyword then value
    for _ in 0..6 {
        let key = tokens
            .next()
            .ok_or_else(|| header_error(filename, "truncated header"))?;
        let value = tokens
            .next()
            .ok_or_else(|| header_error(filename, "header keyword without a value"))?;
        match key.to_ascii_lowercase().as_str() {
            "ncols" => raster.ncols = parse_usize(value, filename, "ncols")?,
            "nrows" => raster.nrows = parse_usize(value, filename, "nrows")?,
            "xllcorner" => raster.xllcorner = parse_f64(value, filename, "xllcorner")?,
            "yllcorner" => raster.yllcorner = parse_f64(value, filename, "yllcorner")?,
            "cellsize" => raster.cellsize = parse_f64(value, filename, "cellsize")?,
            "nodata_value" => raster.nodata = parse_f64(value, filename, "NODATA_value")?,
            other => {
                return Err(header_error(
                    filename,
                    &format!("unexpected header keyword '{}'", other),
                ))
            }
        }
    }
    if raster.ncols == 0 || raster.nrows == 0 {
        return Err(header_error(filename, "grid has zero size"));
    }

    let expected = raster.ncols * raster.nrows;
    raster.values = Vec::with_capacity(expected);
    for token in tokens {
        let v: f32 = token.parse().map_err(|_| {
            String::from(GridFileError::ReadError(format!(
                "'{}': bad numeric value '{}' at cell {}",
                filename,
                token,
                raster.values.len() + 1
            )))
        })?;
        raster.values.push(v as f64);
    }
    if raster.values.len() != expected {
        return Err(String::from(GridFileError::ReadError(format!(
            "'{}': expected {} values, found {}",
            filename,
            expected,
            raster.values.len()
        ))));
    }
    Ok(raster)
}

/// Write one ASCII grid file with the master grid's header.
pub fn write_grid(filename: &str, grid: &Grid, values: &[f64]) -> Result<(), String> {
    let mut out = String::new();
    out.push_str(&format!("ncols         {}\n", grid.ncols));
    out.push_str(&format!("nrows         {}\n", grid.nrows));
    out.push_str(&format!("xllcorner     {}\n", grid.xllcorner));
    out.push_str(&format!("yllcorner     {}\n", grid.yllcorner));
    out.push_str(&format!("cellsize      {}\n", grid.cell_size));
    out.push_str(&format!("NODATA_value  {}\n", grid.nodata));

    for r in 0..grid.nrows {
        let mut line = String::new();
        for c in 0..grid.ncols {
            if c > 0 {
                line.push(' ');
            }
            let v = if grid.is_in_domain(r, c) {
                values[grid.idx(r, c)]
            } else {
                grid.nodata
            };
            line.push_str(&format!("{}", v as f32));
        }
        line.push('\n');
        out.push_str(&line);
    }

    if let Some(parent) = Path::new(filename).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                String::from(GridFileError::WriteError(format!("'{}': {}", filename, e)))
            })?;
        }
    }
    fs::write(filename, out)
        .map_err(|e| String::from(GridFileError::WriteError(format!("'{}': {}", filename, e))))
}

/// Every raster must agree with the master grid header.
pub fn check_header(raster: &Raster, grid: &Grid, filename: &str) -> Result<(), String> {
    if raster.nrows != grid.nrows || raster.ncols != grid.ncols {
        return Err(format!(
            "Grid file '{}' is {} x {} but the master grid is {} x {}",
            filename, raster.nrows, raster.ncols, grid.nrows, grid.ncols
        ));
    }
    if (raster.cellsize - grid.cell_size).abs() > 1.0e-9 * grid.cell_size.max(1.0) {
        return Err(format!(
            "Grid file '{}' cell size {} does not match the master grid cell size {}",
            filename, raster.cellsize, grid.cell_size
        ));
    }
    Ok(())
}

fn header_error(filename: &str, msg: &str) -> String {
    String::from(GridFileError::ReadError(format!("'{}': {}", filename, msg)))
}

fn parse_usize(token: &str, filename: &str, field: &str) -> Result<usize, String> {
    token
        .parse()
        .map_err(|_| header_error(filename, &format!("bad {} value '{}'", field, token)))
}

fn parse_f64(token: &str, filename: &str, field: &str) -> Result<f64, String> {
    token
        .parse()
        .map_err(|_| header_error(filename, &format!("bad {} value '{}'", field, token)))
}
