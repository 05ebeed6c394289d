extern crate csv;

use crate::forcing::TimeSeries;

#[derive(Debug)]
pub enum CsvError {
    OpenFileError(String),
    ReadError(String),
    WriteError(String),
}

impl From<CsvError> for String {
    fn from(error: CsvError) -> Self {
        match error {
            CsvError::OpenFileError(f) => format!("Failed to open file '{}'", f),
            CsvError::ReadError(msg) => format!("Read error: {}", msg),
            CsvError::WriteError(msg) => format!("Write error: {}", msg),
        }
    }
}

/// Read forcing time series from a CSV file: a time column in hours
/// followed by one named data column per series.
pub fn read_series(filename: &str) -> Result<Vec<TimeSeries>, CsvError> {
    let mut answer: Vec<TimeSeries> = Vec::new();

    let mut reader = match csv::Reader::from_path(filename) {
        Ok(r) => r,
        Err(_) => {
            return Err(CsvError::OpenFileError(filename.to_string()));
        }
    };

    let mut file_line = 1;
    let n_data_cols;
    match reader.headers() {
        Ok(headers) => {
            n_data_cols = headers.len().saturating_sub(1);
            for i in 1..headers.len() {
                answer.push(TimeSeries::new(headers.get(i).unwrap_or("")));
            }
        }
        Err(_) => {
            return Err(CsvError::ReadError(format!(
                "Error reading '{filename}' line {file_line}."
            )));
        }
    }

    for result in reader.records() {
        file_line += 1;

        let record = match result {
            Ok(r) => r,
            Err(_) => {
                return Err(CsvError::ReadError(format!(
                    "Error reading '{filename}' line {file_line}."
                )));
            }
        };

        let t: f64 = match record.get(0).unwrap_or("").trim().parse() {
            Ok(v) => v,
            Err(_) => {
                return Err(CsvError::ReadError(format!(
                    "Error reading '{filename}' line {file_line} time column."
                )));
            }
        };

        for i in 0..n_data_cols {
            let v: f64 = match record.get(i + 1).unwrap_or("").trim().parse() {
                Ok(v) => v,
                Err(_) => {
                    let one_based_data_column = i + 1;
                    return Err(CsvError::ReadError(format!(
                        "Error reading '{filename}' line {file_line} data column {one_based_data_column}."
                    )));
                }
            };
            answer[i].push(t, v);
        }
    }

    for ts in &answer {
        if let Err(msg) = ts.validate() {
            return Err(CsvError::ReadError(format!("'{filename}': {msg}")));
        }
    }

    Ok(answer)
}

/// Pick one named column out of a forcing CSV file.
pub fn read_series_column(filename: &str, column: &str) -> Result<TimeSeries, CsvError> {
    let all = read_series(filename)?;
    all.into_iter().find(|ts| ts.name == column).ok_or_else(|| {
        CsvError::ReadError(format!("'{filename}' has no column named '{column}'."))
    })
}
