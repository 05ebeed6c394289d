// Design concepts:
// -----------------
// A forcing time series is an immutable set of (time, value) breakpoints
// owned by the model. The position pointer that tracks "where simtime is"
// lives in a separate SeriesCursor owned by the run state, so the series
// itself stays read-only for the duration of a run and the pointer still
// persists across steps to amortize the search.

use crate::numerical::interpolation::lerp_segment;

/// Piecewise-linear forcing function of simulation time (hours).
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    pub name: String,
    pub times: Vec<f64>,  //breakpoint times (hours), strictly increasing
    pub values: Vec<f64>, //breakpoint values (converted units)
}

/// Persistent position pointer into one TimeSeries. Maintains the
/// invariant times[position - 1] <= simtime < times[position], saturating
/// at the final breakpoint pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesCursor {
    position: usize,
}

impl TimeSeries {
    pub fn new(name: &str) -> TimeSeries {
        TimeSeries {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn from_pairs(name: &str, pairs: &[(f64, f64)]) -> Result<TimeSeries, String> {
        let mut ts = TimeSeries::new(name);
        for &(t, v) in pairs {
            ts.push(t, v);
        }
        ts.validate()?;
        Ok(ts)
    }

    pub fn push(&mut self, time: f64, value: f64) {
        self.times.push(time);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Multiply every value by a conversion/scale factor. Applied once at
    /// load time, never during the run.
    pub fn scale_values(&mut self, factor: f64) {
        for v in self.values.iter_mut() {
            *v *= factor;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err(format!("Time series '{}' has no breakpoints", self.name));
        }
        for i in 1..self.times.len() {
            if self.times[i] <= self.times[i - 1] {
                return Err(format!(
                    "Time series '{}' breakpoint times are not strictly increasing at pair {}",
                    self.name,
                    i + 1
                ));
            }
        }
        Ok(())
    }

    /// Position the cursor for a fresh run starting at simtime.
    pub fn start_cursor(&self, simtime: f64) -> SeriesCursor {
        let mut cursor = SeriesCursor { position: 1 };
        self.advance(&mut cursor, simtime);
        cursor
    }

    /// Advance the cursor so that times[position] >= simtime, saturating
    /// at the final breakpoint pair. Advancing with an unchanged simtime
    /// is a no-op.
    pub fn advance(&self, cursor: &mut SeriesCursor, simtime: f64) {
        if self.len() < 2 {
            cursor.position = self.len().min(1);
            return;
        }
        while cursor.position < self.len() - 1 && simtime > self.times[cursor.position] {
            cursor.position += 1;
        }
    }

    /// Interpolated value at simtime for an already-advanced cursor.
    /// Saturates to the first/last value outside the breakpoint range.
    pub fn interpolate(&self, cursor: &SeriesCursor, simtime: f64) -> f64 {
        let n = self.len();
        if n == 1 {
            return self.values[0];
        }
        if simtime <= self.times[0] {
            return self.values[0];
        }
        if simtime >= self.times[n - 1] {
            return self.values[n - 1];
        }
        let ip = cursor.position.clamp(1, n - 1);
        lerp_segment(
            self.times[ip - 1],
            self.values[ip - 1],
            self.times[ip],
            self.values[ip],
            simtime,
        )
    }

    /// Advance and interpolate in one call.
    pub fn value_at(&self, cursor: &mut SeriesCursor, simtime: f64) -> f64 {
        self.advance(cursor, simtime);
        self.interpolate(cursor, simtime)
    }
}
