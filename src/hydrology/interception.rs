// Interception debit. Each cell carries a remaining interception depth
// (from its land use class) that must be satisfied before precipitation
// reaches the surface. Rain is debited first, then snowfall SWE against
// the same remaining storage.

use crate::model::{Model, RunState, SnowOption};

/// Debit one gross rate (m/s) against the remaining interception depth
/// (m). Returns the net rate; the debited depth is subtracted from
/// `remaining` and returned in `debit`.
pub fn debit(gross_rate: f64, dt: f64, remaining: &mut f64, debit: &mut f64) -> f64 {
    if *remaining <= 0.0 {
        return gross_rate;
    }
    if gross_rate * dt >= *remaining {
        //interception storage fills this step; the remainder falls through
        let net = gross_rate - *remaining / dt;
        *debit += *remaining;
        *remaining = 0.0;
        net
    } else {
        //everything is intercepted
        *debit += gross_rate * dt;
        *remaining -= gross_rate * dt;
        0.0
    }
}

/// Phase 3: compute net rain and net SWE rates for every cell.
pub fn interception_phase(model: &Model, state: &mut RunState) {
    let dt = state.dt;
    let snow_active = matches!(
        model.options.snow,
        SnowOption::RainPartition | SnowOption::Gages
    );

    for (r, c) in model.grid.domain_cells() {
        let i = model.grid.idx(r, c);
        state.ov.interception_debit[i] = 0.0;

        let remaining = &mut state.ov.interception_remaining[i];
        state.ov.net_rain[i] = debit(
            state.ov.gross_rain[i],
            dt,
            remaining,
            &mut state.ov.interception_debit[i],
        );

        if snow_active {
            state.ov.net_swe[i] = debit(
                state.ov.gross_swe[i],
                dt,
                remaining,
                &mut state.ov.interception_debit[i],
            );
        } else {
            state.ov.net_swe[i] = 0.0;
        }
    }
}
