use crate::io::deck_io::DeckIO;
use crate::model::RunState;
use crate::solids::advection::supply_scale_water_column;
use crate::tests::test_helpers;
use crate::topology::{Direction, N_SOURCES};

fn strip_model(ncols: usize) -> crate::model::Model {
    let dir = test_helpers::temp_dir();
    let mut deck = test_helpers::strip_deck_text(dir.path(), ncols, 1.0, 1.0);
    deck.push_str(test_helpers::inert_solids_sections());
    let path = test_helpers::write_deck(dir.path(), &deck);
    let mut model = DeckIO::new().read_model_file(&path).unwrap();
    model.configure().unwrap();
    model
}

/// A node holding 1 kg of suspended mass against 1.5 kg of advective and
/// 0.5 kg of deposition potential: both downscale by one half and the
/// column empties exactly.
#[test]
fn test_outfluxes_scale_together() {
    let model = strip_model(2);
    let mut state = RunState::new(&model);
    state.dt = 1.0;

    //channel node 1: rectangular section 2 m wide, depth 0.1 m, length
    //10 m: volume 2 m3; concentration 500 g/m3 holds exactly 1 kg
    state.ch.h[0][0] = 0.1;
    state.sed.cch[1][0][0] = 500.0;

    state.sed.adv_ch_out[1][0][0][Direction::East.code()] = 1500.0; //g/s
    state.sed.dep_ch[1][0][0] = 500.0; //g/s

    supply_scale_water_column(&model, &mut state);

    assert!((state.sed.adv_ch_out[1][0][0][Direction::East.code()] - 750.0).abs() < 1e-9);
    assert!((state.sed.dep_ch[1][0][0] - 250.0).abs() < 1e-9);

    //the reconciled outfluxes drain the column to exactly zero
    let mut outflux = state.sed.dep_ch[1][0][0];
    for k in 0..N_SOURCES {
        outflux += state.sed.adv_ch_out[1][0][0][k];
    }
    let mass_after = 500.0 * 2.0 - outflux * state.dt;
    assert!(mass_after.abs() < 1e-9);
}

#[test]
fn test_no_scaling_when_supply_suffices() {
    let model = strip_model(2);
    let mut state = RunState::new(&model);
    state.dt = 1.0;

    state.ch.h[0][0] = 0.5; //volume 10 m3
    state.sed.cch[1][0][0] = 500.0; //5 kg available

    state.sed.adv_ch_out[1][0][0][Direction::East.code()] = 1500.0;
    state.sed.dep_ch[1][0][0] = 500.0;

    supply_scale_water_column(&model, &mut state);

    assert_eq!(state.sed.adv_ch_out[1][0][0][Direction::East.code()], 1500.0);
    assert_eq!(state.sed.dep_ch[1][0][0], 500.0);
}

#[test]
fn test_empty_column_zeroes_every_outflux() {
    let model = strip_model(2);
    let mut state = RunState::new(&model);
    state.dt = 1.0;

    state.ch.h[0][0] = 0.0;
    state.sed.cch[1][0][0] = 0.0;
    state.sed.adv_ch_out[1][0][0][Direction::East.code()] = 100.0;

    supply_scale_water_column(&model, &mut state);

    assert_eq!(state.sed.adv_ch_out[1][0][0][Direction::East.code()], 0.0);
}

#[test]
fn test_overland_column_scales_like_channel() {
    let model = strip_model(2);
    let mut state = RunState::new(&model);
    state.dt = 1.0;

    //cell 0: overland area is the cell minus the channel surface
    let area = crate::model::overland_surface_area(&model, 0);
    state.ov.h[0] = 0.01;
    state.sed.cov[1][0] = 1000.0 / (0.01 * area); //exactly 1 kg

    state.sed.adv_ov_out[1][0][Direction::East.code()] = 2000.0;

    supply_scale_water_column(&model, &mut state);

    assert!((state.sed.adv_ov_out[1][0][Direction::East.code()] - 1000.0).abs() < 1e-6);
}
