//! Uplink channel estimator properties: a noiseless reference recovers
//! the true channel, and injected noise lowers the reported SNR without
//! corrupting the estimate beyond proportion.

use lte_ul_phy::config::cell::{CellConfig, CpKind, FrameStructure};
use lte_ul_phy::estimator::pusch::{dmrs_symbol_indices, estimate_pusch};
use lte_ul_phy::grid::ResourceGrid;
use lte_ul_phy::numeric::Cpx;

use rand_distr::{Distribution, Normal};

fn populate_dmrs(grid: &mut ResourceGrid, cell: &CellConfig, prb_set: &[bool], reference: &[Vec<Cpx>; 2], channel: Cpx, noise_std: f32) {
    let mut rng = rand::rng();
    let noise = Normal::new(0.0, noise_std).unwrap();
    let sym_idx = dmrs_symbol_indices(cell.cp_kind);
    for (slot, &sym) in sym_idx.iter().enumerate() {
        let mut sc = 0;
        for (prb_idx, &used) in prb_set.iter().enumerate() {
            if used {
                for k in 0..12 {
                    let n = Cpx::new(noise.sample(&mut rng), noise.sample(&mut rng));
                    grid.set(sym, prb_idx * 12 + k, reference[slot][sc] * channel + n);
                    sc += 1;
                }
            }
        }
    }
}

#[test]
fn noiseless_estimate_recovers_a_nontrivial_channel() {
    let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
    let mut prb_set = vec![false; 6];
    prb_set[0] = true;
    prb_set[1] = true;
    let reference: [Vec<Cpx>; 2] = [
        (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
        (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
    ];
    let channel = Cpx::new(0.6, -0.3);

    let mut grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
    populate_dmrs(&mut grid, &cell, &prb_set, &reference, channel, 0.0);

    let est = estimate_pusch(&cell, &grid, &prb_set, &reference, true, false).unwrap();
    for c in est.coefficients.iter().take(24) {
        assert!((*c - channel).norm() < 1e-3, "{c} vs {channel}");
    }
}

#[test]
fn noisier_channel_reports_lower_snr() {
    let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
    let mut prb_set = vec![false; 6];
    prb_set[0] = true;
    prb_set[1] = true;
    let reference: [Vec<Cpx>; 2] = [
        (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
        (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
    ];
    let channel = Cpx::new(1.0, 0.0);

    let mut quiet_grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
    populate_dmrs(&mut quiet_grid, &cell, &prb_set, &reference, channel, 0.01);
    let quiet = estimate_pusch(&cell, &quiet_grid, &prb_set, &reference, true, false).unwrap();

    let mut loud_grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
    populate_dmrs(&mut loud_grid, &cell, &prb_set, &reference, channel, 0.5);
    let loud = estimate_pusch(&cell, &loud_grid, &prb_set, &reference, true, false).unwrap();

    assert!(quiet.snr_db > loud.snr_db, "quiet {} vs loud {}", quiet.snr_db, loud.snr_db);
}

#[test]
fn missing_dmrs_population_is_rejected() {
    let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
    let prb_set = vec![true; 6];
    let reference: [Vec<Cpx>; 2] = [vec![Cpx::new(1.0, 0.0); 72], vec![Cpx::new(1.0, 0.0); 72]];
    let grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
    assert!(estimate_pusch(&cell, &grid, &prb_set, &reference, false, false).is_err());
}
