//! PUSCH channel estimation (spec §4.3).

use crate::config::cell::{CellConfig, CpKind};
use crate::error::{PhyError, PhyResult};
use crate::estimator::result::ChannelEstimate;
use crate::grid::ResourceGrid;
use crate::numeric::cpx::Cpx;
use std::f32::consts::PI;

/// Length-3 smoothing filter, equal weights (spec §4.3 default).
pub const SMOOTH_WEIGHT: f32 = 0.3333;

/// DMRS symbol indices within the subframe for PUSCH, per CP kind.
pub fn dmrs_symbol_indices(cp_kind: CpKind) -> [usize; 2] {
    match cp_kind {
        CpKind::Normal => [3, 10],
        CpKind::Extended => [2, 8],
    }
}

fn noise_calibration_constant() -> f32 {
    let w = SMOOTH_WEIGHT;
    (7.419 * w * w + 0.1117 * w - 0.005387) * 0.8
}

/// Estimate the PUSCH channel from the two DMRS symbols of one
/// subframe. `reference` holds the known transmitted reference sequence
/// for each of the two DMRS symbols, each the same length as the
/// allocated subcarrier count.
/// `intra_subframe_hopping` selects frequency hopping of the allocated
/// PRBs between the two slots of the subframe; this estimator has no
/// functional path for tracking two different PRB allocations within
/// one subframe and surfaces `Unsupported` rather than silently
/// estimating against the wrong slot's resource block (spec §9).
pub fn estimate_pusch(
    cell: &CellConfig,
    grid: &ResourceGrid,
    prb_set: &[bool],
    reference: &[Vec<Cpx>; 2],
    dmrs_populated: bool,
    intra_subframe_hopping: bool,
) -> PhyResult<ChannelEstimate> {
    if !dmrs_populated {
        return Err(PhyError::NotConfigured);
    }
    if intra_subframe_hopping {
        return Err(PhyError::Unsupported(
            "intra-subframe frequency hopping is not implemented by the uplink estimator".into(),
        ));
    }

    let sym_idx = dmrs_symbol_indices(cell.cp_kind);
    let mut ls_estimates = [Vec::new(), Vec::new()];
    for (slot, &sym) in sym_idx.iter().enumerate() {
        let rx = grid.extract_prbs(sym, prb_set);
        let n = rx.len().min(reference[slot].len());
        ls_estimates[slot] = (0..n)
            .map(|i| rx[i] * reference[slot][i].conj() / reference[slot][i].norm_sqr().max(1e-20))
            .collect();
    }

    let n = ls_estimates[0].len().min(ls_estimates[1].len());
    let avg_ls: Vec<Cpx> = (0..n).map(|i| (ls_estimates[0][i] + ls_estimates[1][i]) * 0.5).collect();
    let smoothed = smooth3(&avg_ls);

    // Quality metrics in a single pass over the reference symbols.
    let mut all_rx = Vec::new();
    for &sym in &sym_idx {
        all_rx.extend(grid.extract_prbs(sym, prb_set));
    }
    let epre = crate::numeric::cpx::avg_power(&all_rx);
    let rsrp_raw = crate::numeric::cpx::mean(&all_rx).norm_sqr();
    let rsrp = rsrp_raw.min(epre);

    let calib = noise_calibration_constant();
    let mut sq_dev_sum = 0.0f32;
    for i in 0..n {
        sq_dev_sum += (avg_ls[i] - smoothed[i]).norm_sqr();
    }
    let raw_noise = if n > 0 { sq_dev_sum / n as f32 } else { 0.0 };
    let noise = raw_noise / calib;

    // CFO: argument of conjugate product of the two reference slots.
    let slot_a: Cpx = ls_estimates[0].iter().copied().sum();
    let slot_b: Cpx = ls_estimates[1].iter().copied().sum();
    let phase_diff = (slot_b * slot_a.conj()).arg();
    let cfo_hz = phase_diff / (2.0 * PI * 0.5e-3);

    // Timing offset: least-squares linear fit of phase across
    // subcarriers at the reference symbols.
    let timing_offset_us = estimate_timing_offset(&avg_ls, cell.n_subcarriers() as f32);

    // Data-carrying symbols reuse the smoothed DMRS estimate rather than
    // interpolating linearly (spec §4.3).
    let n_sym = cell.symbols_per_subframe();
    let mut coefficients = Vec::with_capacity(n_sym * smoothed.len());
    for _ in 0..n_sym {
        coefficients.extend_from_slice(&smoothed);
    }

    Ok(ChannelEstimate::from_epre_rsrp(
        coefficients,
        epre,
        rsrp,
        noise,
        cfo_hz,
        timing_offset_us,
    ))
}

/// Apply the length-3 equal-weight smoothing filter across subcarriers.
/// Edge samples use a shortened (length-2) window.
pub fn smooth3(x: &[Cpx]) -> Vec<Cpx> {
    let n = x.len();
    let mut out = vec![Cpx::new(0.0, 0.0); n];
    for i in 0..n {
        let lo = i.saturating_sub(1);
        let hi = (i + 1).min(n - 1);
        let window = &x[lo..=hi];
        out[i] = window.iter().copied().sum::<Cpx>() / window.len() as f32;
    }
    out
}

fn estimate_timing_offset(ls: &[Cpx], n_subcarriers: f32) -> f32 {
    if ls.len() < 2 {
        return 0.0;
    }
    let phases: Vec<f32> = ls
        .windows(2)
        .map(|w| (w[1] * w[0].conj()).arg())
        .collect();
    let mean_phase_slope = phases.iter().copied().sum::<f32>() / phases.len() as f32;
    // Convert normalized phase-per-subcarrier slope to microseconds:
    // delay = -slope / (2*pi*subcarrier_spacing), subcarrier_spacing = 15kHz.
    let subcarrier_spacing_hz = 15_000.0;
    let delay_s = -mean_phase_slope / (2.0 * PI * subcarrier_spacing_hz);
    let _ = n_subcarriers;
    (delay_s * 1e6 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cell::FrameStructure;

    fn flat_channel_grid(cell: &CellConfig, prb_set: &[bool], reference: &[Vec<Cpx>; 2]) -> ResourceGrid {
        let mut grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
        let sym_idx = dmrs_symbol_indices(cell.cp_kind);
        for (slot, &sym) in sym_idx.iter().enumerate() {
            let mut sc = 0;
            for (prb_idx, &used) in prb_set.iter().enumerate() {
                if used {
                    for k in 0..12 {
                        grid.set(sym, prb_idx * 12 + k, reference[slot][sc]);
                        sc += 1;
                    }
                }
            }
        }
        grid
    }

    #[test]
    fn noise_free_estimate_recovers_unit_channel() {
        let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
        let mut prb_set = vec![false; 6];
        prb_set[0] = true;
        prb_set[1] = true;
        let reference = [
            (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
            (0..24).map(|i| Cpx::new((i as f32).cos(), (i as f32).sin())).collect(),
        ];
        let grid = flat_channel_grid(&cell, &prb_set, &reference);

        let est = estimate_pusch(&cell, &grid, &prb_set, &reference, true, false).unwrap();
        assert!(est.noise_power > 0.0);
        for c in est.coefficients.iter().take(24) {
            assert!((c.norm() - 1.0).abs() < 1e-3, "{}", c);
        }
    }

    #[test]
    fn fails_without_dmrs_population() {
        let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
        let prb_set = vec![true; 6];
        let reference = [vec![Cpx::new(1.0, 0.0); 72], vec![Cpx::new(1.0, 0.0); 72]];
        let grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
        assert!(estimate_pusch(&cell, &grid, &prb_set, &reference, false, false).is_err());
    }

    #[test]
    fn intra_subframe_hopping_is_unsupported() {
        let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
        let prb_set = vec![true; 6];
        let reference = [vec![Cpx::new(1.0, 0.0); 72], vec![Cpx::new(1.0, 0.0); 72]];
        let grid = ResourceGrid::new(cell.symbols_per_subframe(), cell.n_subcarriers());
        let err = estimate_pusch(&cell, &grid, &prb_set, &reference, true, true).unwrap_err();
        assert_eq!(err, PhyError::Unsupported("intra-subframe frequency hopping is not implemented by the uplink estimator".into()));
    }
}
