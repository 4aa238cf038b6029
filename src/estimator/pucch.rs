//! PUCCH channel estimation (spec §4.3).

use crate::config::cell::{CellConfig, CpKind};
use crate::config::pucch::PucchFormat;
use crate::error::{PhyError, PhyResult};
use crate::estimator::pusch::smooth3;
use crate::estimator::result::ChannelEstimate;
use crate::grid::ResourceGrid;
use crate::numeric::cpx::Cpx;

/// DMRS symbol indices within each slot for a given PUCCH format
/// (normal CP), spec §4.3.
pub fn dmrs_symbols(format: PucchFormat) -> [usize; 2] {
    match format {
        PucchFormat::Format1 | PucchFormat::Format1a | PucchFormat::Format1b => [2, 4],
        _ => [1, 5],
    }
}

pub struct PucchEstimate {
    pub channel: ChannelEstimate,
    /// Decoded payload bits from Format 2a/2b's second-reference-symbol
    /// hypothesis enumeration, if applicable.
    pub extra_payload_bits: Option<Vec<u8>>,
}

/// Correlate PUCCH reference symbols against the known cyclic-shift
/// sequence and produce a channel estimate. `rx_ref` holds the received
/// samples at each reference-symbol position (one 12-sample PRB pair
/// slice per symbol, across both slots); `known_ref` is the expected
/// cyclic-shifted sequence.
pub fn estimate_pucch(
    cell: &CellConfig,
    format: PucchFormat,
    rx_ref: &[Vec<Cpx>],
    known_ref: &[Cpx],
    payload_hypotheses: &[Vec<Cpx>],
    dmrs_populated: bool,
) -> PhyResult<PucchEstimate> {
    if !dmrs_populated {
        return Err(PhyError::NotConfigured);
    }
    if cell.cp_kind == CpKind::Extended && matches!(format, PucchFormat::Format2a | PucchFormat::Format2b) {
        return Err(PhyError::InvalidConfig(
            "Format 2a/2b second-reference-symbol payload has no position under extended CP".into(),
        ));
    }

    let mut ls_estimates: Vec<Vec<Cpx>> = Vec::with_capacity(rx_ref.len());
    for rx in rx_ref {
        let n = rx.len().min(known_ref.len());
        ls_estimates.push(
            (0..n)
                .map(|i| rx[i] * known_ref[i].conj() / known_ref[i].norm_sqr().max(1e-20))
                .collect(),
        );
    }

    let n = ls_estimates.iter().map(|v| v.len()).min().unwrap_or(0);
    let mut avg = vec![Cpx::new(0.0, 0.0); n];
    for est in &ls_estimates {
        for i in 0..n {
            avg[i] += est[i];
        }
    }
    for v in avg.iter_mut() {
        *v /= ls_estimates.len().max(1) as f32;
    }
    let smoothed = smooth3(&avg);

    let mut all_rx = Vec::new();
    for rx in rx_ref {
        all_rx.extend_from_slice(rx);
    }
    let epre = crate::numeric::cpx::avg_power(&all_rx);
    let rsrp = crate::numeric::cpx::mean(&all_rx).norm_sqr().min(epre);
    let noise = (epre - rsrp).max(0.0);

    let mut extra_payload_bits = None;
    if !payload_hypotheses.is_empty() {
        let mut best_idx = 0;
        let mut best_corr = f32::NEG_INFINITY;
        for (idx, hyp) in payload_hypotheses.iter().enumerate() {
            let corr = crate::numeric::cpx::dot_prod_conj(&avg[..hyp.len().min(avg.len())], &hyp[..hyp.len().min(avg.len())]).re;
            if corr > best_corr {
                best_corr = corr;
                best_idx = idx;
            }
        }
        let n_bits = if payload_hypotheses.len() == 4 { 2 } else { 1 };
        extra_payload_bits = Some((0..n_bits).map(|b| ((best_idx >> b) & 1) as u8).collect());
    }

    Ok(PucchEstimate {
        channel: ChannelEstimate::from_epre_rsrp(smoothed, epre, rsrp, noise, 0.0, 0.0),
        extra_payload_bits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cell::FrameStructure;

    #[test]
    fn dmrs_symbols_depend_on_format() {
        assert_eq!(dmrs_symbols(PucchFormat::Format1), [2, 4]);
        assert_eq!(dmrs_symbols(PucchFormat::Format2), [1, 5]);
    }

    #[test]
    fn requires_dmrs_population() {
        let cell = CellConfig::new(1, CpKind::Normal, 6, FrameStructure::Fdd).unwrap();
        let res = estimate_pucch(&cell, PucchFormat::Format1, &[], &[], &[], false);
        assert!(res.is_err());
    }
}
