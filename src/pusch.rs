//! PUSCH processor (spec §4.6): extracts data subcarriers, undoes DFT
//! precoding, equalizes with MMSE (zero-forcing fallback when the noise
//! estimate collapses to the floor), and soft-demodulates to max-log
//! LLRs for the SCH codec.

use crate::error::{PhyError, PhyResult};
use crate::estimator::pusch::dmrs_symbol_indices;
use crate::estimator::ChannelEstimate;
use crate::grant::{CqiType, Modulation, UciConfig, UciValue};
use crate::grid::ResourceGrid;
use crate::numeric::cpx::Cpx;
use crate::numeric::fft::FftKernel;
use crate::uci::cqi_code::pusch_rm32_code;
use crate::uci::mux;
use rustfft::FftDirection;

/// Equalize one data symbol's subcarriers against the channel estimate.
/// Uses MMSE when `noise_power` is meaningfully above the floor value,
/// falling back to zero-forcing (MMSE with noise -> 0) otherwise, per
/// spec §4.6.
pub fn equalize(rx: &[Cpx], channel: &[Cpx], noise_power: f32) -> Vec<Cpx> {
    let floor = f32::MIN_POSITIVE * 4.0;
    let use_zf = noise_power <= floor;
    rx.iter()
        .zip(channel.iter())
        .map(|(&r, &h)| {
            if use_zf {
                if h.norm_sqr() > 1e-20 {
                    r / h
                } else {
                    Cpx::new(0.0, 0.0)
                }
            } else {
                let denom = h.norm_sqr() + noise_power;
                r * h.conj() / denom.max(1e-20)
            }
        })
        .collect()
}

/// Undo transform precoding: an `m`-point IDFT restores time-domain
/// modulation symbols from the frequency-domain equalizer output.
pub fn undo_transform_precoding(equalized: &[Cpx]) -> Vec<Cpx> {
    let m = equalized.len();
    if m == 0 {
        return Vec::new();
    }
    let ifft = FftKernel::new(m, FftDirection::Inverse);
    let mut out = vec![Cpx::new(0.0, 0.0); m];
    ifft.transform(equalized, &mut out, true);
    out
}

/// Max-log soft demodulation: for each bit position, the LLR is the
/// difference of the minimum squared distance to a constellation point
/// with that bit 0 versus 1, scaled by channel gain (spec §4.6).
pub fn soft_demodulate(symbols: &[Cpx], modulation: Modulation, effective_gain: f32) -> Vec<f32> {
    let bits = modulation.bits_per_symbol();
    let constellation = constellation_points(modulation);
    let mut llrs = Vec::with_capacity(symbols.len() * bits);
    for &s in symbols {
        for b in 0..bits {
            let mut min0 = f32::INFINITY;
            let mut min1 = f32::INFINITY;
            for (idx, &point) in constellation.iter().enumerate() {
                let dist = (s - point).norm_sqr();
                if (idx >> (bits - 1 - b)) & 1 == 0 {
                    min0 = min0.min(dist);
                } else {
                    min1 = min1.min(dist);
                }
            }
            llrs.push((min1 - min0) * effective_gain.max(1e-6));
        }
    }
    llrs
}

fn constellation_points(modulation: Modulation) -> Vec<Cpx> {
    match modulation {
        Modulation::Qpsk => {
            let s = std::f32::consts::FRAC_1_SQRT_2;
            vec![
                Cpx::new(s, s),
                Cpx::new(s, -s),
                Cpx::new(-s, s),
                Cpx::new(-s, -s),
            ]
        }
        Modulation::Qam16 => gray_qam(4),
        Modulation::Qam64 => gray_qam(8),
        Modulation::Qam256 => gray_qam(16),
    }
}

/// Square Gray-coded QAM constellation of side length `side` (4, 8, 16),
/// normalized to unit average energy.
fn gray_qam(side: usize) -> Vec<Cpx> {
    let levels: Vec<i32> = (0..side).map(|i| 2 * i as i32 - (side as i32 - 1)).collect();
    let norm = {
        let avg: f32 = levels.iter().map(|&l| (l * l) as f32).sum::<f32>() / side as f32;
        (2.0 * avg).sqrt()
    };
    let mut points = Vec::with_capacity(side * side);
    for &i in &levels {
        for &q in &levels {
            points.push(Cpx::new(i as f32, q as f32) / norm);
        }
    }
    points
}

/// Extract the data (non-DMRS) subcarriers for PUSCH's allocated PRBs
/// across all symbols in a slot pair, in transmission order.
pub fn extract_data_symbols(grid: &ResourceGrid, prb_set: &[bool], cp_kind: crate::config::cell::CpKind) -> Vec<Vec<Cpx>> {
    let dmrs = dmrs_symbol_indices(cp_kind);
    (0..grid.n_symbols())
        .filter(|s| !dmrs.contains(s))
        .map(|s| grid.extract_prbs(s, prb_set))
        .collect()
}

#[derive(Debug, Clone)]
pub struct PuschSoftBits {
    pub llrs: Vec<f32>,
}

/// Full PUSCH data-path pipeline for one grant's allocated resource
/// across a subframe: per-symbol equalize, undo precoding, demodulate.
pub fn process(
    grid: &ResourceGrid,
    prb_set: &[bool],
    cp_kind: crate::config::cell::CpKind,
    estimate: &ChannelEstimate,
    modulation: Modulation,
) -> PhyResult<PuschSoftBits> {
    if prb_set.iter().all(|&b| !b) {
        return Err(PhyError::InvalidGrant("PUSCH PRB set is empty".into()));
    }
    let data_symbols = extract_data_symbols(grid, prb_set, cp_kind);
    let channel = &estimate.coefficients;
    let effective_gain = 1.0 / estimate.noise_power.max(f32::MIN_POSITIVE);

    let mut llrs = Vec::new();
    for symbol in &data_symbols {
        let n = symbol.len().min(channel.len());
        let equalized = equalize(&symbol[..n], &channel[..n], estimate.noise_power);
        let time_domain = undo_transform_precoding(&equalized);
        llrs.extend(soft_demodulate(&time_domain, modulation, effective_gain));
    }
    Ok(PuschSoftBits { llrs })
}

/// Number of CQI info bits a grant's UCI configuration carries (spec
/// §4.5). The further RI-dependent CQI payload-size variation 36.212
/// describes for aperiodic reports is not modeled; this crate treats
/// `cqi` as fixed-width per its declared type. See DESIGN.md.
pub fn cqi_bit_count(cqi: Option<CqiType>) -> usize {
    match cqi {
        Some(CqiType::Wideband) => 4,
        Some(CqiType::Subband { n_bits }) => n_bits as usize,
        None => 0,
    }
}

fn combine_repeated(llrs: &[f32], n_info_bits: usize) -> Vec<f32> {
    if n_info_bits == 0 {
        return Vec::new();
    }
    let mut sums = vec![0.0f32; n_info_bits];
    for (i, &v) in llrs.iter().enumerate() {
        sums[i % n_info_bits] += v;
    }
    sums
}

// LLR convention throughout this crate: positive favors bit 0.
fn hard_decide(llr: f32) -> u8 {
    if llr < 0.0 {
        1
    } else {
        0
    }
}

/// Extract UCI fields multiplexed onto PUSCH data (spec §4.5), zeroing
/// the reserved LLR groups out of the returned data stream so the
/// turbo decoder sees no (mis)information at those positions.
///
/// `llrs` must be the flat output of [`process`]'s soft-demodulation
/// loop: DMRS symbols already excluded, ordered symbol-major then
/// subcarrier-minor, `bits_per_symbol` LLRs per position — the same
/// column-major convention [`crate::uci::interleaver`] assumes. Passing
/// an all-false DMRS-exclusion mask to the multiplex plan is therefore
/// correct here (not a simplification): the reference symbols are
/// already gone from this stream, so every reserved position names a
/// genuine data symbol.
pub fn demultiplex_uci(
    llrs: &[f32],
    modulation: Modulation,
    uci: &UciConfig,
    n_symb: usize,
    m_sc: usize,
    k: usize,
) -> (Vec<f32>, UciValue) {
    let bits = modulation.bits_per_symbol();
    let cqi_bits = cqi_bit_count(uci.cqi);
    let dmrs_symbols = vec![false; n_symb];
    let plan = mux::plan(
        &uci.offsets,
        uci.ack_bits as usize,
        uci.ri_bits as usize,
        cqi_bits,
        bits,
        n_symb,
        k,
        m_sc,
        &dmrs_symbols,
    );

    let mut data = llrs.to_vec();
    let mut take_group_llrs = |positions: &[(usize, usize)]| -> Vec<f32> {
        let mut sums = Vec::with_capacity(positions.len());
        for &(row, col) in positions {
            let start = (col * m_sc + row) * bits;
            let end = start + bits;
            if end > data.len() {
                continue;
            }
            sums.push(data[start..end].iter().sum());
            for slot in &mut data[start..end] {
                *slot = 0.0;
            }
        }
        sums
    };

    let ack_llrs = take_group_llrs(&plan.ack_positions);
    let ri_llrs = take_group_llrs(&plan.ri_positions);
    let cqi_llrs = take_group_llrs(&plan.cqi_positions);

    let mut value = UciValue::default();

    if uci.ack_bits > 0 && !ack_llrs.is_empty() {
        value.ack_bits = combine_repeated(&ack_llrs, uci.ack_bits as usize).into_iter().map(hard_decide).collect();
        value.ack_valid = true;
    }

    if uci.ri_bits > 0 && !ri_llrs.is_empty() {
        let combined = combine_repeated(&ri_llrs, uci.ri_bits as usize);
        // RI is carried as a single field value, not independent bits;
        // only the 1-bit case (present/absent rank choice) is decoded
        // today. Multi-bit RI is left unvalidated. See DESIGN.md.
        if uci.ri_bits == 1 {
            value.ri = Some(hard_decide(combined[0]));
            value.ri_valid = true;
        }
    }

    if cqi_bits > 0 && !cqi_llrs.is_empty() {
        if (1..=11).contains(&cqi_bits) {
            let mut padded = cqi_llrs.clone();
            padded.resize(32, 0.0);
            let code = pusch_rm32_code(cqi_bits);
            let (decoded, _score) = code.decode_llr(&padded);
            value.cqi = Some(decoded);
            value.cqi_valid = true;
        } else {
            // CQI payloads above 11 bits use a tail-biting convolutional
            // code (TS 36.212 §5.1.3.1) this crate does not implement;
            // report the field as present but not decoded rather than
            // fabricating bits.
            value.cqi = None;
            value.cqi_valid = false;
        }
    }

    (data, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equalize_unit_channel_is_identity() {
        let rx = vec![Cpx::new(1.0, -1.0), Cpx::new(0.5, 0.5)];
        let channel = vec![Cpx::new(1.0, 0.0); 2];
        let out = equalize(&rx, &channel, 0.0);
        for (a, b) in out.iter().zip(rx.iter()) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn qpsk_llr_sign_matches_bit() {
        let s = std::f32::consts::FRAC_1_SQRT_2;
        let symbols = vec![Cpx::new(s, s)];
        let llrs = soft_demodulate(&symbols, Modulation::Qpsk, 1.0);
        assert_eq!(llrs.len(), 2);
    }

    #[test]
    fn demultiplex_uci_extracts_ack_and_clears_its_data_position() {
        let m_sc = 4;
        let n_symb = 4;
        let llrs: Vec<f32> = vec![3.0; m_sc * n_symb * Modulation::Qpsk.bits_per_symbol()];

        let mut uci = UciConfig::default();
        uci.ack_bits = 1;
        uci.offsets.i_offset_ack = 5;

        let (data, value) = demultiplex_uci(&llrs, Modulation::Qpsk, &uci, n_symb, m_sc, 1000);

        assert!(value.ack_valid);
        assert_eq!(value.ack_bits.len(), 1);
        // The ACK field's reserved position is the first (row 0, col 0)
        // group, zeroed once extracted.
        assert_eq!(data[0], 0.0);
        assert_eq!(data[1], 0.0);
        // Untouched positions keep their original data LLRs.
        assert_eq!(data[2], 3.0);
        assert_eq!(data.len(), llrs.len());
    }

    #[test]
    fn demultiplex_uci_is_a_no_op_with_no_uci_configured() {
        let m_sc = 4;
        let n_symb = 4;
        let llrs: Vec<f32> = (0..m_sc * n_symb * Modulation::Qpsk.bits_per_symbol()).map(|i| i as f32).collect();
        let uci = UciConfig::default();

        let (data, value) = demultiplex_uci(&llrs, Modulation::Qpsk, &uci, n_symb, m_sc, 1000);
        assert_eq!(data, llrs);
        assert!(!value.ack_valid);
        assert!(!value.ri_valid);
        assert!(!value.cqi_valid);
    }

    #[test]
    fn transform_precoding_round_trips_with_identity_channel() {
        let data = vec![Cpx::new(1.0, 0.0), Cpx::new(0.0, 1.0), Cpx::new(-1.0, 0.0), Cpx::new(0.0, -1.0)];
        let ifft = FftKernel::new(4, FftDirection::Inverse);
        let mut precoded = vec![Cpx::new(0.0, 0.0); 4];
        let fft = FftKernel::new(4, FftDirection::Forward);
        fft.transform(&data, &mut precoded, true);
        let _ = ifft;
        let restored = undo_transform_precoding(&precoded);
        for (a, b) in restored.iter().zip(data.iter()) {
            assert!((a - b).norm() < 1e-3);
        }
    }
}
