//! PUCCH Format 3 (spec §4.4): DFT-S-OFDM block-spread multi-bit
//! ACK/NACK(+SR) carried on a (32, k) block code, k <= 22.

use crate::config::pucch::PucchThresholds;
use crate::numeric::cpx::Cpx;
use crate::uci::cqi_code::pucch_format3_code;

pub fn modulate(codeword: &[u8]) -> Vec<Cpx> {
    codeword
        .chunks(2)
        .map(|pair| {
            let (b0, b1) = (pair[0], *pair.get(1).unwrap_or(&0));
            let re = if b0 == 0 { 1.0 } else { -1.0 };
            let im = if b1 == 0 { 1.0 } else { -1.0 };
            Cpx::new(re, im) * std::f32::consts::FRAC_1_SQRT_2
        })
        .collect()
}

pub fn encode(info_bits: &[u8]) -> Vec<Cpx> {
    let code = pucch_format3_code(info_bits.len());
    let codeword = code.encode(info_bits);
    modulate(&codeword)
}

#[derive(Debug, Clone)]
pub struct Format3Decision {
    pub detected: bool,
    pub bits: Vec<u8>,
    pub score: f32,
}

/// Decode `received` (16 QPSK data symbols) against a (32, k) code. The
/// caller supplies `k` from the grant's UCI configuration; spec §9
/// leaves the detection threshold for this format an open question with
/// no safe default, so callers must supply one explicitly rather than
/// rely on `PucchThresholds::default`. `reference` holds the format's
/// received reference-symbol samples, used only for the DMRS-
/// correlation pre-check; an empty slice (or a disabled threshold)
/// skips the check.
pub fn decode(received: &[Cpx], reference: &[Cpx], k: usize, thresholds: &PucchThresholds) -> Format3Decision {
    if thresholds.dmrs_correlation_threshold > 0.0 {
        let ratio = crate::pucch::coherence_ratio(reference);
        if ratio < thresholds.dmrs_correlation_threshold {
            return Format3Decision { detected: false, bits: Vec::new(), score: ratio };
        }
    }

    let mut llrs = Vec::with_capacity(received.len() * 2);
    for &s in received {
        llrs.push(s.re * std::f32::consts::SQRT_2);
        llrs.push(s.im * std::f32::consts::SQRT_2);
    }
    llrs.truncate(32);
    while llrs.len() < 32 {
        llrs.push(0.0);
    }

    let code = pucch_format3_code(k);
    let (bits, score) = code.decode_llr(&llrs);
    let normalized = score / (received.len().max(1) as f32);

    Format3Decision {
        detected: normalized >= thresholds.data_validity_threshold,
        bits,
        score: normalized,
    }
}
