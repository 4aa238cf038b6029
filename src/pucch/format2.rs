//! PUCCH Format 2/2a/2b (spec §4.4): 20-bit RM-coded CQI, optionally with
//! 1-2 extra ACK/NACK bits carried on the second reference symbol.

use crate::config::pucch::PucchThresholds;
use crate::numeric::cpx::Cpx;
use crate::uci::cqi_code::{pucch_format2_code, LinearBlockCode};

/// QPSK-modulate a (20,) codeword into 10 data symbols.
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

pub fn encode(info_bits: &[u8; 13]) -> Vec<Cpx> {
    let code = pucch_format2_code();
    let codeword = code.encode(info_bits);
    modulate(&codeword)
}

#[derive(Debug, Clone)]
pub struct Format2Decision {
    pub detected: bool,
    pub cqi_bits: Vec<u8>,
    pub score: f32,
}

/// Soft-demodulate the 10 received data symbols into max-log LLRs and
/// decode through the block code. `reference` holds the format's two
/// received reference-symbol samples, used only for the DMRS-
/// correlation pre-check; an empty slice (or a disabled threshold)
/// skips the check.
pub fn decode(received: &[Cpx], reference: &[Cpx], thresholds: &PucchThresholds) -> Format2Decision {
    if thresholds.dmrs_correlation_threshold > 0.0 {
        let ratio = crate::pucch::coherence_ratio(reference);
        if ratio < thresholds.dmrs_correlation_threshold {
            return Format2Decision { detected: false, cqi_bits: Vec::new(), score: ratio };
        }
    }

    let mut llrs = Vec::with_capacity(received.len() * 2);
    for &s in received {
        llrs.push(s.re * std::f32::consts::SQRT_2);
        llrs.push(s.im * std::f32::consts::SQRT_2);
    }
    llrs.truncate(20);
    while llrs.len() < 20 {
        llrs.push(0.0);
    }

    let code: LinearBlockCode = pucch_format2_code();
    let (bits, score) = code.decode_llr(&llrs);
    let normalized = score / (received.len().max(1) as f32);

    Format2Decision {
        detected: normalized >= thresholds.data_validity_threshold,
        cqi_bits: bits,
        score: normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_no_noise() {
        let info = [1u8, 0, 1, 1, 0, 0, 1, 0, 1, 0, 1, 1, 0];
        let tx = encode(&info);
        let rx: Vec<Cpx> = tx.iter().map(|&s| s * 3.0).collect();
        let decision = decode(&rx, &[], &PucchThresholds::default());
        assert_eq!(decision.cqi_bits, info.to_vec());
    }
}
