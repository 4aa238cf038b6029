//! PUCCH Format 1/1a/1b (spec §4.4): presence-only SR detection (1) and
//! 1-2 bit ACK/NACK modulated on the reference sequence (1a/1b).

use crate::config::pucch::{PucchFormat, PucchThresholds};
use crate::numeric::cpx::Cpx;
use std::f32::consts::FRAC_1_SQRT_2;

/// BPSK (Format 1a) / QPSK (Format 1b) payload symbol for a given bit
/// pattern, Gray-mapped per 36.211 Table 5.4.1-1/5.4.2-1 conventions.
pub fn payload_symbol(format: PucchFormat, bits: &[u8]) -> Cpx {
    match format {
        PucchFormat::Format1 => Cpx::new(1.0, 0.0),
        PucchFormat::Format1a => {
            if bits[0] == 0 {
                Cpx::new(1.0, 0.0)
            } else {
                Cpx::new(-1.0, 0.0)
            }
        }
        PucchFormat::Format1b => {
            let (re, im) = match (bits[0], bits[1]) {
                (0, 0) => (1.0, 1.0),
                (0, 1) => (-1.0, 1.0),
                (1, 1) => (-1.0, -1.0),
                (1, 0) => (1.0, -1.0),
                _ => (1.0, 1.0),
            };
            Cpx::new(re * FRAC_1_SQRT_2, im * FRAC_1_SQRT_2)
        }
        _ => panic!("payload_symbol only defined for Format 1/1a/1b"),
    }
}

/// Encode: multiply the cyclic-shifted base sequence by the payload
/// symbol and orthogonal cover code.
pub fn encode(
    format: PucchFormat,
    base_sequence: &[Cpx],
    ack_bits: &[u8],
    cover_code: &[Cpx],
) -> Vec<Cpx> {
    let symbol = payload_symbol(format, ack_bits);
    base_sequence
        .iter()
        .zip(cover_code.iter().cycle())
        .map(|(&s, &w)| s * symbol * w)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Format1Decision {
    pub detected: bool,
    pub ack_bits: Vec<u8>,
    pub correlation: f32,
}

/// Decode: enumerate every hypothesis for the payload bits (0 for
/// Format 1, 1 for 1a, 2 for 1b) and pick the one maximizing real-valued
/// correlation with the received vector.
pub fn decode(
    format: PucchFormat,
    received: &[Cpx],
    base_sequence: &[Cpx],
    cover_code: &[Cpx],
    thresholds: &PucchThresholds,
) -> Format1Decision {
    let n_bits = match format {
        PucchFormat::Format1 => 0,
        PucchFormat::Format1a => 1,
        PucchFormat::Format1b => 2,
        _ => panic!("decode only defined for Format 1/1a/1b"),
    };
    let n_hyp = 1usize << n_bits;

    if thresholds.dmrs_correlation_threshold > 0.0 {
        let aligned: Vec<Cpx> = received
            .iter()
            .zip(base_sequence.iter().zip(cover_code.iter().cycle()))
            .map(|(&r, (&b, &w))| r * (b * w).conj())
            .collect();
        let ratio = crate::pucch::coherence_ratio(&aligned);
        if ratio < thresholds.dmrs_correlation_threshold {
            return Format1Decision { detected: false, ack_bits: Vec::new(), correlation: ratio };
        }
    }

    let mut best_corr = f32::NEG_INFINITY;
    let mut best_bits = Vec::new();
    for h in 0..n_hyp {
        let bits: Vec<u8> = (0..n_bits).map(|b| ((h >> b) & 1) as u8).collect();
        let expected = encode(format, base_sequence, &bits, cover_code);
        let corr: Cpx = received.iter().zip(expected.iter()).map(|(&r, &e)| r * e.conj()).sum();
        let corr_re = corr.re / (received.len().max(1) as f32);
        if corr_re > best_corr {
            best_corr = corr_re;
            best_bits = bits;
        }
    }

    let threshold = match format {
        PucchFormat::Format1 => thresholds.format1_correlation_threshold,
        _ => thresholds.data_validity_threshold,
    };
    let detected = best_corr >= threshold;

    Format1Decision {
        detected,
        ack_bits: best_bits,
        correlation: best_corr,
    }
}
