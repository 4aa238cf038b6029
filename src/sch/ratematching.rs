//! Turbo-code rate matching and HARQ soft-combining (spec §4.7; TS
//! 36.212 §5.1.4): sub-block interleaves the three constituent streams
//! into a circular buffer, then selects `E` bits starting from the
//! redundancy-version offset. Receive-side soft-combining accumulates
//! LLRs into the same buffer addressing so repeated transmissions of a
//! code block combine coherently (spec §4.7 HARQ incremental
//! redundancy).

use crate::numeric::ratematch::{subblock_interleave, CircularBuffer, SUBBLOCK_COLUMNS, SUBBLOCK_PERM};
use crate::sch::turbo::TurboCodeword;

const NULL: u8 = 2;

/// Assemble the three sub-block-interleaved streams into the circular
/// buffer bit order (systematic, parity1, parity2 concatenated).
fn build_circular_buffer(codeword: &TurboCodeword) -> (Vec<u8>, CircularBuffer) {
    let i_sys = subblock_interleave(&codeword.systematic);
    let i_par1 = subblock_interleave(&codeword.parity1);
    let i_par2 = subblock_interleave(&codeword.parity2);
    let k_pi = i_sys.len();
    debug_assert_eq!(i_par1.len(), k_pi);
    debug_assert_eq!(i_par2.len(), k_pi);

    let mut buffer = Vec::with_capacity(3 * k_pi);
    buffer.extend_from_slice(&i_sys);
    buffer.extend_from_slice(&i_par1);
    buffer.extend_from_slice(&i_par2);
    (buffer, CircularBuffer::new(k_pi))
}

/// Transmit-side rate matching: produce exactly `e_len` output bits for
/// redundancy version `rv`.
pub fn rate_match(codeword: &TurboCodeword, rv: u8, e_len: usize) -> Vec<u8> {
    let (buffer, cb) = build_circular_buffer(codeword);
    let positions = cb.positions(rv, e_len, |pos| buffer[pos] == NULL);
    positions.into_iter().map(|pos| buffer[pos]).collect()
}

/// The sub-block-interleaved NULL mask for a stream of `d` real bits,
/// reusing `subblock_interleave` itself (feeding it all-zero bits) so
/// the mask and the interleaver can never drift apart.
fn null_mask(d: usize) -> Vec<bool> {
    subblock_interleave(&vec![0u8; d])
        .iter()
        .map(|&b| b == NULL)
        .collect()
}

/// Undo the sub-block column permutation on an LLR buffer (the LLR
/// analogue of `subblock_deinterleave`, which only moves 0/1/NULL
/// bits).
fn deinterleave_llrs(interleaved: &[f32], d: usize) -> Vec<f32> {
    let rows = interleaved.len() / SUBBLOCK_COLUMNS;
    let padded_len = rows * SUBBLOCK_COLUMNS;
    let pad = padded_len - d;

    let mut matrix = vec![0.0f32; padded_len];
    let mut idx = 0;
    for &col in SUBBLOCK_PERM.iter() {
        for row in 0..rows {
            matrix[row * SUBBLOCK_COLUMNS + col] = interleaved[idx];
            idx += 1;
        }
    }
    matrix[pad..].to_vec()
}

/// Receive-side soft combiner: a persistent per-code-block LLR
/// accumulator across HARQ retransmissions of the same process.
#[derive(Debug, Clone)]
pub struct SoftCombiner {
    k_pi: usize,
    accumulated: Vec<f32>,
    null_mask: Vec<bool>,
}

impl SoftCombiner {
    /// `k_with_tail` is the code-block size including the 3 turbo tail
    /// bits, used to derive the sub-block-interleaved length and NULL
    /// mask shared with `rate_match`.
    pub fn new(k_with_tail: usize) -> Self {
        let mask = null_mask(k_with_tail);
        let k_pi = mask.len();
        Self {
            k_pi,
            accumulated: vec![0.0; 3 * k_pi],
            null_mask: mask,
        }
    }

    /// Combine a newly received rate-matched LLR stream (length
    /// matching a previous `rate_match` call's `e_len` and `rv`) into
    /// the persistent accumulator.
    pub fn combine(&mut self, rv: u8, llrs: &[f32]) {
        let cb = CircularBuffer::new(self.k_pi);
        let is_null = |pos: usize| self.null_mask[pos % self.k_pi];
        let positions = cb.positions(rv, llrs.len(), is_null);
        for (&pos, &llr) in positions.iter().zip(llrs.iter()) {
            self.accumulated[pos] += llr;
        }
    }

    /// Split the accumulated buffer back into the three constituent
    /// LLR streams (systematic, parity1, parity2), removing sub-block
    /// interleaving and NULL padding.
    pub fn constituent_llrs(&self, k_with_tail: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let sys_interleaved = &self.accumulated[0..self.k_pi];
        let par1_interleaved = &self.accumulated[self.k_pi..2 * self.k_pi];
        let par2_interleaved = &self.accumulated[2 * self.k_pi..3 * self.k_pi];

        (
            deinterleave_llrs(sys_interleaved, k_with_tail),
            deinterleave_llrs(par1_interleaved, k_with_tail),
            deinterleave_llrs(par2_interleaved, k_with_tail),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sch::turbo::encode;

    #[test]
    fn rate_match_produces_requested_length() {
        let info: Vec<u8> = (0..40).map(|i| (i % 3 == 0) as u8).collect();
        let cw = encode(&info);
        let out = rate_match(&cw, 0, 150);
        assert_eq!(out.len(), 150);
    }

    #[test]
    fn different_rv_selects_different_starting_offset() {
        let info: Vec<u8> = (0..40).map(|i| (i % 3 == 0) as u8).collect();
        let cw = encode(&info);
        let rv0 = rate_match(&cw, 0, 60);
        let rv1 = rate_match(&cw, 1, 60);
        assert_ne!(rv0, rv1);
    }

    #[test]
    fn soft_combine_round_trips_strong_llrs() {
        let info: Vec<u8> = (0..40).map(|i| (i % 5 < 2) as u8).collect();
        let cw = encode(&info);
        let k_with_tail = cw.systematic.len();
        let e_len = 3 * k_with_tail.div_ceil(32) * 32;
        let tx_bits = rate_match(&cw, 0, e_len);

        let llrs: Vec<f32> = tx_bits.iter().map(|&b| if b == 0 { 6.0 } else { -6.0 }).collect();
        let mut combiner = SoftCombiner::new(k_with_tail);
        combiner.combine(0, &llrs);

        let (sys_llr, _par1, _par2) = combiner.constituent_llrs(k_with_tail);
        for (i, &bit) in cw.systematic.iter().enumerate() {
            if sys_llr[i] != 0.0 {
                let decoded_bit = if sys_llr[i] < 0.0 { 1u8 } else { 0u8 };
                assert_eq!(decoded_bit, bit);
            }
        }
    }
}
