//! Pseudo-random and reference sequence generators (spec §4.1): the
//! length-31 Gold sequence used for scrambling (PBCH/PDSCH/PUCCH/PUSCH)
//! and the Zadoff-Chu sequence used for uplink reference signals.
//!
//! The Gold sequence generator is a linear-feedback shift register
//! `Iterator<Item = u32>`, generalized from a single configurable-width
//! LFSR into the two coupled 31-bit registers the standard's generator
//! specifies (36.211 §7.2).

use num_complex::Complex32;
use std::f32::consts::PI;

const GOLD_SEQ_LEN: usize = 31;
const NC: usize = 1600;

/// 3GPP-standard length-31 Gold sequence generator (36.211 §7.2).
///
/// `x1` is initialized to `[1, 0, 0, ..., 0]` (the standard fixes this);
/// `x2` is initialized from the 31-bit `c_init` seed, which callers
/// derive from cell id / subframe / RNTI per the channel-specific rule
/// in 36.211.
pub struct GoldSequence {
    x1: u32,
    x2: u32,
}

impl GoldSequence {
    pub fn new(c_init: u32) -> Self {
        let mut seq = Self { x1: 1, x2: c_init };
        // Run both registers for Nc = 1600 cycles before output starts.
        for _ in 0..NC {
            seq.step();
        }
        seq
    }

    fn step(&mut self) -> u32 {
        let x1_out = self.x1 & 1;
        let x2_out = self.x2 & 1;
        let new_x1_bit = ((self.x1 >> 3) ^ self.x1) & 1;
        let new_x2_bit = ((self.x2 >> 3) ^ (self.x2 >> 2) ^ (self.x2 >> 1) ^ self.x2) & 1;
        self.x1 = (self.x1 >> 1) | (new_x1_bit << (GOLD_SEQ_LEN - 1));
        self.x2 = (self.x2 >> 1) | (new_x2_bit << (GOLD_SEQ_LEN - 1));
        x1_out ^ x2_out
    }

    /// Produce `n` scrambling bits.
    pub fn generate(&mut self, n: usize) -> Vec<u8> {
        (0..n).map(|_| self.step() as u8).collect()
    }
}

/// Produce `n` QPSK-mapped scrambling symbols directly, per 36.211
/// §7.2's `c(2i), c(2i+1) -> (1-2c(2i))/sqrt2 + j(1-2c(2i+1))/sqrt2`.
pub fn gold_qpsk_symbols(c_init: u32, n_symbols: usize) -> Vec<Complex32> {
    let mut gen = GoldSequence::new(c_init);
    let bits = gen.generate(2 * n_symbols);
    bits.chunks_exact(2)
        .map(|c| {
            let re = (1.0 - 2.0 * c[0] as f32) / std::f32::consts::SQRT_2;
            let im = (1.0 - 2.0 * c[1] as f32) / std::f32::consts::SQRT_2;
            Complex32::new(re, im)
        })
        .collect()
}

/// Generate the base Zadoff-Chu sequence of length `n_zc` and root `q`,
/// `x_q(m) = exp(-j*pi*q*m*(m+1)/n_zc)` for even n_zc is not used in
/// LTE (n_zc is always prime); this uses the full-length definition
/// `exp(-j*pi*q*m*(m+1)/n_zc)`.
pub fn zadoff_chu(n_zc: usize, q: u32) -> Vec<Complex32> {
    (0..n_zc)
        .map(|m| {
            let phase = -PI * q as f32 * (m as f32) * (m as f32 + 1.0) / n_zc as f32;
            Complex32::new(phase.cos(), phase.sin())
        })
        .collect()
}

/// Cyclic-shift a reference sequence by `alpha` radians per subcarrier
/// (the DMRS/PUCCH cyclic-shift operation): `y(n) = x(n) * exp(j alpha n)`.
pub fn cyclic_shift(base: &[Complex32], alpha: f32) -> Vec<Complex32> {
    base.iter()
        .enumerate()
        .map(|(n, &x)| x * Complex32::new((alpha * n as f32).cos(), (alpha * n as f32).sin()))
        .collect()
}

/// Largest prime strictly less than `n`, used to pick the Zadoff-Chu
/// sequence length (`N_zc` is the largest prime less than `M_sc`).
pub fn largest_prime_below(n: usize) -> usize {
    fn is_prime(x: usize) -> bool {
        if x < 2 {
            return false;
        }
        let mut i = 2;
        while i * i <= x {
            if x % i == 0 {
                return false;
            }
            i += 1;
        }
        true
    }
    let mut candidate = n.saturating_sub(1);
    while candidate > 1 && !is_prime(candidate) {
        candidate -= 1;
    }
    candidate
}
