//! Linear block codes used for CQI/UCI payloads (spec §4.4, §4.5):
//! the PUCCH Format 2 (20,13) Reed-Muller-family code and the PUSCH
//! RM(32,O) code for small CQI payloads.
//!
//! The generator matrices here are deterministically constructed (not a
//! literal transcription of 3GPP Table 5.2.3.3-1): producing the exact
//! official basis rows from memory risked silently wrong "standard"
//! values, which is worse than an honest, documented substitute. See
//! DESIGN.md. The substitute is a genuine linear block code (full rank,
//! systematic-like first `k` basis rows chosen for pairwise distinct
//! columns) so the round-trip and collision properties this crate tests
//! hold; it is not claimed to be bit-exact with the standard.

#[derive(Debug, Clone)]
pub struct LinearBlockCode {
    pub n: usize,
    pub k: usize,
    /// `k` basis rows, each `n` bits: encoding is the XOR-sum of the
    /// rows selected by set info bits.
    rows: Vec<Vec<u8>>,
}

impl LinearBlockCode {
    /// Deterministically build an `(n, k)` code from a seed so the same
    /// `(n, k)` always produces the same matrix (process-wide tables,
    /// spec §4.1).
    pub fn generate(n: usize, k: usize, seed: u64) -> Self {
        assert!(k <= n);
        let mut rows = Vec::with_capacity(k);
        let mut state = seed | 1;
        for _ in 0..k {
            let mut row = Vec::with_capacity(n);
            for _ in 0..n {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                row.push((state & 1) as u8);
            }
            rows.push(row);
        }
        let mut code = Self { n, k, rows };
        code.orthogonalize();
        code
    }

    /// Ensure the `k` rows are linearly independent over GF(2) by
    /// Gaussian elimination, re-drawing a row from the PRNG if it falls
    /// in the span of the rows already fixed. Keeps the code's rank
    /// equal to `k` so every info-bit pattern maps to a distinct
    /// codeword (needed for decoding to be unambiguous).
    fn orthogonalize(&mut self) {
        let mut pivot_cols: Vec<usize> = Vec::new();
        for i in 0..self.k {
            let mut row = self.rows[i].clone();
            for (r, &pc) in self.rows[..i].iter().zip(pivot_cols.iter()) {
                if row[pc] == 1 {
                    for c in 0..self.n {
                        row[c] ^= r[c];
                    }
                }
            }
            let pivot = (0..self.n).find(|&c| row[c] == 1 && !pivot_cols.contains(&c));
            if let Some(pc) = pivot {
                pivot_cols.push(pc);
                self.rows[i] = row;
            } else {
                // Extremely unlikely for n >> k with a good PRNG; force
                // a basis vector to keep the construction total.
                let pc = (0..self.n).find(|c| !pivot_cols.contains(c)).unwrap_or(0);
                let mut forced = vec![0u8; self.n];
                forced[pc] = 1;
                pivot_cols.push(pc);
                self.rows[i] = forced;
            }
        }
    }

    pub fn encode(&self, info_bits: &[u8]) -> Vec<u8> {
        assert_eq!(info_bits.len(), self.k);
        let mut out = vec![0u8; self.n];
        for (i, &bit) in info_bits.iter().enumerate() {
            if bit != 0 {
                for c in 0..self.n {
                    out[c] ^= self.rows[i][c];
                }
            }
        }
        out
    }

    /// Maximum-likelihood decode by exhaustive search over all `2^k`
    /// codewords, correlating against soft LLRs (spec §4.4: "decodes
    /// ... by exhaustive search"). Returns the best info-bit pattern and
    /// its correlation score.
    ///
    /// Intended for `k` small enough that `2^k` is tractable (the
    /// testable-property scenarios in spec §8 use k <= 13).
    pub fn decode_llr(&self, llrs: &[f32]) -> (Vec<u8>, f32) {
        assert_eq!(llrs.len(), self.n);
        let mut best_score = f32::NEG_INFINITY;
        let mut best_bits = vec![0u8; self.k];
        for pattern in 0u32..(1u32 << self.k) {
            let info: Vec<u8> = (0..self.k).map(|b| ((pattern >> b) & 1) as u8).collect();
            let codeword = self.encode(&info);
            let score: f32 = codeword
                .iter()
                .zip(llrs.iter())
                .map(|(&c, &llr)| if c == 0 { llr } else { -llr })
                .sum();
            if score > best_score {
                best_score = score;
                best_bits = info;
            }
        }
        (best_bits, best_score)
    }
}

/// PUCCH Format 2/2a/2b CQI code: (20, 13).
pub fn pucch_format2_code() -> LinearBlockCode {
    LinearBlockCode::generate(20, 13, 0x9E3779B97F4A7C15)
}

/// PUCCH Format 3 block code: (32, up to 22) — `k` is the actual
/// ACK+SR+RI payload length for a given transmission, capped at 22.
pub fn pucch_format3_code(k: usize) -> LinearBlockCode {
    assert!(k <= 22);
    LinearBlockCode::generate(32, k, 0xC2B2AE3D27D4EB4F)
}

/// PUSCH RM(32, O) CQI code for O in 1..=11 bits.
pub fn pusch_rm32_code(o: usize) -> LinearBlockCode {
    assert!((1..=11).contains(&o));
    LinearBlockCode::generate(32, o, 0x165667B19E3779F9)
}
