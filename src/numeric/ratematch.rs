//! Rate-matching lookup tables (spec §4.1, §4.7; TS 36.212 §5.1.4.1).
//!
//! Pre-computed once, process-wide, read-only: the sub-block
//! interleaver column permutation and the per-redundancy-version
//! circular-buffer starting offsets. Both the transmit rate matcher and
//! the receive soft-combiner index through the same tables so the two
//! are bit-for-bit consistent by construction (the "rate-matching round
//! trip" testable property in spec §8).

/// Column permutation pattern for the 32-column sub-block interleaver
/// (TS 36.212 §5.1.4.1.1, Table 5.1.4-1 inter-column permutation for
/// turbo-coded streams; C_subblock = 32).
pub const SUBBLOCK_COLUMNS: usize = 32;
pub const SUBBLOCK_PERM: [usize; 32] = [
    0, 16, 8, 24, 4, 20, 12, 28, 2, 18, 10, 26, 6, 22, 14, 30, 1, 17, 9, 25, 5, 21, 13, 29, 3, 19,
    11, 27, 7, 23, 15, 31,
];

/// Redundancy-version coefficients for the circular-buffer starting
/// offset, in units of `R_subblock` rows (spec §4.7: k0(rv) ∈ {2, 18,
/// 34, 50} subblocks).
pub const RV_OFFSET_COEFF: [usize; 4] = [2, 18, 34, 50];

/// Sub-block-interleave one constituent stream of length `d` bits.
/// Returns the interleaved stream, left-padded with `NULL` placeholder
/// bits (value `2`, distinguishable from a real 0/1 bit) so its length
/// is a multiple of 32, mirroring the standard's dummy-bit padding.
pub fn subblock_interleave(stream: &[u8]) -> Vec<u8> {
    let d = stream.len();
    let rows = d.div_ceil(SUBBLOCK_COLUMNS);
    let padded_len = rows * SUBBLOCK_COLUMNS;
    let pad = padded_len - d;

    // Write row-major into a (rows x 32) matrix, NULL-padding the front.
    let mut matrix = vec![2u8; padded_len];
    matrix[pad..].copy_from_slice(stream);

    // Read out column-first, with columns visited in SUBBLOCK_PERM order.
    let mut out = Vec::with_capacity(padded_len);
    for &col in SUBBLOCK_PERM.iter() {
        for row in 0..rows {
            out.push(matrix[row * SUBBLOCK_COLUMNS + col]);
        }
    }
    out
}

/// Invert `subblock_interleave`: given an interleaved stream (with NULL
/// markers preserved) of `rows*32` bits, recover the original `d`-bit
/// stream order (NULLs removed from the front).
pub fn subblock_deinterleave(interleaved: &[u8], d: usize) -> Vec<u8> {
    let rows = interleaved.len() / SUBBLOCK_COLUMNS;
    let padded_len = rows * SUBBLOCK_COLUMNS;
    let pad = padded_len - d;

    let mut matrix = vec![2u8; padded_len];
    let mut idx = 0;
    for &col in SUBBLOCK_PERM.iter() {
        for row in 0..rows {
            matrix[row * SUBBLOCK_COLUMNS + col] = interleaved[idx];
            idx += 1;
        }
    }
    matrix[pad..].to_vec()
}

/// A read-only view over the three interleaved sub-blocks assembled
/// into the circular buffer addressing scheme, used identically by
/// rate matching (tx) and soft combining (rx).
pub struct CircularBuffer {
    pub k_pi: usize, // length of each of the three interleaved sub-blocks (rows*32)
}

impl CircularBuffer {
    pub fn new(k_pi: usize) -> Self {
        Self { k_pi }
    }

    pub fn n_cb(&self) -> usize {
        3 * self.k_pi
    }

    pub fn r_subblock(&self) -> usize {
        self.k_pi / SUBBLOCK_COLUMNS
    }

    pub fn k0(&self, rv: u8) -> usize {
        self.r_subblock() * RV_OFFSET_COEFF[rv as usize & 3]
    }

    /// Map a sequential position `e` (0..E) in the rate-matched output
    /// to a circular-buffer bit index for redundancy version `rv`,
    /// skipping NULL (padding) positions as the standard requires.
    /// `circular_buffer_is_null` tells whether a given buffer index
    /// holds a NULL placeholder.
    pub fn positions(&self, rv: u8, e_len: usize, is_null: impl Fn(usize) -> bool) -> Vec<usize> {
        let mut out = Vec::with_capacity(e_len);
        let n_cb = self.n_cb();
        let mut k = self.k0(rv);
        let mut produced = 0;
        let mut guard = 0;
        while produced < e_len && guard < n_cb * 4 + e_len * 2 {
            let pos = k % n_cb;
            if !is_null(pos) {
                out.push(pos);
                produced += 1;
            }
            k += 1;
            guard += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subblock_round_trip() {
        let d = 40;
        let stream: Vec<u8> = (0..d as u8).map(|i| i % 2).collect();
        let interleaved = subblock_interleave(&stream);
        let back = subblock_deinterleave(&interleaved, d);
        assert_eq!(back, stream);
    }

    #[test]
    fn subblock_perm_is_a_permutation() {
        let mut sorted = SUBBLOCK_PERM.to_vec();
        sorted.sort();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn k0_matches_spec_coefficients() {
        let cb = CircularBuffer::new(320); // r_subblock = 10
        assert_eq!(cb.k0(0), 20);
        assert_eq!(cb.k0(1), 180);
        assert_eq!(cb.k0(2), 340);
        assert_eq!(cb.k0(3), 500);
    }

    #[test]
    fn positions_skip_null_entries() {
        let cb = CircularBuffer::new(32);
        let is_null = |pos: usize| pos == 5 || pos == 6;
        let pos = cb.positions(0, 10, is_null);
        assert_eq!(pos.len(), 10);
        assert!(!pos.contains(&5));
        assert!(!pos.contains(&6));
    }
}
