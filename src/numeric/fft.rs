//! FFT/IFFT facade (spec §4.1): configurable size, direction,
//! normalization and DC policy, built on `rustfft`.
//!
//! Generalized from a fixed 256-point hardcoded planner call into a
//! reusable, cached-plan type so the OFDM front end is not replanning
//! every symbol.

use num_complex::Complex32;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// A forward or inverse FFT of a fixed size, with plan caching.
///
/// FFT requires disjoint input/output buffers; in-place transforms are
/// not exposed here because `rustfft` itself operates in place on a
/// caller-owned scratch buffer, and the two-argument interface below
/// spares callers from learning that precondition.
pub struct FftKernel {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl FftKernel {
    pub fn new(size: usize, direction: FftDirection) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = match direction {
            FftDirection::Forward => planner.plan_fft_forward(size),
            FftDirection::Inverse => planner.plan_fft_inverse(size),
        };
        Self { size, fft }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Transform `src` into `dst`. `dst` is overwritten; `src` is left
    /// untouched. `normalize` divides every output sample by `sqrt(N)`
    /// (unitary convention); callers that want the unnormalized
    /// `rustfft` output (receive-side default, per spec §4.2) pass
    /// `false`.
    ///
    /// # Panics
    /// If `src.len() != self.size()` or `dst.len() != self.size()`.
    pub fn transform(&self, src: &[Complex32], dst: &mut [Complex32], normalize: bool) {
        assert_eq!(src.len(), self.size);
        assert_eq!(dst.len(), self.size);
        dst.copy_from_slice(src);
        self.fft.process(dst);
        if normalize {
            let scale = 1.0 / (self.size as f32).sqrt();
            for v in dst.iter_mut() {
                *v *= scale;
            }
        }
    }

    /// FFT-shift: rotate so that DC (index 0) moves to the array
    /// centre. Used to present the occupied-subcarrier window as a
    /// contiguous band centred on DC, the uplink SC-FDMA convention.
    pub fn fft_shift(buf: &mut [Complex32]) {
        let n = buf.len();
        let half = n / 2;
        buf.rotate_left(half);
    }

    pub fn ifft_shift(buf: &mut [Complex32]) {
        let n = buf.len();
        let half = n - n / 2;
        buf.rotate_left(half);
    }
}
