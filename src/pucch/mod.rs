//! PUCCH processor (spec §4.4): format-specific encode/decode plus
//! resource collision detection.

pub mod collision;
pub mod format1;
pub mod format2;
pub mod format3;

use crate::numeric::cpx::Cpx;

pub use collision::{detect_collisions, PucchCollision};
pub use format1::{decode as decode_format1, encode as encode_format1, Format1Decision};
pub use format2::{decode as decode_format2, encode as encode_format2, Format2Decision};
pub use format3::{decode as decode_format3, encode as encode_format3, Format3Decision};

/// Ratio of coherent to non-coherent power across `aligned`, samples
/// already phase-aligned against a known reference (e.g. `received[i] *
/// conj(reference[i])`). Genuine reference signal sums coherently
/// across symbols; noise does not, so the ratio collapses towards zero
/// with no transmission present. Backs the DMRS-correlation detection
/// pre-check (spec §4.4): "ratio of coherent to non-coherent reference
/// power ... a ratio below threshold causes immediate `detected=false`
/// with no further decoding."
pub fn coherence_ratio(aligned: &[Cpx]) -> f32 {
    let n = aligned.len();
    if n == 0 {
        return 0.0;
    }
    let coherent = aligned.iter().sum::<Cpx>().norm_sqr() / (n * n) as f32;
    let total: f32 = aligned.iter().map(|c| c.norm_sqr()).sum::<f32>() / n as f32;
    let noncoherent = (total - coherent).max(1e-12);
    coherent / noncoherent
}
